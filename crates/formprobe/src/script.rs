//! In-page resolver script.
//!
//! Both real drivers evaluate the same bundle, so selector semantics do not
//! depend on the protocol. The bundle lives in `scripts/resolve.js` and is
//! embedded at compile time; selectors and actions are spliced in as JSON.

use crate::driver::{Action, ElementState};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use serde::Deserialize;

/// Embedded contents of `scripts/resolve.js`
pub const RESOLVE_SCRIPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/scripts/resolve.js"
));

const SELECTOR_SLOT: &str = "__FORMPROBE_SELECTOR__";
const ACTION_SLOT: &str = "__FORMPROBE_ACTION__";

/// What the bundle returns
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptOutcome {
    /// Whether resolution (and the action, if any) succeeded
    pub ok: bool,
    /// Failure description
    #[serde(default)]
    pub error: Option<String>,
    /// Element snapshots (queries only)
    #[serde(default)]
    pub elements: Vec<ElementState>,
}

/// Expression that resolves `selector` and returns element snapshots
pub fn query_expression(selector: &Selector) -> ProbeResult<String> {
    build(selector, None)
}

/// Expression that resolves `selector` strictly and performs `action`
pub fn action_expression(selector: &Selector, action: &Action) -> ProbeResult<String> {
    build(selector, Some(action))
}

fn build(selector: &Selector, action: Option<&Action>) -> ProbeResult<String> {
    let selector_json = serde_json::to_string(selector)?;
    let action_json = match action {
        Some(action) => serde_json::to_string(action)?,
        None => "null".to_string(),
    };
    Ok(RESOLVE_SCRIPT
        .replacen(SELECTOR_SLOT, &selector_json, 1)
        .replacen(ACTION_SLOT, &action_json, 1))
}

/// Decode the value a driver got back from evaluating the bundle
pub fn decode(value: serde_json::Value) -> ProbeResult<ScriptOutcome> {
    if value.is_null() {
        return Err(ProbeError::script("resolver returned no value"));
    }
    let outcome: ScriptOutcome = serde_json::from_value(value)?;
    Ok(outcome)
}

/// Decode a query result into element snapshots
pub fn decode_query(value: serde_json::Value) -> ProbeResult<Vec<ElementState>> {
    let outcome = decode(value)?;
    if outcome.ok {
        Ok(outcome.elements)
    } else {
        Err(ProbeError::script(
            outcome.error.unwrap_or_else(|| "query failed".to_string()),
        ))
    }
}

/// Decode an action result
pub fn decode_action(selector: &Selector, value: serde_json::Value) -> ProbeResult<()> {
    let outcome = decode(value)?;
    if outcome.ok {
        Ok(())
    } else {
        Err(ProbeError::driver(format!(
            "{selector}: {}",
            outcome.error.unwrap_or_else(|| "action failed".to_string())
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Role;

    #[test]
    fn test_embedded_script_has_slots() {
        assert!(RESOLVE_SCRIPT.contains(SELECTOR_SLOT));
        assert!(RESOLVE_SCRIPT.contains(ACTION_SLOT));
    }

    #[test]
    fn test_query_expression_splices_json() {
        let sel = Selector::placeholder_exact("Hasło");
        let script = query_expression(&sel).unwrap();
        assert!(!script.contains(SELECTOR_SLOT));
        assert!(script.contains(r#"{"kind":"placeholder","text":"Hasło","exact":true}"#));
        assert!(script.contains("const ACTION = null;"));
    }

    #[test]
    fn test_action_expression_quotes_hostile_text() {
        let sel = Selector::role_named(Role::Button, "Zarejestruj");
        let action = Action::Fill {
            value: "a\"b'c</script>\n".to_string(),
        };
        let script = action_expression(&sel, &action).unwrap();
        assert!(script.contains(r#""value":"a\"b'c</script>\n""#));
    }

    #[test]
    fn test_decode_query() {
        let value = serde_json::json!({
            "ok": true,
            "error": null,
            "elements": [{
                "tag": "h1", "text": "Rejestracja", "visible": true, "enabled": true,
                "editable": false, "checked": null, "value": "", "options": []
            }]
        });
        let elements = decode_query(value).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Rejestracja");
    }

    #[test]
    fn test_decode_action_failure_names_selector() {
        let sel = Selector::css("select");
        let value = serde_json::json!({
            "ok": false,
            "error": "no option with value \"xx\"",
            "elements": [],
        });
        let err = decode_action(&sel, value).unwrap_err();
        assert!(err.to_string().contains("css=select"));
        assert!(err.to_string().contains("xx"));
    }

    #[test]
    fn test_decode_null_is_script_error() {
        let err = decode(serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, ProbeError::ScriptError { .. }));
    }
}
