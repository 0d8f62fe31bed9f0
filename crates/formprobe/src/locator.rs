//! Locator Abstraction
//!
//! A [`Selector`] describes how to find elements. A [`Locator`] binds a
//! selector to a browsing context and is re-resolved on every use; it never
//! holds an element handle.
//!
//! Actions are strict: before mutating anything, a locator waits until it
//! resolves to exactly one element in the required state.

use crate::driver::{Action, Driver, ElementState};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, Probe, WaitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// SELECTOR
// =============================================================================

/// Accessible roles the locators understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// `button`, `input[type=submit|button|reset]`, `[role=button]`
    Button,
    /// `h1`..`h6`, `[role=heading]`
    Heading,
}

impl Role {
    /// ARIA role name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Heading => "heading",
        }
    }

    /// CSS matching the elements that carry this role implicitly or explicitly
    #[must_use]
    pub const fn css(&self) -> &'static str {
        match self {
            Self::Button => {
                "button, input[type=submit], input[type=button], input[type=reset], [role=button]"
            }
            Self::Heading => "h1, h2, h3, h4, h5, h6, [role=heading]",
        }
    }
}

/// Element-finding strategy.
///
/// Serialised as tagged JSON and interpreted in the page by the resolver
/// script, so every driver resolves selectors the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Plain CSS selector
    Css {
        /// CSS selector text
        selector: String,
    },
    /// Form control by placeholder text
    Placeholder {
        /// Placeholder text
        text: String,
        /// Normalised equality instead of case-insensitive containment
        exact: bool,
    },
    /// Element by accessible role and (optionally) accessible name
    Role {
        /// Role
        role: Role,
        /// Case-insensitive name fragment
        name: Option<String>,
    },
    /// Matches of `base` whose normalised text contains `text`
    HasText {
        /// Base selector
        base: Box<Selector>,
        /// Required text fragment
        text: String,
    },
    /// CSS descendants of any `base` match, de-duplicated, in document order
    Descendant {
        /// Base selector
        base: Box<Selector>,
        /// CSS selector applied inside each base match
        css: String,
    },
}

impl Selector {
    /// CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Placeholder containment (case-insensitive)
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder {
            text: text.into(),
            exact: false,
        }
    }

    /// Placeholder equality (whitespace-normalised)
    #[must_use]
    pub fn placeholder_exact(text: impl Into<String>) -> Self {
        Self::Placeholder {
            text: text.into(),
            exact: true,
        }
    }

    /// Role without a name constraint
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self::Role { role, name: None }
    }

    /// Role with an accessible-name fragment
    #[must_use]
    pub fn role_named(role: Role, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: Some(name.into()),
        }
    }

    /// Narrow to matches containing `text`
    #[must_use]
    pub fn has_text(self, text: impl Into<String>) -> Self {
        Self::HasText {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Descend into matches with a CSS selector
    #[must_use]
    pub fn descendant(self, css: impl Into<String>) -> Self {
        Self::Descendant {
            base: Box::new(self),
            css: css.into(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={selector}"),
            Self::Placeholder { text, exact } => {
                if *exact {
                    write!(f, "placeholder=\"{text}\"s")
                } else {
                    write!(f, "placeholder=\"{text}\"i")
                }
            }
            Self::Role { role, name: None } => write!(f, "role={}", role.as_str()),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={}[name=\"{name}\"i]", role.as_str()),
            Self::HasText { base, text } => write!(f, "{base} >> has-text=\"{text}\""),
            Self::Descendant { base, css } => write!(f, "{base} >> css={css}"),
        }
    }
}

// =============================================================================
// READINESS
// =============================================================================

/// State an element must reach before an action runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Attached and visible
    Visible,
    /// Visible and editable (fill)
    Editable,
    /// Visible and enabled (click)
    Clickable,
    /// Visible, enabled and offering the option value (select)
    Selectable(String),
}

impl Readiness {
    /// Whether a single element satisfies this state
    #[must_use]
    pub fn is_met(&self, el: &ElementState) -> bool {
        match self {
            Self::Visible => el.visible,
            Self::Editable => el.visible && el.editable,
            Self::Clickable => el.visible && el.enabled,
            Self::Selectable(value) => {
                el.visible && el.enabled && el.options.iter().any(|o| o == value)
            }
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Editable => write!(f, "visible and editable"),
            Self::Clickable => write!(f, "visible and enabled"),
            Self::Selectable(value) => write!(f, "selectable with option \"{value}\""),
        }
    }
}

/// Describe a resolution result for diagnostics
#[must_use]
pub fn describe_matches(matches: &[ElementState]) -> String {
    match matches {
        [] => "no element matched".to_string(),
        [one] => one.summary(),
        many => format!("{} elements matched (strict mode requires one)", many.len()),
    }
}

// =============================================================================
// LOCATOR
// =============================================================================

/// Selector bound to a browsing context
#[derive(Clone)]
pub struct Locator {
    driver: Arc<dyn Driver>,
    selector: Selector,
    wait: WaitOptions,
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("selector", &self.selector.to_string())
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl Locator {
    /// Bind a selector to a driver
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, selector: Selector, wait: WaitOptions) -> Self {
        Self {
            driver,
            selector,
            wait,
        }
    }

    /// The underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Wait options used by actions on this locator
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// The driver this locator resolves against
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Override the timeout for this locator
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait.timeout_ms = timeout_ms;
        self
    }

    /// Narrow to matches containing `text`
    #[must_use]
    pub fn filter_has_text(&self, text: impl Into<String>) -> Self {
        Self::new(
            Arc::clone(&self.driver),
            self.selector.clone().has_text(text),
            self.wait,
        )
    }

    /// CSS descendants of this locator's matches
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        Self::new(
            Arc::clone(&self.driver),
            self.selector.clone().descendant(css),
            self.wait,
        )
    }

    /// Resolve once, without waiting
    pub async fn all(&self) -> ProbeResult<Vec<ElementState>> {
        self.driver.query(&self.selector).await
    }

    /// Number of current matches, without waiting
    pub async fn count(&self) -> ProbeResult<usize> {
        Ok(self.all().await?.len())
    }

    /// Wait until exactly one element matches and satisfies `readiness`
    pub async fn wait_for(&self, readiness: Readiness) -> ProbeResult<ElementState> {
        let driver = &self.driver;
        let selector = &self.selector;
        let check = &readiness;
        let outcome = poll_until(&self.wait, || async move {
            match driver.query(selector).await {
                Ok(matches) => match matches.as_slice() {
                    [one] if check.is_met(one) => Probe::Ready(one.clone()),
                    other => Probe::Pending(describe_matches(other)),
                },
                Err(e) => Probe::Pending(format!("query failed: {e}")),
            }
        })
        .await;

        outcome.map_err(|timeout| ProbeError::ElementNotReady {
            locator: self.selector.to_string(),
            condition: readiness.to_string(),
            timeout_ms: self.wait.timeout_ms,
            observed: timeout
                .last
                .unwrap_or_else(|| "nothing observed".to_string()),
        })
    }

    /// Fill an input after it becomes editable
    pub async fn fill(&self, value: &str) -> ProbeResult<()> {
        self.wait_for(Readiness::Editable).await?;
        debug!(locator = %self.selector, "fill");
        self.driver
            .perform(
                &self.selector,
                &Action::Fill {
                    value: value.to_string(),
                },
            )
            .await
    }

    /// Click after the element becomes visible and enabled
    pub async fn click(&self) -> ProbeResult<()> {
        self.wait_for(Readiness::Clickable).await?;
        debug!(locator = %self.selector, "click");
        self.driver.perform(&self.selector, &Action::Click).await
    }

    /// Choose a `select` option by value once it is offered
    pub async fn select_option(&self, value: &str) -> ProbeResult<()> {
        self.wait_for(Readiness::Selectable(value.to_string()))
            .await?;
        debug!(locator = %self.selector, value, "select_option");
        self.driver
            .perform(
                &self.selector,
                &Action::SelectOption {
                    value: value.to_string(),
                },
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(200).with_poll_interval(50)
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_display_chains() {
            let sel = Selector::css("form div")
                .has_text("Akceptuję regulamin oraz")
                .descendant("div");
            assert_eq!(
                sel.to_string(),
                "css=form div >> has-text=\"Akceptuję regulamin oraz\" >> css=div"
            );
        }

        #[test]
        fn test_display_placeholder_modes() {
            assert_eq!(Selector::placeholder("Imię").to_string(), "placeholder=\"Imię\"i");
            assert_eq!(
                Selector::placeholder_exact("Hasło").to_string(),
                "placeholder=\"Hasło\"s"
            );
        }

        #[test]
        fn test_role_named_display() {
            let sel = Selector::role_named(Role::Button, "Zarejestruj");
            assert_eq!(sel.to_string(), "role=button[name=\"Zarejestruj\"i]");
        }

        #[test]
        fn test_wire_shape_is_tagged() {
            let sel = Selector::role(Role::Heading).has_text("dziękujemy");
            let json = serde_json::to_value(&sel).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "kind": "has_text",
                    "base": {"kind": "role", "role": "heading", "name": null},
                    "text": "dziękujemy"
                })
            );
        }
    }

    mod readiness_tests {
        use super::*;

        #[test]
        fn test_editable_requires_visible_and_editable() {
            let input = ElementState::new("input").with_editable(true);
            assert!(Readiness::Editable.is_met(&input));
            assert!(!Readiness::Editable.is_met(&input.clone().with_visible(false)));
            assert!(!Readiness::Editable.is_met(&ElementState::new("div")));
        }

        #[test]
        fn test_selectable_requires_option() {
            let select = ElementState::new("select").with_options(["pl", "aa"]);
            assert!(Readiness::Selectable("aa".into()).is_met(&select));
            assert!(!Readiness::Selectable("afar".into()).is_met(&select));
        }

        #[test]
        fn test_describe_matches() {
            assert_eq!(describe_matches(&[]), "no element matched");
            let two = vec![ElementState::new("div"), ElementState::new("div")];
            assert!(describe_matches(&two).starts_with("2 elements matched"));
        }
    }

    mod locator_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_fill_waits_until_editable() {
            let sel = Selector::css("input[name=\"date\"]");
            let driver = Arc::new(MockDriver::new().with_states(
                &sel,
                vec![
                    vec![],
                    vec![ElementState::new("input").with_editable(false)],
                    vec![ElementState::new("input").with_editable(true)],
                ],
            ));
            let locator = Locator::new(driver.clone(), sel, fast());
            locator.fill("2000-01-19").await.unwrap();
            assert!(driver.was_called("fill:css=input[name=\"date\"]=2000-01-19"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_is_strict() {
            let sel = Selector::css("button");
            let driver = Arc::new(MockDriver::new().with_states(
                &sel,
                vec![vec![ElementState::new("button"), ElementState::new("button")]],
            ));
            let locator = Locator::new(driver.clone(), sel, fast());
            let err = locator.click().await.unwrap_err();
            match err {
                ProbeError::ElementNotReady {
                    observed,
                    timeout_ms,
                    ..
                } => {
                    assert!(observed.contains("2 elements matched"));
                    assert_eq!(timeout_ms, 200);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!driver.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_select_option_needs_offered_value() {
            let sel = Selector::css("select");
            let driver = Arc::new(
                MockDriver::new()
                    .with_element(&sel, ElementState::new("select").with_options(["pl"])),
            );
            let locator = Locator::new(driver, sel, fast());
            let err = locator.select_option("aa").await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotReady { .. }));
            assert!(err.to_string().contains("selectable with option \"aa\""));
        }

        #[tokio::test]
        async fn test_chained_locators_share_driver_and_wait() {
            let driver: Arc<dyn Driver> = Arc::new(MockDriver::new());
            let base = Locator::new(driver, Selector::css("form div"), fast());
            let child = base.filter_has_text("Wyrażam zgodę").locator("div");
            assert_eq!(child.wait_options(), &fast());
            assert_eq!(
                child.selector().to_string(),
                "css=form div >> has-text=\"Wyrażam zgodę\" >> css=div"
            );
            assert_eq!(child.count().await.unwrap(), 0);
        }
    }
}
