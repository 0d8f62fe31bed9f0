//! Scenario catalog.
//!
//! Each scenario is one independent end-to-end check: navigate, drive a fixed
//! input sequence, then assert exactly one terminal outcome. Scenarios share
//! nothing and can run in any order against separate contexts.

use crate::artifacts::Journal;
use crate::form::FormInput;
use crate::registration::{messages, RegistrationPage};
use crate::result::ProbeResult;
use serde::Serialize;

/// Terminal outcome a scenario asserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Success confirmation is shown
    Registered,
    /// Every required-field message is shown at once
    RequiredFieldsReported,
    /// A field error containing `message` is shown, none of the `excluded`
    /// errors are, and no confirmation is
    FieldError {
        message: &'static str,
        excluded: &'static [&'static str],
    },
}

/// Errors for the one password rule a scenario does not break
const NOT_UPPERCASE: &[&str] = &[messages::PASSWORD_NEEDS_UPPERCASE];
const NOT_SPECIAL: &[&str] = &[messages::PASSWORD_NEEDS_SPECIAL];

impl Outcome {
    /// Short description for listings
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Registered => "success".to_string(),
            Self::RequiredFieldsReported => {
                format!("{} required-field messages", messages::REQUIRED_FIELDS.len())
            }
            Self::FieldError { message, .. } => format!("field error \"{message}\""),
        }
    }
}

/// One behavioural check
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    /// Stable identifier, used for filtering and artifact paths
    pub name: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// Values typed into the form; `None` leaves every field empty
    pub input: Option<FormInput>,
    /// Whether both consent toggles are ticked before submitting
    pub accept_terms: bool,
    /// Terminal state asserted after submitting
    pub outcome: Outcome,
}

impl Scenario {
    fn invalid(
        name: &'static str,
        title: &'static str,
        input: FormInput,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            title,
            input: Some(input),
            accept_terms: true,
            outcome: Outcome::FieldError {
                message,
                excluded: &[],
            },
        }
    }

    fn excluding(mut self, excluded: &'static [&'static str]) -> Self {
        if let Outcome::FieldError { message, .. } = self.outcome {
            self.outcome = Outcome::FieldError { message, excluded };
        }
        self
    }

    /// Drive the page through this scenario, recording each step
    pub async fn execute(&self, page: &RegistrationPage, journal: &mut Journal) -> ProbeResult<()> {
        journal.step("navigate", page.navigate()).await?;
        if let Some(input) = &self.input {
            journal.step("fill_form", page.fill_form(input)).await?;
        }
        if self.accept_terms {
            journal.step("accept_terms", page.accept_terms()).await?;
        }
        journal.step("submit", page.submit()).await?;

        match self.outcome {
            Outcome::Registered => {
                journal
                    .step(
                        "expect_registration_success",
                        page.expect_registration_success(),
                    )
                    .await
            }
            Outcome::RequiredFieldsReported => {
                journal
                    .step(
                        "expect_required_fields_error",
                        page.expect_required_fields_error(),
                    )
                    .await
            }
            Outcome::FieldError { message, excluded } => {
                journal
                    .step(
                        "expect_field_error",
                        page.expect_field_error(message, excluded),
                    )
                    .await
            }
        }
    }
}

/// Input used by the field-error scenarios
fn error_baseline() -> FormInput {
    FormInput::valid()
        .with_date_of_birth("2000-01-01")
        .with_language("pl")
}

/// Every scenario, in listing order
#[must_use]
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "submits_valid_registration",
            title: "Valid registration is confirmed",
            input: Some(FormInput::valid()),
            accept_terms: true,
            outcome: Outcome::Registered,
        },
        Scenario {
            name: "reports_required_fields",
            title: "Empty form reports every required field",
            input: None,
            accept_terms: false,
            outcome: Outcome::RequiredFieldsReported,
        },
        Scenario::invalid(
            "rejects_first_name_charset",
            "First name with digits is rejected",
            error_baseline().with_first_name("Jan123"),
            messages::NAME_CHARSET,
        ),
        Scenario::invalid(
            "rejects_last_name_charset",
            "Last name with punctuation is rejected",
            error_baseline().with_last_name("Kowalski!"),
            messages::NAME_CHARSET,
        ),
        Scenario {
            name: "accepts_name_boundary_charset",
            title: "Names with a trailing space and a hyphen are accepted",
            input: Some(
                FormInput::valid()
                    .with_first_name("Jan ")
                    .with_last_name("Kowalski-Kowal"),
            ),
            accept_terms: true,
            outcome: Outcome::Registered,
        },
        Scenario::invalid(
            "rejects_email_without_tld",
            "Email without a top-level domain is rejected",
            FormInput::valid()
                .with_email("jan.kowalski@invalid")
                .with_language("afar"),
            messages::INVALID_EMAIL,
        ),
        Scenario::invalid(
            "rejects_password_mismatch",
            "Mismatched confirmation is rejected",
            error_baseline().with_confirm_password("BardzoSilneHaslo13#"),
            messages::PASSWORD_MISMATCH,
        ),
        Scenario::invalid(
            "rejects_password_without_special_char",
            "Password without a special character is rejected",
            error_baseline().with_passwords("BardzoSilneHaslo12"),
            messages::PASSWORD_NEEDS_SPECIAL,
        )
        .excluding(NOT_UPPERCASE),
        Scenario::invalid(
            "rejects_password_without_uppercase",
            "Password without an uppercase letter is rejected",
            error_baseline().with_passwords("bardzosilnehaslo12@"),
            messages::PASSWORD_NEEDS_UPPERCASE,
        )
        .excluding(NOT_SPECIAL),
    ]
}

/// Scenarios whose name contains `pattern`; `None` keeps all
#[must_use]
pub fn filter(scenarios: Vec<Scenario>, pattern: Option<&str>) -> Vec<Scenario> {
    match pattern {
        Some(pattern) => scenarios
            .into_iter()
            .filter(|s| s.name.contains(pattern))
            .collect(),
        None => scenarios,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_catalog_has_nine_unique_scenarios() {
            let all = catalog();
            assert_eq!(all.len(), 9);
            let names: HashSet<_> = all.iter().map(|s| s.name).collect();
            assert_eq!(names.len(), 9);
        }

        #[test]
        fn test_error_scenarios_use_error_baseline() {
            for scenario in catalog() {
                let Outcome::FieldError { .. } = scenario.outcome else {
                    continue;
                };
                let input = scenario.input.unwrap();
                assert!(scenario.accept_terms);
                if scenario.name == "rejects_email_without_tld" {
                    assert_eq!(input.date_of_birth(), "2000-01-19");
                    assert_eq!(input.language(), "afar");
                } else {
                    assert_eq!(input.date_of_birth(), "2000-01-01");
                    assert_eq!(input.language(), "pl");
                }
            }
        }

        #[test]
        fn test_required_fields_scenario_fills_nothing() {
            let scenario = catalog()
                .into_iter()
                .find(|s| s.name == "reports_required_fields")
                .unwrap();
            assert!(scenario.input.is_none());
            assert!(!scenario.accept_terms);
            assert_eq!(scenario.outcome, Outcome::RequiredFieldsReported);
        }

        #[test]
        fn test_password_rule_scenarios_exclude_each_other() {
            let outcome = |name: &str| {
                catalog()
                    .into_iter()
                    .find(|s| s.name == name)
                    .unwrap()
                    .outcome
            };
            assert_eq!(
                outcome("rejects_password_without_special_char"),
                Outcome::FieldError {
                    message: messages::PASSWORD_NEEDS_SPECIAL,
                    excluded: &[messages::PASSWORD_NEEDS_UPPERCASE],
                }
            );
            assert_eq!(
                outcome("rejects_password_without_uppercase"),
                Outcome::FieldError {
                    message: messages::PASSWORD_NEEDS_UPPERCASE,
                    excluded: &[messages::PASSWORD_NEEDS_SPECIAL],
                }
            );
        }

        #[test]
        fn test_password_scenarios_target_one_rule_each() {
            let all = catalog();
            let special = all
                .iter()
                .find(|s| s.name == "rejects_password_without_special_char")
                .unwrap();
            let upper = all
                .iter()
                .find(|s| s.name == "rejects_password_without_uppercase")
                .unwrap();
            let special_pw = special.input.as_ref().unwrap().password().to_string();
            let upper_pw = upper.input.as_ref().unwrap().password().to_string();
            assert!(special_pw.chars().any(char::is_uppercase));
            assert!(special_pw.chars().all(char::is_alphanumeric));
            assert!(!upper_pw.chars().any(char::is_uppercase));
            assert!(!upper_pw.chars().all(char::is_alphanumeric));
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_filter_by_substring() {
            let picked = filter(catalog(), Some("password"));
            assert_eq!(picked.len(), 3);
            assert!(filter(catalog(), Some("nothing-matches")).is_empty());
            assert_eq!(filter(catalog(), None).len(), 9);
        }
    }

    #[test]
    fn test_outcome_serialises_with_message() {
        let json = serde_json::to_value(Outcome::FieldError {
            message: messages::PASSWORD_MISMATCH,
            excluded: &[],
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "field_error",
                "message": "Hasła nie są jednakowe!",
                "excluded": [],
            })
        );
        let json = serde_json::to_value(Outcome::Registered).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "registered"}));
    }
}
