//! Registration page object.
//!
//! Maps the form's operations (navigate, fill, accept terms, submit) and its
//! terminal states (success, required fields, a field error) onto locators.
//! Fields are found by placeholder, the submit button by role and name, and
//! the consent toggles by the text of their enclosing block, since the
//! toggles carry no text of their own.

use crate::expect::{expect, expect_url};
use crate::form::FormInput;
use crate::locator::{Locator, Readiness, Role, Selector};
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::{ProbeError, ProbeResult};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Text the page renders, matched by substring
pub mod messages {
    /// Confirmation shown after a successful registration
    pub const REGISTRATION_SUCCESS: &str = "dziękujemy za rejestrację!";

    /// Messages shown together when the empty form is submitted
    pub const REQUIRED_FIELDS: [&str; 7] = [
        "Pole Imię jest wymagane",
        "Pole Nazwisko jest wymagane",
        "Pole E-mail jest wymagane",
        "Pole password jest wymagane",
        "Pole Powtórz hasło jest wymagane",
        "Pole Data urodzenia jest wymagane",
        "To pole jest wymagane",
    ];

    /// Name contains something other than letters, spaces and hyphens
    pub const NAME_CHARSET: &str = "To pole może zawierać tylko litery, spacje i \"-\"";

    /// Email has no valid domain structure
    pub const INVALID_EMAIL: &str = "Pole E-mail musi być poprawnym adresem email";

    /// Confirmation differs from password
    pub const PASSWORD_MISMATCH: &str = "Hasła nie są jednakowe!";

    /// Password lacks a special character
    pub const PASSWORD_NEEDS_SPECIAL: &str = "Hasło musi zawierać: znak specjalny!";

    /// Password lacks an uppercase letter
    pub const PASSWORD_NEEDS_UPPERCASE: &str = "Hasło musi zawierać: dużą literę!";
}

/// Placeholder texts identifying the inputs
pub mod placeholders {
    /// First name
    pub const FIRST_NAME: &str = "Imię";
    /// Last name
    pub const LAST_NAME: &str = "Nazwisko";
    /// Email
    pub const EMAIL: &str = "Twój adres e-mail";
    /// Password (matched exactly; "Powtórz hasło" also contains it)
    pub const PASSWORD: &str = "Hasło";
    /// Password confirmation
    pub const CONFIRM_PASSWORD: &str = "Powtórz hasło";
    /// Phone number
    pub const PHONE: &str = "Numer telefonu";
}

/// Leading text of the terms-of-service consent block
pub const TERMS_CONSENT: &str = "Akceptuję regulamin oraz";

/// Leading text of the marketing consent block
pub const MARKETING_CONSENT: &str = "Wyrażam zgodę na otrzymywanie";

/// Accessible name of the submit button
pub const SUBMIT_LABEL: &str = "Zarejestruj";

const DATE_INPUT: &str = "input[name=\"date\"]";
const LANGUAGE_SELECT: &str = "select";
const FIELD_ERROR: &str = "span.errors";

/// Page object for the registration form
#[derive(Debug, Clone)]
pub struct RegistrationPage {
    page: Page,
    base_url: String,
}

impl PageObject for RegistrationPage {
    fn url_path(&self) -> &str {
        "/"
    }

    fn ready_marker(&self) -> Selector {
        Selector::css("h1")
    }

    fn load_timeout_ms(&self) -> u64 {
        self.page.timeouts().navigation_ms
    }

    fn page_name(&self) -> &str {
        "registration"
    }
}

impl RegistrationPage {
    /// Bind the page object to a fresh context
    #[must_use]
    pub fn new(page: Page, base_url: impl Into<String>) -> Self {
        Self {
            page,
            base_url: base_url.into(),
        }
    }

    /// Underlying browsing context
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Absolute URL the page must land on
    #[must_use]
    pub fn entry_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.url_path().trim_start_matches('/')
        )
    }

    /// Locator for a consent toggle inside the block containing `label`
    #[must_use]
    pub fn consent(&self, label: &str) -> Locator {
        self.page
            .css("form div")
            .filter_has_text(label)
            .locator("div")
    }

    /// Locator for the field error containing `message`
    #[must_use]
    pub fn field_error(&self, message: &str) -> Locator {
        self.page.css(FIELD_ERROR).filter_has_text(message)
    }

    /// Locator for the submit button
    #[must_use]
    pub fn submit_button(&self) -> Locator {
        self.page.get_by_role_named(Role::Button, SUBMIT_LABEL)
    }

    /// Locator for the success confirmation heading
    #[must_use]
    pub fn success_heading(&self) -> Locator {
        self.page
            .get_by_role(Role::Heading)
            .filter_has_text(messages::REGISTRATION_SUCCESS)
    }

    /// Load the form and confirm it rendered.
    ///
    /// # Errors
    ///
    /// [`ProbeError::NavigationError`] if the page does not load, lands on a
    /// different URL, or never shows its heading within the navigation
    /// timeout. Loading, the URL check and the heading check share that one
    /// budget.
    pub async fn navigate(&self) -> ProbeResult<()> {
        let url = self.entry_url();
        debug!(page = self.page_name(), %url, "navigate");
        let deadline = Instant::now() + Duration::from_millis(self.load_timeout_ms());
        let remaining_ms = || millis(deadline.saturating_duration_since(Instant::now()));

        self.page.goto(&url).await?;

        let wait = self.page.navigation_wait().with_timeout(remaining_ms());
        expect_url(&self.page, &url, &wait)
            .await
            .map_err(|e| ProbeError::navigation(&url, e.to_string()))?;
        expect(&self.page.locator(self.ready_marker()))
            .with_timeout(remaining_ms())
            .to_be_visible()
            .await
            .map_err(|e| ProbeError::navigation(&url, e.to_string()))
    }

    /// Type every value of `input` into its field.
    ///
    /// The date input and language select are awaited explicitly before use.
    pub async fn fill_form(&self, input: &FormInput) -> ProbeResult<()> {
        debug!(page = self.page_name(), "fill_form");
        self.page
            .get_by_placeholder(placeholders::FIRST_NAME)
            .fill(input.first_name())
            .await?;
        self.page
            .get_by_placeholder(placeholders::LAST_NAME)
            .fill(input.last_name())
            .await?;
        self.page
            .get_by_placeholder(placeholders::EMAIL)
            .fill(input.email())
            .await?;
        self.page
            .get_by_placeholder_exact(placeholders::PASSWORD)
            .fill(input.password())
            .await?;
        self.page
            .get_by_placeholder(placeholders::CONFIRM_PASSWORD)
            .fill(input.confirm_password())
            .await?;

        let date = self.page.css(DATE_INPUT);
        date.wait_for(Readiness::Editable).await?;
        date.fill(input.date_of_birth()).await?;

        let language = self.page.css(LANGUAGE_SELECT);
        language.wait_for(Readiness::Visible).await?;
        language.select_option(input.language()).await?;

        self.page
            .get_by_placeholder(placeholders::PHONE)
            .fill(input.phone_number())
            .await
    }

    /// Tick both consent toggles and confirm each is checked.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotReady`] if a toggle cannot be found or
    /// clicked, [`ProbeError::ConsentNotConfirmed`] if it never reports a
    /// checked state.
    pub async fn accept_terms(&self) -> ProbeResult<()> {
        for label in [TERMS_CONSENT, MARKETING_CONSENT] {
            debug!(page = self.page_name(), consent = label, "accept");
            let toggle = self.consent(label);
            toggle.click().await?;
            expect(&toggle)
                .to_be_checked()
                .await
                .map_err(|e| match e {
                    ProbeError::AssertionTimeout { last_observed, .. } => {
                        ProbeError::ConsentNotConfirmed {
                            consent: label.to_string(),
                            observed: last_observed,
                        }
                    }
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Click the submit button once it is enabled.
    ///
    /// # Errors
    ///
    /// [`ProbeError::SubmitUnavailable`] if the button is never enabled.
    pub async fn submit(&self) -> ProbeResult<()> {
        debug!(page = self.page_name(), "submit");
        let button = self.submit_button();
        expect(&button)
            .to_be_enabled()
            .await
            .map_err(|e| match e {
                ProbeError::AssertionTimeout { timeout_ms, .. } => ProbeError::SubmitUnavailable {
                    locator: button.selector().to_string(),
                    timeout_ms,
                },
                other => other,
            })?;
        button.click().await
    }

    /// A heading containing the confirmation phrase becomes visible
    pub async fn expect_registration_success(&self) -> ProbeResult<()> {
        let heading = self.success_heading();
        expect(&heading).to_be_visible().await?;
        expect(&heading)
            .to_contain_text(messages::REGISTRATION_SUCCESS)
            .await
    }

    /// The form shows every required-field message at once.
    ///
    /// Order is not checked. A timeout lists all messages still missing.
    pub async fn expect_required_fields_error(&self) -> ProbeResult<()> {
        expect(&self.page.css("form"))
            .to_contain_all_texts(&messages::REQUIRED_FIELDS)
            .await
    }

    /// A visible field error contains `message`, none of the `excluded`
    /// errors is visible, and no success confirmation is shown
    pub async fn expect_field_error(&self, message: &str, excluded: &[&str]) -> ProbeResult<()> {
        expect(&self.field_error(message)).to_be_visible().await?;
        for other in excluded {
            expect(&self.field_error(other)).to_be_hidden().await?;
        }
        expect(&self.success_heading()).to_have_count(0).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::{ElementState, MockDriver};
    use std::sync::Arc;

    const BASE: &str = "http://localhost:8080";

    fn registration(driver: MockDriver) -> (RegistrationPage, Arc<MockDriver>) {
        let driver = Arc::new(driver);
        let timeouts = Timeouts {
            action_ms: 200,
            navigation_ms: 400,
            ..Timeouts::default()
        };
        let page = Page::new(driver.clone(), timeouts);
        (RegistrationPage::new(page, BASE), driver)
    }

    fn consent_selector(label: &str) -> Selector {
        Selector::css("form div").has_text(label).descendant("div")
    }

    mod navigate_tests {
        use super::*;

        #[test]
        fn test_entry_url() {
            let (page, _) = registration(MockDriver::new());
            assert_eq!(page.entry_url(), "http://localhost:8080/");
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_checks_url_and_heading() {
            let driver = MockDriver::new()
                .with_url("http://localhost:8080/")
                .with_element(
                    &Selector::css("h1"),
                    ElementState::new("h1").with_text("Rejestracja"),
                );
            let (page, driver) = registration(driver);
            page.navigate().await.unwrap();
            assert!(driver.was_called("goto:http://localhost:8080/"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_wrong_url_is_navigation_error() {
            let driver = MockDriver::new()
                .with_url("http://localhost:8080/login")
                .with_element(&Selector::css("h1"), ElementState::new("h1"));
            let (page, _) = registration(driver);
            let err = page.navigate().await.unwrap_err();
            assert!(matches!(err, ProbeError::NavigationError { .. }));
            assert!(err.to_string().contains("/login"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_slow_load_and_slow_heading_share_one_budget() {
            // 400ms budget: load takes 240ms, heading shows ~250ms later
            let mut states = vec![Vec::new(); 5];
            states.push(vec![ElementState::new("h1").with_text("Rejestracja")]);
            let driver = MockDriver::new()
                .with_goto_delay(Duration::from_millis(240))
                .with_states(&Selector::css("h1"), states);
            let (page, _) = registration(driver);

            let started = Instant::now();
            let err = page.navigate().await.unwrap_err();
            assert!(matches!(err, ProbeError::NavigationError { .. }));
            assert!(started.elapsed() <= Duration::from_millis(400));
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_within_budget_after_slow_load() {
            let driver = MockDriver::new()
                .with_goto_delay(Duration::from_millis(240))
                .with_states(
                    &Selector::css("h1"),
                    vec![Vec::new(), vec![ElementState::new("h1")]],
                );
            let (page, _) = registration(driver);
            page.navigate().await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_without_heading_is_navigation_error() {
            let driver = MockDriver::new().with_url("http://localhost:8080/");
            let (page, _) = registration(driver);
            let err = page.navigate().await.unwrap_err();
            assert!(matches!(err, ProbeError::NavigationError { .. }));
        }
    }

    mod consent_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_accept_terms_clicks_both_toggles() {
            let driver = MockDriver::new()
                .with_states(
                    &consent_selector(TERMS_CONSENT),
                    vec![
                        vec![ElementState::new("div").with_checked(false)],
                        vec![ElementState::new("div").with_checked(true)],
                    ],
                )
                .with_states(
                    &consent_selector(MARKETING_CONSENT),
                    vec![
                        vec![ElementState::new("div").with_checked(false)],
                        vec![ElementState::new("div").with_checked(true)],
                    ],
                );
            let (page, driver) = registration(driver);
            page.accept_terms().await.unwrap();
            let clicks: Vec<_> = driver
                .history()
                .into_iter()
                .filter(|c| c.starts_with("click:"))
                .collect();
            assert_eq!(clicks.len(), 2);
            assert!(clicks[0].contains(TERMS_CONSENT));
            assert!(clicks[1].contains(MARKETING_CONSENT));
        }

        #[tokio::test(start_paused = true)]
        async fn test_toggle_that_never_checks() {
            let driver = MockDriver::new().with_element(
                &consent_selector(TERMS_CONSENT),
                ElementState::new("div").with_checked(false),
            );
            let (page, _) = registration(driver);
            let err = page.accept_terms().await.unwrap_err();
            match err {
                ProbeError::ConsentNotConfirmed { consent, observed } => {
                    assert_eq!(consent, TERMS_CONSENT);
                    assert!(observed.contains("checked=false"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_toggle_is_element_not_ready() {
            let (page, _) = registration(MockDriver::new());
            let err = page.accept_terms().await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotReady { .. }));
        }
    }

    mod submit_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_disabled_button_is_submit_unavailable() {
            let driver = MockDriver::new().with_element(
                &Selector::role_named(Role::Button, SUBMIT_LABEL),
                ElementState::new("button").with_enabled(false),
            );
            let (page, driver) = registration(driver);
            let err = page.submit().await.unwrap_err();
            assert!(matches!(
                err,
                ProbeError::SubmitUnavailable { timeout_ms: 200, .. }
            ));
            assert!(!driver.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_enabled_button_is_clicked() {
            let driver = MockDriver::new().with_element(
                &Selector::role_named(Role::Button, SUBMIT_LABEL),
                ElementState::new("button").with_text(SUBMIT_LABEL),
            );
            let (page, driver) = registration(driver);
            page.submit().await.unwrap();
            assert!(driver.was_called("click:role=button"));
        }
    }

    mod outcome_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_required_fields_error_lists_missing_messages() {
            let driver = MockDriver::new().with_element(
                &Selector::css("form"),
                ElementState::new("form").with_text(messages::REQUIRED_FIELDS[..5].join(" ")),
            );
            let (page, _) = registration(driver);
            let err = page.expect_required_fields_error().await.unwrap_err();
            let observed = err.observed().unwrap().to_string();
            assert!(observed.contains("Pole Data urodzenia jest wymagane"));
            assert!(observed.contains("To pole jest wymagane"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_field_error_rejects_simultaneous_success() {
            let driver = MockDriver::new()
                .with_element(
                    &Selector::css(FIELD_ERROR).has_text(messages::PASSWORD_MISMATCH),
                    ElementState::new("span").with_text(messages::PASSWORD_MISMATCH),
                )
                .with_element(
                    &Selector::role(Role::Heading).has_text(messages::REGISTRATION_SUCCESS),
                    ElementState::new("h2").with_text(messages::REGISTRATION_SUCCESS),
                );
            let (page, _) = registration(driver);
            let err = page
                .expect_field_error(messages::PASSWORD_MISMATCH, &[])
                .await
                .unwrap_err();
            assert!(err.to_string().contains("to have count 0"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_field_error_rejects_the_other_password_rule() {
            let span = |message: &str| {
                (
                    Selector::css(FIELD_ERROR).has_text(message),
                    ElementState::new("span").with_text(message),
                )
            };
            let (special, special_el) = span(messages::PASSWORD_NEEDS_SPECIAL);
            let (upper, upper_el) = span(messages::PASSWORD_NEEDS_UPPERCASE);
            let driver = MockDriver::new()
                .with_element(&special, special_el)
                .with_element(&upper, upper_el);
            let (page, _) = registration(driver);

            let err = page
                .expect_field_error(
                    messages::PASSWORD_NEEDS_SPECIAL,
                    &[messages::PASSWORD_NEEDS_UPPERCASE],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::AssertionTimeout { .. }));
            assert!(err.to_string().contains("to be hidden"));
            assert!(err.to_string().contains("dużą literę"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_field_error_alone_passes() {
            let driver = MockDriver::new().with_element(
                &Selector::css(FIELD_ERROR).has_text(messages::PASSWORD_NEEDS_SPECIAL),
                ElementState::new("span").with_text(messages::PASSWORD_NEEDS_SPECIAL),
            );
            let (page, _) = registration(driver);
            page.expect_field_error(
                messages::PASSWORD_NEEDS_SPECIAL,
                &[messages::PASSWORD_NEEDS_UPPERCASE],
            )
            .await
            .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_success_heading() {
            let driver = MockDriver::new().with_element(
                &Selector::role(Role::Heading).has_text(messages::REGISTRATION_SUCCESS),
                ElementState::new("h2").with_text("Konto utworzone, dziękujemy za rejestrację!"),
            );
            let (page, _) = registration(driver);
            page.expect_registration_success().await.unwrap();
        }
    }
}
