//! Registration form input.

use serde::{Deserialize, Serialize};

/// Immutable set of values typed into the registration form.
///
/// Variants are derived from [`FormInput::valid`] with consuming `with_*`
/// builders; nothing mutates an input once a scenario holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormInput {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    confirm_password: String,
    date_of_birth: String,
    language: String,
    phone_number: String,
}

impl FormInput {
    /// Baseline input every validation check is derived from
    #[must_use]
    pub fn valid() -> Self {
        Self {
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            email: "jan.kowalski@niepodam.pl".to_string(),
            password: "BardzoSilneHaslo12#".to_string(),
            confirm_password: "BardzoSilneHaslo12#".to_string(),
            date_of_birth: "2000-01-19".to_string(),
            language: "aa".to_string(),
            phone_number: "123456789".to_string(),
        }
    }

    /// Set first name
    #[must_use]
    pub fn with_first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = value.into();
        self
    }

    /// Set last name
    #[must_use]
    pub fn with_last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = value.into();
        self
    }

    /// Set email
    #[must_use]
    pub fn with_email(mut self, value: impl Into<String>) -> Self {
        self.email = value.into();
        self
    }

    /// Set password only
    #[must_use]
    pub fn with_password(mut self, value: impl Into<String>) -> Self {
        self.password = value.into();
        self
    }

    /// Set confirmation only
    #[must_use]
    pub fn with_confirm_password(mut self, value: impl Into<String>) -> Self {
        self.confirm_password = value.into();
        self
    }

    /// Set password and a matching confirmation
    #[must_use]
    pub fn with_passwords(self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.with_password(value.clone()).with_confirm_password(value)
    }

    /// Set date of birth (ISO `YYYY-MM-DD`)
    #[must_use]
    pub fn with_date_of_birth(mut self, value: impl Into<String>) -> Self {
        self.date_of_birth = value.into();
        self
    }

    /// Set language option value
    #[must_use]
    pub fn with_language(mut self, value: impl Into<String>) -> Self {
        self.language = value.into();
        self
    }

    /// Set phone number
    #[must_use]
    pub fn with_phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = value.into();
        self
    }

    /// First name
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Last name
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Email
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Password
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Password confirmation
    #[must_use]
    pub fn confirm_password(&self) -> &str {
        &self.confirm_password
    }

    /// Date of birth
    #[must_use]
    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    /// Language option value
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Phone number
    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_baseline() {
        let input = FormInput::valid();
        assert_eq!(input.first_name(), "Jan");
        assert_eq!(input.email(), "jan.kowalski@niepodam.pl");
        assert_eq!(input.password(), input.confirm_password());
        assert_eq!(input.date_of_birth(), "2000-01-19");
        assert_eq!(input.language(), "aa");
        assert_eq!(input.phone_number(), "123456789");
    }

    #[test]
    fn test_builders_leave_baseline_untouched() {
        let base = FormInput::valid();
        let variant = base.clone().with_first_name("Jan123");
        assert_eq!(base.first_name(), "Jan");
        assert_eq!(variant.first_name(), "Jan123");
        assert_eq!(variant.last_name(), base.last_name());
    }

    #[test]
    fn test_with_passwords_sets_both() {
        let input = FormInput::valid().with_passwords("bardzosilnehaslo12@");
        assert_eq!(input.password(), "bardzosilnehaslo12@");
        assert_eq!(input.confirm_password(), "bardzosilnehaslo12@");
    }

    #[test]
    fn test_confirm_only_creates_mismatch() {
        let input = FormInput::valid().with_confirm_password("BardzoSilneHaslo13#");
        assert_ne!(input.password(), input.confirm_password());
    }
}
