//! Page Object Model Support
//!
//! A page object wraps "how to find and drive" a screen behind operations
//! named after what the user does. Scenarios talk to page objects only.

use crate::locator::Selector;

/// A page or component in the UI under test.
///
/// Implementors expose the landing contract used by navigation: where the
/// page lives and which landmark proves it rendered.
///
/// # Example
///
/// ```ignore
/// struct LoginPage { page: Page }
///
/// impl PageObject for LoginPage {
///     fn url_path(&self) -> &str {
///         "/login"
///     }
///
///     fn ready_marker(&self) -> Selector {
///         Selector::css("form#login")
///     }
/// }
/// ```
pub trait PageObject {
    /// Path of the page relative to the base URL
    fn url_path(&self) -> &str;

    /// Element that must be visible once the page has rendered
    fn ready_marker(&self) -> Selector;

    /// How long navigation may take, in milliseconds
    fn load_timeout_ms(&self) -> u64 {
        crate::config::DEFAULT_NAVIGATION_TIMEOUT_MS
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
