//! Page driver abstraction
//!
//! The session executes flows exclusively through this trait, so session
//! semantics can be exercised against a scripted driver in tests while
//! production runs use Chromium over the DevTools protocol.

use async_trait::async_trait;

use webproof_flow::{FlowResult, Locator};

/// One attached browser page.
///
/// Locators are resolved fresh on every call; drivers keep no element
/// handles between calls. `fill` and `click` require exactly one match and
/// fail immediately with a locator error otherwise. `is_visible` answers
/// for the current instant only; all waiting lives in the session.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to an absolute URL and wait for the load to settle
    async fn goto(&mut self, url: &str) -> FlowResult<()>;

    /// Replace the value of the uniquely matching form control
    async fn fill(&mut self, locator: &Locator, value: &str) -> FlowResult<()>;

    /// Click the uniquely matching element
    async fn click(&mut self, locator: &Locator) -> FlowResult<()>;

    /// Whether at least one element matching the locator is visible right now
    async fn is_visible(&mut self, locator: &Locator) -> FlowResult<bool>;

    /// Current page URL
    async fn current_url(&mut self) -> FlowResult<String>;

    /// Capture the current viewport as PNG bytes
    async fn screenshot(&mut self) -> FlowResult<Vec<u8>>;

    /// Release the page and the browser behind it.
    ///
    /// Called exactly once by the session, on every exit path. Implementations
    /// must tolerate a second call but the session never makes one.
    async fn close(&mut self) -> FlowResult<()>;
}
