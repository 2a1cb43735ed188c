//! Browser driver contract.
//!
//! The bypass core never owns a browser. Everything it needs from the remote
//! session is expressed through the [`BrowserDriver`] trait: page-level reads
//! (title, URL, readiness), scoped element queries, shadow-root and frame
//! resolution, and a pointer-action API. Implementations wrap whatever
//! automation transport the caller already runs (CDP, WebDriver, …).
//!
//! Handles minted by the driver are opaque ids. The core treats them as
//! short-lived: a handle obtained during one polling iteration is never
//! reused in a later one without re-resolution, because the underlying DOM
//! node is allowed to detach and reattach at any time.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Result alias for driver round trips.
pub type DriverResult<T> = Result<T, DriverError>;

/// Opaque reference to a DOM element held by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

/// Opaque reference to an open shadow root held by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShadowRootId(pub String);

/// Opaque reference to a same-origin frame held by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameId(pub String);

/// Element locator understood by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Locator::XPath(expression.into())
    }
}

/// Scope a query runs against. Shadow roots and frames are encapsulation
/// boundaries that page-level queries cannot cross, so the scope is always
/// explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    Page,
    Element(ElementId),
    ShadowRoot(ShadowRootId),
    Frame(FrameId),
}

/// Page load-progress classification as reported by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Load-completeness mode configured on the session.
///
/// `Eager` sessions consider a page usable at `Interactive`; `Full` sessions
/// wait for `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Eager,
    Full,
}

/// Bounding rectangle of an element in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    /// Centre point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Errors surfaced by the driver transport.
///
/// Absence of an element is never an error: lookups return `Ok(None)` when
/// nothing matches. `DriverError` means the query mechanism itself failed,
/// e.g. a read racing a navigation or a dropped connection.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver transport error: {0}")]
    Transport(String),
    #[error("stale handle: {0}")]
    StaleHandle(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
}

/// Contract abstracting the remote, driver-controlled browser session.
///
/// Every call is a blocking round trip to the remote browser. Implementations
/// must keep handle ids valid until the referenced node detaches, and must
/// report absence as `Ok(None)` rather than an error.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Current page title.
    async fn title(&self) -> DriverResult<String>;

    /// Current page URL.
    async fn url(&self) -> DriverResult<String>;

    /// Single-result element query within `scope`, waiting up to `timeout`
    /// for a match.
    async fn find_element(
        &self,
        scope: &QueryScope,
        locator: &Locator,
        timeout: Duration,
    ) -> DriverResult<Option<ElementId>>;

    /// Child elements of `scope` matching a CSS selector.
    async fn children(
        &self,
        scope: &QueryScope,
        selector: &str,
        timeout: Duration,
    ) -> DriverResult<Vec<ElementId>>;

    /// Parent element, if any.
    async fn parent(&self, element: &ElementId) -> DriverResult<Option<ElementId>>;

    /// Open shadow root attached to `element`, if one is currently attached.
    async fn shadow_root(&self, element: &ElementId) -> DriverResult<Option<ShadowRootId>>;

    /// Resolve a same-origin frame by locator.
    async fn frame(&self, locator: &Locator) -> DriverResult<Option<FrameId>>;

    /// Bounding rectangle of an element.
    async fn rect(&self, element: &ElementId) -> DriverResult<ElementRect>;

    /// Evaluate a script in `scope` and return its textual result.
    async fn eval_text(&self, scope: &QueryScope, script: &str) -> DriverResult<String>;

    /// Visible text content of an element.
    async fn text(&self, element: &ElementId) -> DriverResult<String>;

    /// Move the pointer to an element plus a per-axis pixel offset, taking
    /// `duration` to travel.
    async fn move_to_element(
        &self,
        element: &ElementId,
        offset_x: i32,
        offset_y: i32,
        duration: Duration,
    ) -> DriverResult<()>;

    /// Move the pointer to an absolute page coordinate, taking `duration` to
    /// travel.
    async fn move_to_point(&self, x: f64, y: f64, duration: Duration) -> DriverResult<()>;

    /// Click at the pointer's current position.
    async fn click(&self) -> DriverResult<()>;

    /// Current document readiness state.
    async fn ready_state(&self) -> DriverResult<ReadyState>;

    /// Load-completeness mode configured on this session.
    fn load_mode(&self) -> LoadMode;
}
