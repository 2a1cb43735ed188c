//! Shared test double for the browser driver.
//!
//! `StubDriver` models just enough of a challenge page for unit tests: a
//! mutable page state guarded by a mutex, deterministic handle ids, and a
//! recording of every pointer action. Tests mutate the state directly (or
//! from a spawned task under a paused tokio clock) to script DOM changes.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{
    BrowserDriver, DriverError, DriverResult, ElementId, ElementRect, FrameId, LoadMode, Locator,
    QueryScope, ReadyState, ShadowRootId,
};

/// Shadow DOM layout around the response control's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShadowLayout {
    /// Parent hosts a single shadow root ("shadow-top").
    Attached,
    /// Parent hosts a shadow root whose child hosts another ("shadow-nested").
    Nested,
    /// Parent exists but its shadow root is gone.
    Detached,
}

#[derive(Debug)]
pub(crate) struct PageState {
    pub title: String,
    pub url: String,
    pub response_control: bool,
    pub shadow: ShadowLayout,
    pub checkbox: bool,
    pub role_button: bool,
    pub success_visible: bool,
    pub fail_visible: bool,
    pub widget_text: String,
    pub ray_id: Option<String>,
    pub widget_frame: bool,
    pub ready: ReadyState,
    pub load_mode: LoadMode,
    pub fail_page_reads: bool,
    pub fail_ready_reads: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            title: "Example Domain".into(),
            url: "https://example.com/".into(),
            response_control: false,
            shadow: ShadowLayout::Detached,
            checkbox: false,
            role_button: false,
            success_visible: false,
            fail_visible: false,
            widget_text: String::new(),
            ray_id: None,
            widget_frame: false,
            ready: ReadyState::Complete,
            load_mode: LoadMode::Full,
            fail_page_reads: false,
            fail_ready_reads: false,
        }
    }
}

/// Pointer activity recorded by the stub.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PointerAction {
    MoveToElement {
        element: ElementId,
        offset_x: i32,
        offset_y: i32,
        duration: Duration,
    },
    MoveToPoint {
        x: f64,
        y: f64,
        duration: Duration,
    },
    Click,
}

pub(crate) struct StubDriver {
    pub state: Mutex<PageState>,
    pub actions: Mutex<Vec<PointerAction>>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PageState::default()),
            actions: Mutex::new(Vec::new()),
        }
    }
}

fn scoped_to_widget(scope: &QueryScope) -> bool {
    matches!(
        scope,
        QueryScope::ShadowRoot(_) | QueryScope::Frame(_) | QueryScope::Element(_)
    )
}

#[async_trait]
impl BrowserDriver for StubDriver {
    async fn title(&self) -> DriverResult<String> {
        let state = self.state.lock().unwrap();
        if state.fail_page_reads {
            return Err(DriverError::Transport("navigation in flight".into()));
        }
        Ok(state.title.clone())
    }

    async fn url(&self) -> DriverResult<String> {
        let state = self.state.lock().unwrap();
        if state.fail_page_reads {
            return Err(DriverError::Transport("navigation in flight".into()));
        }
        Ok(state.url.clone())
    }

    async fn find_element(
        &self,
        scope: &QueryScope,
        locator: &Locator,
        _timeout: Duration,
    ) -> DriverResult<Option<ElementId>> {
        let state = self.state.lock().unwrap();
        let Locator::Css(selector) = locator else {
            return Ok(None);
        };

        let found = if selector.contains("cf-turnstile-response") {
            (*scope == QueryScope::Page && state.response_control)
                .then(|| ElementId("response-control".into()))
        } else if selector == ".ray-id code" {
            state.ray_id.is_some().then(|| ElementId("ray-id".into()))
        } else if selector.contains("checkbox") {
            (scoped_to_widget(scope) && state.checkbox).then(|| ElementId("checkbox".into()))
        } else if selector.contains("role=\"button\"") {
            (scoped_to_widget(scope) && state.role_button)
                .then(|| ElementId("role-button".into()))
        } else if selector.starts_with("#success") {
            (scoped_to_widget(scope) && state.success_visible)
                .then(|| ElementId("success-indicator".into()))
        } else if selector.starts_with("#fail") {
            (scoped_to_widget(scope) && state.fail_visible)
                .then(|| ElementId("fail-indicator".into()))
        } else {
            None
        };
        Ok(found)
    }

    async fn children(
        &self,
        scope: &QueryScope,
        _selector: &str,
        _timeout: Duration,
    ) -> DriverResult<Vec<ElementId>> {
        let state = self.state.lock().unwrap();
        if *scope == QueryScope::ShadowRoot(ShadowRootId("shadow-top".into()))
            && state.shadow == ShadowLayout::Nested
        {
            return Ok(vec![ElementId("shadow-host".into())]);
        }
        Ok(Vec::new())
    }

    async fn parent(&self, element: &ElementId) -> DriverResult<Option<ElementId>> {
        if element.0 == "response-control" {
            return Ok(Some(ElementId("response-parent".into())));
        }
        Ok(None)
    }

    async fn shadow_root(&self, element: &ElementId) -> DriverResult<Option<ShadowRootId>> {
        let state = self.state.lock().unwrap();
        match element.0.as_str() {
            "response-parent" => Ok(match state.shadow {
                ShadowLayout::Attached | ShadowLayout::Nested => {
                    Some(ShadowRootId("shadow-top".into()))
                }
                ShadowLayout::Detached => None,
            }),
            "shadow-host" => Ok(Some(ShadowRootId("shadow-nested".into()))),
            _ => Ok(None),
        }
    }

    async fn frame(&self, _locator: &Locator) -> DriverResult<Option<FrameId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .widget_frame
            .then(|| FrameId("widget-frame".into())))
    }

    async fn rect(&self, _element: &ElementId) -> DriverResult<ElementRect> {
        Ok(ElementRect {
            x: 50.0,
            y: 20.0,
            width: 100.0,
            height: 40.0,
        })
    }

    async fn eval_text(&self, _scope: &QueryScope, _script: &str) -> DriverResult<String> {
        Ok(self.state.lock().unwrap().widget_text.clone())
    }

    async fn text(&self, element: &ElementId) -> DriverResult<String> {
        let state = self.state.lock().unwrap();
        if element.0 == "ray-id" {
            return Ok(state.ray_id.clone().unwrap_or_default());
        }
        Ok(String::new())
    }

    async fn move_to_element(
        &self,
        element: &ElementId,
        offset_x: i32,
        offset_y: i32,
        duration: Duration,
    ) -> DriverResult<()> {
        self.actions.lock().unwrap().push(PointerAction::MoveToElement {
            element: element.clone(),
            offset_x,
            offset_y,
            duration,
        });
        Ok(())
    }

    async fn move_to_point(&self, x: f64, y: f64, duration: Duration) -> DriverResult<()> {
        self.actions
            .lock()
            .unwrap()
            .push(PointerAction::MoveToPoint { x, y, duration });
        Ok(())
    }

    async fn click(&self) -> DriverResult<()> {
        self.actions.lock().unwrap().push(PointerAction::Click);
        Ok(())
    }

    async fn ready_state(&self) -> DriverResult<ReadyState> {
        let state = self.state.lock().unwrap();
        if state.fail_ready_reads {
            return Err(DriverError::Transport("document mid-navigation".into()));
        }
        Ok(state.ready)
    }

    fn load_mode(&self) -> LoadMode {
        self.state.lock().unwrap().load_mode
    }
}
