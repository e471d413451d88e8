//! In-memory [`Browser`] and a mock portal API for unit tests
//!
//! Nodes are keyed by the exact XPath string that finds them. Timing is driven
//! by how many times an XPath has been looked up, not by the clock.
//!
//! Scenarios seed objects under fresh random ids, so pages for them are built
//! from the seeding requests: [`MockPortal::seed`] hands every posted body to a
//! callback that adds the nodes the portal would render for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockito::{Mock, Request, Server, ServerGuard};
use serde_json::{json, Value};

use scanpage_common::{ApiClient, ApiConfig};

use crate::browser::Browser;
use crate::config::{Fixtures, Tokens};
use crate::driver::{
    Driver, DriverSettings, ScrollStrategy, IS_UNOBSCURED_JS, SCRIPT_CLICK_JS,
    SCROLL_ELEMENT_TO_TOP_JS, SCROLL_INTO_VIEW_JS, SCROLL_PARENT_INTO_VIEW_JS,
};
use crate::error::{E2eError, E2eResult};
use crate::scenarios::ScenarioContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub id: usize,
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    xpath: String,
    appear_after: u32,
    disappear_after: Option<u32>,
    displayed: bool,
    enabled: bool,
    obscured_for: u32,
    offscreen: Option<ScrollStrategy>,
    intercept_clicks: u32,
    stale_on_click: bool,
    text: String,
}

impl FakeNode {
    pub fn new(xpath: &str) -> Self {
        Self {
            xpath: xpath.to_string(),
            appear_after: 0,
            disappear_after: None,
            displayed: true,
            enabled: true,
            obscured_for: 0,
            offscreen: None,
            intercept_clicks: 0,
            stale_on_click: false,
            text: String::new(),
        }
    }

    /// Absent for the first `n` lookups
    pub fn appear_after(mut self, n: u32) -> Self {
        self.appear_after = n;
        self
    }

    /// Gone from lookup `n + 1` onwards
    pub fn disappear_after(mut self, n: u32) -> Self {
        self.disappear_after = Some(n);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Covered by another element for the next `n` clickability checks
    pub fn obscured_for(mut self, n: u32) -> Self {
        self.obscured_for = n;
        self
    }

    /// Outside the viewport, so the hit test misses it, until scrolled in
    /// with `strategy`
    pub fn offscreen(mut self, strategy: ScrollStrategy) -> Self {
        self.offscreen = Some(strategy);
        self
    }

    /// Next `n` native clicks are intercepted
    pub fn intercept_clicks(mut self, n: u32) -> Self {
        self.intercept_clicks = n;
        self
    }

    pub fn stale_on_click(mut self) -> Self {
        self.stale_on_click = true;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

fn consume(counter: &mut u32) -> bool {
    if *counter == 0 {
        return false;
    }
    if *counter != u32::MAX {
        *counter -= 1;
    }
    true
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<FakeNode>,
    lookups: HashMap<String, u32>,
    log: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<State>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its element id
    pub fn add(&self, node: FakeNode) -> usize {
        let mut state = self.state.lock().unwrap();
        state.nodes.push(node);
        state.nodes.len() - 1
    }

    /// How many times `xpath` has been looked up
    pub fn lookups(&self, xpath: &str) -> u32 {
        let state = self.state.lock().unwrap();
        state.lookups.get(xpath).copied().unwrap_or(0)
    }

    /// Side-effecting commands in the order they were issued
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Ids of the nodes registered under `xpath`
    pub fn ids(&self, xpath: &str) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.xpath == xpath)
            .map(|(id, _)| id)
            .collect()
    }

    /// Log positions of `entry` (e.g. "click") issued against any node
    /// registered under `xpath`
    pub fn positions(&self, entry: &str, xpath: &str) -> Vec<usize> {
        let targets: Vec<String> = self
            .ids(xpath)
            .into_iter()
            .map(|id| format!("{} #{}", entry, id))
            .collect();
        self.log()
            .iter()
            .enumerate()
            .filter(|(_, line)| targets.contains(*line))
            .map(|(position, _)| position)
            .collect()
    }

    /// Text typed into the node registered under `xpath`, in order
    pub fn typed(&self, xpath: &str) -> Vec<String> {
        let prefixes: Vec<String> = self
            .ids(xpath)
            .into_iter()
            .map(|id| format!("keys #{} ", id))
            .collect();
        self.log()
            .iter()
            .filter_map(|line| {
                prefixes
                    .iter()
                    .find_map(|prefix| line.strip_prefix(prefix.as_str()))
                    .map(str::to_string)
            })
            .collect()
    }

    fn record(&self, entry: String) {
        self.state.lock().unwrap().log.push(entry);
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(format!("goto {}", url));
        Ok(())
    }

    async fn find_all(&self, xpath: &str) -> E2eResult<Vec<FakeElement>> {
        let mut state = self.state.lock().unwrap();
        let count = {
            let entry = state.lookups.entry(xpath.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.xpath == xpath)
            .filter(|(_, node)| count > node.appear_after)
            .filter(|(_, node)| node.disappear_after.map_or(true, |n| count <= n))
            .map(|(id, _)| FakeElement { id })
            .collect())
    }

    async fn is_displayed(&self, element: &FakeElement) -> E2eResult<bool> {
        Ok(self.state.lock().unwrap().nodes[element.id].displayed)
    }

    async fn is_enabled(&self, element: &FakeElement) -> E2eResult<bool> {
        Ok(self.state.lock().unwrap().nodes[element.id].enabled)
    }

    async fn click(&self, element: &FakeElement) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        let node = &mut state.nodes[element.id];
        if node.stale_on_click {
            return Err(E2eError::StaleElement(format!("#{}", element.id)));
        }
        if consume(&mut node.intercept_clicks) {
            state.log.push(format!("intercepted #{}", element.id));
            return Err(E2eError::ClickIntercepted(format!("#{}", element.id)));
        }
        state.log.push(format!("click #{}", element.id));
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> E2eResult<()> {
        self.record(format!("clear #{}", element.id));
        Ok(())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> E2eResult<()> {
        self.record(format!("keys #{} {}", element.id, text));
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> E2eResult<String> {
        Ok(self.state.lock().unwrap().nodes[element.id].text.clone())
    }

    async fn execute_with(&self, script: &str, element: &FakeElement) -> E2eResult<Value> {
        let mut state = self.state.lock().unwrap();
        let id = element.id;
        let node = &mut state.nodes[id];
        let entry = match script {
            IS_UNOBSCURED_JS => {
                if node.offscreen.is_some() {
                    return Ok(Value::Bool(false));
                }
                let obscured = consume(&mut node.obscured_for);
                return Ok(Value::Bool(!obscured));
            }
            SCROLL_INTO_VIEW_JS => {
                if node.offscreen == Some(ScrollStrategy::Element) {
                    node.offscreen = None;
                }
                format!("scroll #{}", id)
            }
            SCROLL_PARENT_INTO_VIEW_JS => {
                if node.offscreen == Some(ScrollStrategy::Parent) {
                    node.offscreen = None;
                }
                format!("scroll-parent #{}", id)
            }
            SCROLL_ELEMENT_TO_TOP_JS => format!("scroll-to-top #{}", id),
            SCRIPT_CLICK_JS => format!("script-click #{}", id),
            _ => format!("script #{}", id),
        };
        state.log.push(entry);
        Ok(Value::Null)
    }

    async fn quit(&self) -> E2eResult<()> {
        self.record("quit".to_string());
        Ok(())
    }
}

/// Fixture ids and tokens the scenario tests run with
pub fn fixtures() -> Fixtures {
    Fixtures {
        user_id: 2,
        group_admin_user_id: 3,
        view_only_user_id: 4,
        public_group_id: 5,
        public_filter_id: 6,
        public_candidate_id: "ZTF20public1".to_string(),
        public_candidate2_id: "ZTF20public2".to_string(),
        ztf_camera_id: 7,
        tokens: Tokens {
            upload_data: "t-upload".to_string(),
            super_admin: "t-admin".to_string(),
            annotation: "t-annotation".to_string(),
            taxonomy: "t-taxonomy".to_string(),
            classification: "t-classification".to_string(),
        },
    }
}

/// Scenario context driving `browser` and seeding through `api_url`.
/// Waits are short so a page that never settles fails quickly.
pub fn context(browser: FakeBrowser, api_url: &str) -> ScenarioContext<FakeBrowser> {
    let settings = DriverSettings {
        wait_timeout_ms: 500,
        click_timeout_ms: 500,
        poll_interval_ms: 10,
        click_attempts: 3,
    };
    ScenarioContext {
        driver: Driver::new(browser, "http://portal.test", settings),
        api: ApiClient::new(ApiConfig {
            server_url: api_url.to_string(),
            ..Default::default()
        })
        .unwrap(),
        fixtures: fixtures(),
    }
}

/// Request bodies received by a [`MockPortal`] endpoint
#[derive(Debug, Clone, Default)]
pub struct Posted {
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Posted {
    pub fn push(&self, body: Value) {
        self.bodies.lock().unwrap().push(body);
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    /// String `field` of every body, in arrival order
    pub fn strings(&self, field: &str) -> Vec<String> {
        self.bodies()
            .iter()
            .filter_map(|body| body[field].as_str().map(str::to_string))
            .collect()
    }
}

/// The portal's seeding API, served by mockito
pub struct MockPortal {
    server: ServerGuard,
}

impl MockPortal {
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Expect `hits` POSTs to `/api/{path}` authorised with `token`. Each
    /// decoded body goes to `on_post`, then the reply is a success envelope
    /// wrapping `data`.
    pub async fn seed<F>(
        &mut self,
        path: &str,
        token: &str,
        hits: usize,
        data: Value,
        on_post: F,
    ) -> Mock
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let reply = json!({ "status": "success", "data": data }).to_string();
        self.server
            .mock("POST", format!("/api/{}", path).as_str())
            .match_header("authorization", format!("token {}", token).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |request: &Request| {
                let body = request
                    .body()
                    .ok()
                    .and_then(|bytes| serde_json::from_slice(bytes).ok());
                on_post(body.unwrap_or(Value::Null));
                reply.clone().into_bytes()
            })
            .expect(hits)
            .create_async()
            .await
    }

    /// Like [`MockPortal::seed`], recording every body into `posted`
    pub async fn record(
        &mut self,
        path: &str,
        token: &str,
        hits: usize,
        data: Value,
        posted: &Posted,
    ) -> Mock {
        let posted = posted.clone();
        self.seed(path, token, hits, data, move |body| posted.push(body))
            .await
    }
}
