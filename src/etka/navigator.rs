//! Catalogue navigation state machine.
//!
//! One [`Navigator`] drives one page through the fixed UI walk: load the
//! catalogue, log in when asked, submit the VIN, get past the results modal,
//! then (for part lookups) pick the category menu entry and the listing row.
//! Steps that the site is known to flake on degrade with a warning instead of
//! failing the whole request; hard failures leave a diagnostic snapshot.

use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;

use super::matching;
use super::types::{CandidateRow, DetailCell, EtkaConfig};

/// Navigation retry settings.
const NAV_ATTEMPTS: u32 = 3;
const NAV_RETRY_BACKOFF_SECS: u64 = 3;

/// Per-step timeouts, in seconds.
const LOGIN_TIMEOUT_SECS: u64 = 30;
const VIN_INPUT_TIMEOUT_SECS: u64 = 20;
const MODAL_OPEN_TIMEOUT_SECS: u64 = 60;
const MODAL_SETTLE_SECS: u64 = 1;
const MODAL_CLOSE_TIMEOUT_SECS: u64 = 30;
const MENU_TIMEOUT_SECS: u64 = 60;
const MENU_SETTLE_SECS: u64 = 2;
const DETAILS_TIMEOUT_SECS: u64 = 60;
const VEHICLE_TABLE_TIMEOUT_SECS: u64 = 30;

/// Poll interval for visibility checks, in milliseconds.
const POLL_INTERVAL_MS: u64 = 500;

/// Selectors for the catalogue UI.
const LOGIN_USER_SELECTOR: &str = "input[name='lgn']";
const LOGIN_PASS_SELECTOR: &str = "input[name='pwd']";
const LOGIN_SUBMIT_SELECTOR: &str = "button[name='go']";
const LOGIN_ALERT_SELECTOR: &str = ".alert-danger";
const VIN_INPUT_SELECTOR: &str = "#vinSearch";
const VIN_SUBMIT_SELECTOR: &str = "#buttonVinSearch";
const MODAL_SELECTOR: &str = "div.modal-content.ui-draggable";
const MENU_ITEM_SELECTOR: &str = ".etka_newImg_mainTable li";
const LISTING_TABLE_SELECTOR: &str = "table.subGrTable";
const DETAIL_CELL_SELECTOR: &str = "table.detailsTable td.etkTd";
const VEHICLE_TABLE_SELECTOR: &str = "table.prTable0 tbody";

/// Normalized labels the air-conditioning menu entry appears under.
const MENU_LABELS: &[&str] = &["air cond system", "air condition"];

/// Stages of the UI walk, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NavState {
    Start,
    Navigated,
    Authenticated,
    VinSubmitted,
    ModalOpen,
    ModalClosed,
    CategorySelected,
    RowSelected,
    DetailsReady,
    Done,
    Failed,
}

impl NavState {
    /// The stage that follows this one. Terminal states map to themselves.
    pub fn next(self) -> NavState {
        match self {
            NavState::Start => NavState::Navigated,
            NavState::Navigated => NavState::Authenticated,
            NavState::Authenticated => NavState::VinSubmitted,
            NavState::VinSubmitted => NavState::ModalOpen,
            NavState::ModalOpen => NavState::ModalClosed,
            NavState::ModalClosed => NavState::CategorySelected,
            NavState::CategorySelected => NavState::RowSelected,
            NavState::RowSelected => NavState::DetailsReady,
            NavState::DetailsReady => NavState::Done,
            NavState::Done | NavState::Failed => self,
        }
    }
}

/// Drives a single page through the catalogue UI for one request.
pub struct Navigator<'a> {
    page: &'a Page,
    config: &'a EtkaConfig,
    vin: &'a str,
    category: Option<&'a str>,
    state: NavState,
}

impl<'a> Navigator<'a> {
    pub fn new(page: &'a Page, config: &'a EtkaConfig, vin: &'a str) -> Self {
        Self {
            page,
            config,
            vin,
            category: None,
            state: NavState::Start,
        }
    }

    /// Sets the part category for lookups that walk past the modal.
    pub fn with_category(mut self, category: &'a str) -> Self {
        self.category = Some(category);
        self
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Advances the state machine until `target` is reached.
    ///
    /// Soft failures (category or row not matched) are logged and navigation
    /// continues in degraded mode; the detail table may still hold usable
    /// data. Hard failures capture a snapshot and leave the machine failed.
    pub async fn run_until(&mut self, target: NavState) -> Result<(), ScrapeError> {
        while self.state < target {
            let next = self.state.next();
            if next == self.state {
                break;
            }
            match self.step(next).await {
                Ok(()) => {}
                Err(e) if e.is_soft() => {
                    warn!(state = ?next, "continuing degraded: {}", e);
                }
                Err(e) => {
                    self.state = NavState::Failed;
                    self.snapshot("error").await;
                    return Err(e);
                }
            }
            self.state = next;
            debug!(state = ?self.state, "navigation state");
        }
        Ok(())
    }

    /// Marks the walk finished after extraction.
    pub fn complete(&mut self) {
        if self.state != NavState::Failed {
            self.state = NavState::Done;
        }
    }

    async fn step(&mut self, next: NavState) -> Result<(), ScrapeError> {
        match next {
            NavState::Navigated => self.step_navigate().await,
            NavState::Authenticated => self.step_authenticate().await,
            NavState::VinSubmitted => self.step_submit_vin().await,
            NavState::ModalOpen => self.step_await_modal().await,
            NavState::ModalClosed => self.step_dismiss_modal().await,
            NavState::CategorySelected => self.step_select_category().await,
            NavState::RowSelected => self.step_select_row().await,
            NavState::DetailsReady => self.step_await_details().await,
            NavState::Start | NavState::Done | NavState::Failed => Ok(()),
        }
    }

    async fn step_navigate(&self) -> Result<(), ScrapeError> {
        info!("navigating to {}", self.config.base_url);
        let mut last_error = String::new();

        for attempt in 1..=NAV_ATTEMPTS {
            match self.page.goto(self.config.base_url.as_str()).await {
                Ok(_) => {
                    self.wait_ready().await;
                    return Ok(());
                }
                Err(e) => {
                    warn!("navigation attempt {}/{} failed: {}", attempt, NAV_ATTEMPTS, e);
                    last_error = e.to_string();
                    if attempt < NAV_ATTEMPTS {
                        sleep(Duration::from_secs(NAV_RETRY_BACKOFF_SECS)).await;
                    }
                }
            }
        }

        Err(ScrapeError::Navigation(format!(
            "failed to load {} after {} attempts: {}",
            self.config.base_url, NAV_ATTEMPTS, last_error
        )))
    }

    async fn step_authenticate(&self) -> Result<(), ScrapeError> {
        let form_check = format!(
            "document.querySelector({}) !== null",
            js_string(LOGIN_USER_SELECTOR)
        );
        if !self.eval_bool(&form_check).await? {
            info!("already authenticated");
            return Ok(());
        }

        info!("logging in as {}", self.config.username);
        self.page
            .find_element(LOGIN_USER_SELECTOR)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("login field: {e}")))?
            .click()
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?
            .type_str(&self.config.username)
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;

        self.page
            .find_element(LOGIN_PASS_SELECTOR)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("password field: {e}")))?
            .click()
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?
            .type_str(&self.config.password)
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;

        self.page
            .find_element(LOGIN_SUBMIT_SELECTOR)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("login button: {e}")))?
            .click()
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;

        let nav = tokio::time::timeout(
            Duration::from_secs(LOGIN_TIMEOUT_SECS),
            self.page.wait_for_navigation(),
        );
        match nav.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("login navigation event error: {}", e),
            Err(_) => warn!(
                "login navigation still pending after {}s, continuing",
                LOGIN_TIMEOUT_SECS
            ),
        }

        let banner_script = format!(
            r#"
            (() => {{
                const banner = document.querySelector({sel});
                if (!banner) return '';
                return (banner.textContent || '').trim() || 'login rejected';
            }})()
        "#,
            sel = js_string(LOGIN_ALERT_SELECTOR)
        );
        let banner = self.eval_string(&banner_script).await?;
        if !banner.is_empty() {
            return Err(ScrapeError::Authentication(banner));
        }

        info!("login accepted");
        Ok(())
    }

    async fn step_submit_vin(&self) -> Result<(), ScrapeError> {
        info!(vin = %self.vin, "submitting vin");
        if let Err(e) = self.enter_vin().await {
            self.snapshot("vin-input-error").await;
            return Err(e);
        }
        Ok(())
    }

    async fn enter_vin(&self) -> Result<(), ScrapeError> {
        self.wait_visible(VIN_INPUT_SELECTOR, VIN_INPUT_TIMEOUT_SECS, "vin search input")
            .await?;

        self.page
            .find_element(VIN_INPUT_SELECTOR)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("vin input: {e}")))?
            .click()
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?
            .type_str(self.vin)
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;

        self.page
            .find_element(VIN_SUBMIT_SELECTOR)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("vin search button: {e}")))?
            .click()
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;

        Ok(())
    }

    async fn step_await_modal(&self) -> Result<(), ScrapeError> {
        info!("waiting for vehicle modal");
        if let Err(e) = self
            .wait_visible(MODAL_SELECTOR, MODAL_OPEN_TIMEOUT_SECS, "vehicle modal")
            .await
        {
            self.snapshot("modal-error").await;
            return Err(e);
        }
        sleep(Duration::from_secs(MODAL_SETTLE_SECS)).await;
        Ok(())
    }

    async fn step_dismiss_modal(&self) -> Result<(), ScrapeError> {
        self.page
            .find_element("body")
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("document body: {e}")))?
            .press_key("Escape")
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;
        debug!("sent escape to dismiss modal");

        // Some pages keep the modal in the document while visually hidden.
        if !self.wait_hidden(MODAL_SELECTOR, MODAL_CLOSE_TIMEOUT_SECS).await {
            warn!(
                "vehicle modal still visible after {}s, continuing",
                MODAL_CLOSE_TIMEOUT_SECS
            );
        }
        Ok(())
    }

    async fn step_select_category(&self) -> Result<(), ScrapeError> {
        info!("waiting for category menu");
        if let Err(e) = self
            .wait_visible(MENU_ITEM_SELECTOR, MENU_TIMEOUT_SECS, "category menu")
            .await
        {
            self.snapshot("menu-error").await;
            return Err(e);
        }
        sleep(Duration::from_secs(MENU_SETTLE_SECS)).await;

        let labels = self.collect_menu_labels().await?;
        let matched = labels.iter().position(|label| {
            let label = matching::normalize(label);
            MENU_LABELS.iter().any(|keyword| label.contains(keyword))
        });

        let index = match matched {
            Some(index) => {
                info!("category menu matched entry {}", index);
                index
            }
            None => match self.config.category_fallback_index {
                Some(fallback) if labels.len() > fallback => {
                    warn!(
                        "no category menu entry matched, falling back to position {}",
                        fallback
                    );
                    fallback
                }
                _ => {
                    self.snapshot("ac-category").await;
                    return Err(ScrapeError::CategoryNotFound(
                        "air conditioning".to_string(),
                    ));
                }
            },
        };

        self.click_menu_item(index).await
    }

    async fn step_select_row(&self) -> Result<(), ScrapeError> {
        let category = self.category.unwrap_or_default();

        let scroll = format!(
            r#"
            (() => {{
                const table = document.querySelector({sel});
                if (table) table.scrollIntoView();
            }})()
        "#,
            sel = js_string(LISTING_TABLE_SELECTOR)
        );
        if let Err(e) = self.page.evaluate(scroll.as_str()).await {
            debug!("listing scroll failed: {}", e);
        }
        sleep(Duration::from_secs(1)).await;

        info!(category, "selecting listing row");
        let rows = self.collect_candidate_rows().await?;
        match matching::select_row(&rows, category) {
            Some(index) => {
                self.click_listing_row(index).await?;
                info!("clicked listing row {}", index);
                Ok(())
            }
            None => {
                self.snapshot("part-row").await;
                Err(ScrapeError::RowNotFound(category.to_string()))
            }
        }
    }

    async fn step_await_details(&self) -> Result<(), ScrapeError> {
        let keyword = self.category.unwrap_or_default().trim().to_lowercase();
        info!("waiting for detail table");

        let script = format!(
            r#"
            (() => {{
                const cells = document.querySelectorAll({sel});
                for (const cell of cells) {{
                    const text = (cell.textContent || '').trim().toLowerCase();
                    if (text.includes({keyword})) return true;
                }}
                return false;
            }})()
        "#,
            sel = js_string(DETAIL_CELL_SELECTOR),
            keyword = js_string(&keyword)
        );

        let start = Instant::now();
        let timeout = Duration::from_secs(DETAILS_TIMEOUT_SECS);
        while start.elapsed() < timeout {
            match self.eval_bool(&script).await {
                Ok(true) => {
                    debug!("detail table ready after {:?}", start.elapsed());
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!("detail table poll error: {}", e),
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        warn!(
            "detail table did not reference '{}' within {}s, extracting anyway",
            keyword, DETAILS_TIMEOUT_SECS
        );
        self.snapshot("part-details-timeout").await;
        Ok(())
    }

    /// Reads every detail cell with its identifier attributes and rendered
    /// text color (as a hex string).
    pub async fn collect_detail_cells(&self) -> Result<Vec<DetailCell>, ScrapeError> {
        let script = format!(
            r#"
            (() => {{
                const toHex = (value) => {{
                    const parts = (value || '').match(/\d+/g);
                    if (!parts || parts.length < 3) return '';
                    return '#' + parts.slice(0, 3)
                        .map((v) => parseInt(v, 10).toString(16).padStart(2, '0'))
                        .join('');
                }};
                const cells = Array.from(document.querySelectorAll({sel}));
                return JSON.stringify(cells.map((cell) => ({{
                    text: (cell.textContent || '').trim(),
                    num: cell.getAttribute('num'),
                    numn: cell.getAttribute('numn'),
                    title: cell.getAttribute('title'),
                    color: toHex(window.getComputedStyle(cell).color)
                }})));
            }})()
        "#,
            sel = js_string(DETAIL_CELL_SELECTOR)
        );
        self.eval_json(&script).await
    }

    /// Reads the two-column vehicle summary table. Works on the hidden modal
    /// because it goes through `textContent`, not rendered text.
    pub async fn collect_vehicle_pairs(&self) -> Result<Vec<(String, String)>, ScrapeError> {
        if !self.wait_present(VEHICLE_TABLE_SELECTOR, VEHICLE_TABLE_TIMEOUT_SECS).await {
            warn!(
                "vehicle summary table not found within {}s",
                VEHICLE_TABLE_TIMEOUT_SECS
            );
            return Ok(Vec::new());
        }
        sleep(Duration::from_secs(1)).await;

        let script = format!(
            r#"
            (() => {{
                const body = document.querySelector({sel});
                if (!body) return JSON.stringify([]);
                const pairs = [];
                for (const row of body.querySelectorAll('tr')) {{
                    const cells = row.querySelectorAll('td');
                    if (cells.length !== 2) continue;
                    const key = (cells[0].textContent || '').trim();
                    const value = (cells[1].textContent || '').trim();
                    if (key) pairs.push([key, value]);
                }}
                return JSON.stringify(pairs);
            }})()
        "#,
            sel = js_string(VEHICLE_TABLE_SELECTOR)
        );
        self.eval_json(&script).await
    }

    async fn collect_menu_labels(&self) -> Result<Vec<String>, ScrapeError> {
        let script = format!(
            r#"
            (() => {{
                const items = Array.from(document.querySelectorAll({sel}));
                return JSON.stringify(items.map((el) => (el.innerText || el.textContent || '').trim()));
            }})()
        "#,
            sel = js_string(MENU_ITEM_SELECTOR)
        );
        self.eval_json(&script).await
    }

    async fn collect_candidate_rows(&self) -> Result<Vec<CandidateRow>, ScrapeError> {
        let script = format!(
            r#"
            (() => {{
                const toHex = (value) => {{
                    const parts = (value || '').match(/\d+/g);
                    if (!parts || parts.length < 3) return '';
                    return '#' + parts.slice(0, 3)
                        .map((v) => parseInt(v, 10).toString(16).padStart(2, '0'))
                        .join('');
                }};
                const table = document.querySelector({sel});
                if (!table) return JSON.stringify([]);
                const rows = Array.from(table.querySelectorAll('tr'));
                return JSON.stringify(rows.map((row, index) => ({{
                    index,
                    text: (row.textContent || '').trim(),
                    colors: Array.from(row.querySelectorAll('td'))
                        .map((td) => toHex(window.getComputedStyle(td).color))
                }})));
            }})()
        "#,
            sel = js_string(LISTING_TABLE_SELECTOR)
        );
        self.eval_json(&script).await
    }

    async fn click_menu_item(&self, index: usize) -> Result<(), ScrapeError> {
        let script = format!(
            r#"
            (() => {{
                const items = document.querySelectorAll({sel});
                if (items.length <= {index}) return false;
                items[{index}].click();
                return true;
            }})()
        "#,
            sel = js_string(MENU_ITEM_SELECTOR),
            index = index
        );
        if self.eval_bool(&script).await? {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(format!(
                "category menu entry {index}"
            )))
        }
    }

    async fn click_listing_row(&self, index: usize) -> Result<(), ScrapeError> {
        let script = format!(
            r#"
            (() => {{
                const table = document.querySelector({sel});
                if (!table) return false;
                const rows = table.querySelectorAll('tr');
                if (rows.length <= {index}) return false;
                rows[{index}].click();
                return true;
            }})()
        "#,
            sel = js_string(LISTING_TABLE_SELECTOR),
            index = index
        );
        if self.eval_bool(&script).await? {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(format!("listing row {index}")))
        }
    }

    /// Polls `document.readyState` like the site's own loading spinner does.
    async fn wait_ready(&self) {
        for i in 0..30 {
            match self.page.evaluate("document.readyState").await {
                Ok(result) => {
                    let state = result.into_value::<String>().unwrap_or_default();
                    if state == "complete" {
                        debug!("page load complete after {}s", i + 1);
                        return;
                    }
                    if i % 5 == 0 {
                        debug!("waiting for page load... ({}/30) state={}", i + 1, state);
                    }
                }
                Err(e) => debug!("ready state check failed: {}", e),
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    async fn wait_visible(
        &self,
        selector: &str,
        timeout_secs: u64,
        what: &str,
    ) -> Result<(), ScrapeError> {
        let script = visibility_script(selector);
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        while start.elapsed() < timeout {
            match self.eval_bool(&script).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!("visibility poll error for {}: {}", what, e),
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        Err(ScrapeError::ElementNotFound(format!(
            "{what} not visible after {timeout_secs}s"
        )))
    }

    async fn wait_hidden(&self, selector: &str, timeout_secs: u64) -> bool {
        let script = visibility_script(selector);
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        while start.elapsed() < timeout {
            match self.eval_bool(&script).await {
                Ok(false) => return true,
                Ok(true) => {}
                Err(e) => debug!("hidden poll error: {}", e),
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
        false
    }

    async fn wait_present(&self, selector: &str, timeout_secs: u64) -> bool {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        while start.elapsed() < timeout {
            match self.eval_bool(&script).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!("presence poll error: {}", e),
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
        false
    }

    async fn eval_bool(&self, script: &str) -> Result<bool, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    async fn eval_string(&self, script: &str) -> Result<String, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::JavaScript(e.to_string()))?;
        Ok(result.into_value::<String>().unwrap_or_default())
    }

    /// Runs a script that returns `JSON.stringify(...)` output and parses it.
    async fn eval_json<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScrapeError> {
        let raw = self.eval_string(script).await?;
        serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::JavaScript(format!("page payload: {e}")))
    }

    /// Captures a full-page snapshot tagged with the failure kind. Side
    /// effect only; never part of the success contract.
    async fn snapshot(&self, label: &str) {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = match self.page.screenshot(params).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("snapshot '{}' failed: {}", label, e);
                return;
            }
        };

        let path = self
            .config
            .snapshot_dir
            .join(format!("{}-{}.png", label, Utc::now().timestamp_millis()));
        match std::fs::write(&path, &bytes) {
            Ok(()) => info!("saved diagnostic snapshot {}", path.display()),
            Err(e) => warn!("failed to write snapshot {}: {}", path.display(), e),
        }

        if self.config.debug {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            debug!("{} snapshot: data:image/png;base64,{}", label, encoded);
        }
    }
}

fn visibility_script(selector: &str) -> String {
    format!(
        r#"
        (() => {{
            const elem = document.querySelector({sel});
            if (!elem) return false;
            const style = window.getComputedStyle(elem);
            const rect = elem.getBoundingClientRect();
            return style.display !== 'none' &&
                   style.visibility !== 'hidden' &&
                   style.opacity !== '0' &&
                   (rect.width > 0 || rect.height > 0);
        }})()
    "#,
        sel = js_string(selector)
    )
}

/// Quotes a value as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "''".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_progress_in_order() {
        let mut state = NavState::Start;
        let expected = [
            NavState::Navigated,
            NavState::Authenticated,
            NavState::VinSubmitted,
            NavState::ModalOpen,
            NavState::ModalClosed,
            NavState::CategorySelected,
            NavState::RowSelected,
            NavState::DetailsReady,
            NavState::Done,
        ];
        for target in expected {
            state = state.next();
            assert_eq!(state, target);
        }
    }

    #[test]
    fn test_terminal_states_do_not_advance() {
        assert_eq!(NavState::Done.next(), NavState::Done);
        assert_eq!(NavState::Failed.next(), NavState::Failed);
    }

    #[test]
    fn test_state_ordering_matches_walk_order() {
        assert!(NavState::Start < NavState::ModalClosed);
        assert!(NavState::ModalClosed < NavState::DetailsReady);
        assert!(NavState::DetailsReady < NavState::Done);
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string("with \"quotes\""), r#""with \"quotes\"""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_menu_labels_cover_reference_layout() {
        for label in ["Air cond. system", "Air conditioning", "Air condition"] {
            let normalized = matching::normalize(label);
            assert!(MENU_LABELS.iter().any(|k| normalized.contains(k)), "{label}");
        }
        let engine = matching::normalize("Engine electrics");
        assert!(!MENU_LABELS.iter().any(|k| engine.contains(k)));
    }
}
