//! Browser session management.
//!
//! Each scrape identity ("superetka_parts", "superetka_vehicle") gets one
//! long-lived Chromium instance with its own profile directory. Concurrent
//! requests for the same identity share a single launch; a failed launch
//! leaves the slot empty so the next request can retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::etka::EtkaConfig;

/// How long a browser gets to shut down before we give up on it.
pub const TEARDOWN_TIMEOUT_SECS: u64 = 10;

/// Launches and tears down browser sessions. The Chromium implementation is
/// [`ChromiumFactory`]; tests substitute their own.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    async fn launch(&self, identity: &str) -> Result<Self::Session, ScrapeError>;

    async fn teardown(&self, session: &Self::Session);
}

/// Keyed store of live sessions with single-flight launch semantics.
pub struct SessionManager<F: SessionFactory> {
    factory: F,
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<F::Session>>>>>,
}

impl<F: SessionFactory> SessionManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared session for `identity`, launching it on first use.
    ///
    /// Callers that arrive while a launch is in flight wait for that launch
    /// instead of starting their own. An error is not cached: the slot stays
    /// empty and the next caller triggers a fresh launch.
    pub async fn acquire(&self, identity: &str) -> Result<Arc<F::Session>, ScrapeError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(identity.to_string()).or_default().clone()
        };

        cell.get_or_try_init(|| async {
            info!(identity, "launching browser session");
            self.factory.launch(identity).await.map(Arc::new)
        })
        .await
        .map(Arc::clone)
    }

    /// Tears down every live session and forgets them. Later acquisitions
    /// launch fresh browsers.
    pub async fn shutdown(&self) {
        let cells: Vec<(String, Arc<OnceCell<Arc<F::Session>>>)> = {
            let mut map = self.cells.lock().await;
            map.drain().collect()
        };

        for (identity, cell) in cells {
            if let Some(session) = cell.get() {
                debug!(identity = %identity, "closing browser session");
                self.factory.teardown(session).await;
            }
        }
    }
}

/// A running Chromium instance plus the task draining its event loop.
pub struct BrowserSession {
    identity: String,
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Opens a fresh tab on the shared browser.
    pub async fn new_page(&self) -> Result<Page, ScrapeError> {
        let browser = self.browser.lock().await;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::BrowserInit(format!("new page: {e}")))
    }

    /// Asks the browser to exit and waits for the process, bounded by
    /// [`TEARDOWN_TIMEOUT_SECS`].
    pub async fn close(&self) {
        let shutdown = async {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!(identity = %self.identity, "browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        };

        let deadline = Duration::from_secs(TEARDOWN_TIMEOUT_SECS);
        if tokio::time::timeout(deadline, shutdown).await.is_err() {
            warn!(
                identity = %self.identity,
                "browser did not exit within {}s, abandoning it", TEARDOWN_TIMEOUT_SECS
            );
        }
        self.handler.abort();
    }
}

/// Launches real Chromium sessions configured from [`EtkaConfig`].
pub struct ChromiumFactory {
    config: EtkaConfig,
}

impl ChromiumFactory {
    pub fn new(config: EtkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    type Session = BrowserSession;

    async fn launch(&self, identity: &str) -> Result<BrowserSession, ScrapeError> {
        let profile = self
            .config
            .profile_root
            .join(format!("tmp_profile_{identity}"));
        std::fs::create_dir_all(&profile)?;

        // A crashed browser leaves its single-instance lock behind, which
        // would make the next launch refuse to use the profile.
        let lock = profile.join("SingletonLock");
        if lock.exists() {
            info!("removing stale browser lock {}", lock.display());
            let _ = std::fs::remove_file(&lock);
        }

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&profile)
            .window_size(1280, 800)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--ignore-certificate-errors")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Ok(chrome) =
            std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH"))
        {
            builder = builder.chrome_executable(chrome);
        }
        let browser_config = builder
            .build()
            .map_err(|e| ScrapeError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::BrowserInit(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(identity, profile = %profile.display(), "browser session ready");
        Ok(BrowserSession {
            identity: identity.to_string(),
            browser: Mutex::new(browser),
            handler: handle,
        })
    }

    async fn teardown(&self, session: &BrowserSession) {
        session.close().await;
    }
}

/// Closes its page on drop so early error returns never leak tabs.
pub struct PageGuard {
    page: Page,
    closed: bool,
}

impl PageGuard {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Explicit close for the success path.
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            debug!("page close failed: {}", e);
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if !self.closed {
            let page = self.page.clone();
            tokio::spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct MockFactory {
        launches: Arc<AtomicUsize>,
        teardowns: Arc<AtomicUsize>,
        fail_next: Arc<AtomicUsize>,
    }

    struct MockSession {
        identity: String,
        serial: usize,
    }

    #[async_trait]
    impl SessionFactory for MockFactory {
        type Session = MockSession;

        async fn launch(&self, identity: &str) -> Result<MockSession, ScrapeError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let serial = self.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.load(Ordering::SeqCst) > serial {
                return Err(ScrapeError::BrowserInit("mock launch refused".to_string()));
            }
            Ok(MockSession {
                identity: identity.to_string(),
                serial,
            })
        }

        async fn teardown(&self, _session: &MockSession) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_concurrent_acquires_share_one_launch() {
        let factory = MockFactory::default();
        let manager = Arc::new(SessionManager::new(factory.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.acquire("superetka_parts").await
            }));
        }

        let mut serials = Vec::new();
        for handle in handles {
            let session = handle.await.unwrap().unwrap();
            serials.push(session.serial);
        }

        assert_eq!(factory.launches.load(Ordering::SeqCst), 1);
        assert!(serials.iter().all(|&s| s == serials[0]));
    }

    #[tokio::test]
    async fn test_failed_launch_is_retried() {
        let factory = MockFactory::default();
        factory.fail_next.store(1, Ordering::SeqCst);
        let manager = SessionManager::new(factory.clone());

        let first = manager.acquire("superetka_parts").await;
        assert!(matches!(first, Err(ScrapeError::BrowserInit(_))));

        let second = manager.acquire("superetka_parts").await.unwrap();
        assert_eq!(second.identity, "superetka_parts");
        assert_eq!(factory.launches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_identities_get_distinct_sessions() {
        let factory = MockFactory::default();
        let manager = SessionManager::new(factory.clone());

        let parts = manager.acquire("superetka_parts").await.unwrap();
        let vehicle = manager.acquire("superetka_vehicle").await.unwrap();

        assert_ne!(parts.serial, vehicle.serial);
        assert_eq!(parts.identity, "superetka_parts");
        assert_eq!(vehicle.identity, "superetka_vehicle");
        assert_eq!(factory.launches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything_and_allows_relaunch() {
        let factory = MockFactory::default();
        let manager = SessionManager::new(factory.clone());

        manager.acquire("superetka_parts").await.unwrap();
        manager.acquire("superetka_vehicle").await.unwrap();
        manager.shutdown().await;

        assert_eq!(factory.teardowns.load(Ordering::SeqCst), 2);

        manager.acquire("superetka_parts").await.unwrap();
        assert_eq!(factory.launches.load(Ordering::SeqCst), 3);
    }
}
