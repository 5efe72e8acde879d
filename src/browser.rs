//! Headless Chrome session used to render event pages.
//!
//! The odds tables are filled in by JavaScript, so plain HTTP only gets an
//! empty shell. A session is opened once per run and closed explicitly.

use std::time::Duration;

use async_trait::async_trait;

use crate::FetchError;

/// Something that can turn a url into rendered html.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads `url` and returns its html once every selector in `wait_for`
    /// matches an element. Loading and waiting share one `timeout`, past which
    /// the result is `FetchError::Timeout`.
    async fn render(
        &self,
        url: &str,
        wait_for: &[&str],
        timeout: Duration,
    ) -> Result<String, FetchError>;
}

#[cfg(feature = "browser")]
mod session {
    use super::*;
    use anyhow::anyhow;
    use chromiumoxide::{
        Page,
        browser::{Browser, BrowserConfig},
    };
    use futures::StreamExt;
    use log::{debug, info, warn};
    use tokio::{
        sync::Mutex,
        task::JoinHandle,
        time::{Instant, sleep, timeout_at},
    };

    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    pub struct BrowserSession {
        browser: Mutex<Browser>,
        handler: JoinHandle<()>,
    }

    impl BrowserSession {
        pub async fn open(headless: bool) -> anyhow::Result<Self> {
            info!("Launching Chrome (headless: {})", headless);

            let mut builder = BrowserConfig::builder()
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--disable-extensions");
            if !headless {
                builder = builder.with_head();
            }
            let config = builder
                .build()
                .map_err(|e| anyhow!("failed to build browser config: {}", e))?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| anyhow!("failed to launch browser: {}", e))?;

            // The CDP connection only makes progress while its handler is polled.
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                browser: Mutex::new(browser),
                handler,
            })
        }

        pub async fn close(self) -> anyhow::Result<()> {
            let mut browser = self.browser.into_inner();
            let closed = browser.close().await;
            if let Err(e) = browser.wait().await {
                warn!("Browser process didn't exit cleanly: {}", e);
            }
            self.handler.abort();
            closed.map_err(|e| anyhow!("failed to close browser: {}", e))?;
            info!("Browser closed");
            Ok(())
        }
    }

    async fn wait_for_selectors(page: &Page, selectors: &[&str]) {
        for selector in selectors {
            while page.find_element(*selector).await.is_err() {
                sleep(POLL_INTERVAL).await;
            }
        }
    }

    fn browser_error(e: chromiumoxide::error::CdpError) -> FetchError {
        FetchError::Browser(e.to_string())
    }

    #[async_trait]
    impl PageRenderer for BrowserSession {
        async fn render(
            &self,
            url: &str,
            wait_for: &[&str],
            timeout: Duration,
        ) -> Result<String, FetchError> {
            debug!("Rendering {}", url);
            let deadline = Instant::now() + timeout;
            let page = {
                let browser = self.browser.lock().await;
                match timeout_at(deadline, browser.new_page(url)).await {
                    Ok(page) => page.map_err(browser_error)?,
                    Err(_) => return Err(FetchError::Timeout(timeout.as_secs())),
                }
            };

            let html = match timeout_at(deadline, wait_for_selectors(&page, wait_for)).await {
                Ok(()) => page.content().await.map_err(browser_error),
                Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
            };

            if let Err(e) = page.close().await {
                warn!("Failed to close tab for {}: {}", url, e);
            }
            html
        }
    }
}

#[cfg(feature = "browser")]
pub use session::BrowserSession;

/// Stand-in used when the crate is built without the `browser` feature.
#[cfg(not(feature = "browser"))]
pub struct BrowserSession {
    _private: (),
}

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn open(_headless: bool) -> anyhow::Result<Self> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }

    pub async fn close(self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageRenderer for BrowserSession {
    async fn render(
        &self,
        url: &str,
        _wait_for: &[&str],
        _timeout: Duration,
    ) -> Result<String, FetchError> {
        Err(FetchError::Browser(format!(
            "can't render {} without the browser feature",
            url
        )))
    }
}
