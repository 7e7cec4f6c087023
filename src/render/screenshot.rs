//! Screenshot capture using headless Chrome/Chromium.
//!
//! Every call launches its own browser with a throw-away profile directory and
//! shuts it down before returning, whatever the outcome.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{validate_target, RenderBackend, RenderKind, RenderViewport};
use crate::error::ThumbnailError;

/// Default timeout for one whole render call in seconds.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

/// The network counts as idle after this long without request activity.
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Give up waiting for idle after this long and capture anyway.
const NETWORK_IDLE_MAX_WAIT: Duration = Duration::from_secs(10);

/// How long a closed browser gets to exit before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Render backend configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Bound for launch, load, idle wait and capture together.
    pub timeout: Duration,
    /// Path to Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
    /// Whether rendering is enabled. A disabled renderer fails every call.
    pub enabled: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            chrome_path: None,
            enabled: true,
        }
    }
}

impl From<&crate::config::Config> for RenderConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            timeout: config.render_timeout,
            chrome_path: config.chrome_path.clone(),
            enabled: config.render_enabled,
        }
    }
}

/// Aborts the CDP handler task when dropped.
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Process-per-call Chromium renderer.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    config: RenderConfig,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Check if rendering is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn launch(
        &self,
        viewport: RenderViewport,
        profile_dir: &Path,
    ) -> Result<(Browser, HandlerTask), ThumbnailError> {
        let mut config_builder = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(Viewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: viewport.width >= viewport.height,
                has_touch: false,
            })
            .request_timeout(self.config.timeout)
            .user_data_dir(profile_dir)
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if let Some(ref chrome_path) = self.config.chrome_path {
            config_builder = config_builder.chrome_executable(chrome_path);
        }

        let browser_config = config_builder
            .build()
            .map_err(|e| ThumbnailError::render(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ThumbnailError::render(format!("failed to launch browser: {e}")))?;

        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        Ok((browser, HandlerTask(task)))
    }
}

#[async_trait]
impl RenderBackend for ChromiumRenderer {
    async fn render_first_view(
        &self,
        url: &str,
        kind: RenderKind,
        viewport: RenderViewport,
    ) -> Result<Vec<u8>, ThumbnailError> {
        if !self.config.enabled {
            return Err(ThumbnailError::render("rendering is disabled"));
        }
        let target = validate_target(url)?;

        let profile_dir = tempfile::Builder::new()
            .prefix("render-profile-")
            .tempdir()
            .map_err(|e| ThumbnailError::render(format!("failed to create profile dir: {e}")))?;

        debug!(url = %target, ?kind, "Launching browser for render");

        // Launch and capture share one deadline
        let deadline = Instant::now() + self.config.timeout;

        let launched =
            tokio::time::timeout_at(deadline, self.launch(viewport, profile_dir.path())).await;
        let (mut browser, handler_task) = match launched {
            Ok(result) => result?,
            Err(_) => return Err(ThumbnailError::render("browser launch timed out")),
        };

        let outcome =
            tokio::time::timeout_at(deadline, capture(&browser, target.as_str(), kind)).await;

        shutdown(&mut browser).await;
        drop(handler_task);
        drop(browser);
        drop(profile_dir);

        match outcome {
            Ok(Ok(png)) => {
                info!(url = %target, size = png.len(), "Render captured");
                Ok(png)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ThumbnailError::render(format!(
                "render of {target} timed out after {:?}",
                self.config.timeout
            ))),
        }
    }
}

async fn capture(browser: &Browser, url: &str, kind: RenderKind) -> Result<Vec<u8>, ThumbnailError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to create page: {e}")))?;

    // Listeners go in before navigation so no request is missed
    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to watch network: {e}")))?;
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to watch network: {e}")))?;
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to watch network: {e}")))?;

    page.goto(url)
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to load {url}: {e}")))?;

    let started = started.map(|e| e.request_id.inner().clone());
    let settled = futures_util::stream::select(
        finished.map(|e| e.request_id.inner().clone()),
        failed.map(|e| e.request_id.inner().clone()),
    );

    if tokio::time::timeout(
        NETWORK_IDLE_MAX_WAIT,
        wait_for_network_idle(started, settled, NETWORK_IDLE_WINDOW),
    )
    .await
    .is_err()
    {
        debug!(url = %url, "Network never went idle, capturing anyway");
    }

    tokio::time::sleep(kind.settle_delay()).await;

    let screenshot_params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(false)
        .build();

    let png_data = page
        .screenshot(screenshot_params)
        .await
        .map_err(|e| ThumbnailError::render(format!("failed to capture screenshot: {e}")))?;

    if let Err(e) = page.close().await {
        debug!("Failed to close page: {e}");
    }

    Ok(png_data)
}

/// Resolve once no request has been in flight for a whole `window`.
///
/// `started` yields the id of every request sent; `settled` the id of every
/// request that finished or failed. Any activity restarts the window.
async fn wait_for_network_idle<S, T>(started: S, settled: T, window: Duration)
where
    S: Stream<Item = String>,
    T: Stream<Item = String>,
{
    tokio::pin!(started, settled);
    let mut in_flight: HashSet<String> = HashSet::new();

    loop {
        let quiet = tokio::time::sleep(window);
        tokio::select! {
            Some(id) = started.next() => {
                in_flight.insert(id);
            }
            Some(id) = settled.next() => {
                in_flight.remove(&id);
            }
            () = quiet => {
                if in_flight.is_empty() {
                    return;
                }
            }
        }
    }
}

async fn shutdown(browser: &mut Browser) {
    if let Err(e) = browser.close().await {
        debug!("Browser close command failed: {e}");
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, browser.wait()).await {
        Ok(Ok(_)) => debug!("Browser exited"),
        Ok(Err(e)) => warn!("Failed waiting for browser exit: {e}"),
        Err(_) => {
            warn!("Browser did not exit in time, killing");
            if let Some(Err(e)) = browser.kill().await {
                warn!("Failed to kill browser: {e}");
            }
        }
    }
}
