use std::path::Path;

use chromiumoxide::browser::{Browser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::Cookie;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page as CrPage;
use futures::StreamExt;
use tracing::{debug, info};

use crate::capture::epoch_millis;
use crate::config::RunConfig;
use crate::error::{Error, Result};

/// Chrome flags that improve performance without affecting functionality.
const PERF_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "metrics-recording-only",
    "mute-audio",
    "no-default-browser-check",
    "disable-client-side-phishing-detection",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
];

/// Serialized authentication material written at the end of a successful run.
/// A future run can replay these cookies to resume as the same logical client.
#[derive(Debug, serde::Serialize)]
struct SessionState {
    saved_at_epoch_millis: u64,
    cookies: Vec<Cookie>,
}

/// Owns the browser process and the single page for one run.
/// Threaded explicitly through every stage; closed on every exit path.
pub struct Session {
    browser: Browser,
    page: CrPage,
    closed: bool,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Launch exactly one browser with the fixed desktop identity and open
    /// one page at about:blank, so the interceptor can attach before any
    /// navigation happens.
    pub async fn open(config: &RunConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        // chromiumoxide adds the `--` prefix, so the key must not include it.
        builder = builder.arg(("user-agent", config.user_agent.as_str()));

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder
            .build()
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(cr_config)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;

        info!(
            viewport = format!("{}x{}", config.viewport_width, config.viewport_height),
            "browser session open"
        );

        Ok(Self {
            browser,
            page,
            closed: false,
            _handler_task: handler_task,
        })
    }

    /// The single page this session drives.
    pub fn page(&self) -> &CrPage {
        &self.page
    }

    /// Serialize the session's cookies to a pretty-JSON state file.
    pub async fn persist_state(&self, path: &Path) -> Result<()> {
        let cookies = self.page.get_cookies().await?;
        let state = SessionState {
            saved_at_epoch_millis: epoch_millis(),
            cookies,
        };
        std::fs::write(path, serde_json::to_string_pretty(&state)?)?;
        info!(path = %path.display(), "session state persisted");
        Ok(())
    }

    /// Close the browser and release the handler task. Idempotent: the
    /// orchestrator calls this on every exit path.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            debug!("browser process did not exit cleanly: {e}");
        }
        self._handler_task.abort();
        debug!("browser session closed");
        Ok(())
    }
}
