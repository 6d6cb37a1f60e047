use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use tracing::{info, warn};

use crate::capture::CaptureRecord;
use crate::challenge::{self, AssetProbe, ChallengeProbe};
use crate::config::RunConfig;
use crate::download;
use crate::error::{Error, Result};
use crate::intercept::Interceptor;
use crate::session::Session;

/// What one run produced. `audio_artifact` is `None` when the asset's source
/// attribute was empty or the authenticated fetch came back non-200.
#[derive(Debug)]
pub struct RunReport {
    pub captures: Vec<CaptureRecord>,
    pub audio_artifact: Option<PathBuf>,
    pub state_artifact: PathBuf,
}

/// Run the whole capture flow once. The drive sequence is bounded by the
/// overall run timeout; the session is closed on every exit path.
pub async fn run(config: RunConfig) -> Result<RunReport> {
    let mut session = Session::open(&config).await?;

    let outcome = match tokio::time::timeout(config.run_timeout, drive(&session, &config)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "run exceeded its overall bound of {:?}",
            config.run_timeout
        ))),
    };

    let close_result = session.close().await;
    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            // The drive error is the primary cause; a close failure on this
            // path must not displace it.
            if let Err(close_err) = close_result {
                warn!("session close failed after run error: {close_err}");
            }
            return Err(e);
        }
    };
    close_result?;
    Ok(report)
}

async fn drive(session: &Session, config: &RunConfig) -> Result<RunReport> {
    let page = session.page();

    // Attach before navigating so the earliest background calls are seen.
    let interceptor = Interceptor::attach(page, config).await?;

    page.goto(config.profile_url.as_str())
        .await
        .map_err(|e| Error::NavigationError(e.to_string()))?;
    page.reload()
        .await
        .map_err(|e| Error::NavigationError(e.to_string()))?;

    info!(delay = ?config.settle_delay, "waiting for background API traffic to settle");
    tokio::time::sleep(config.settle_delay).await;

    match challenge::await_challenge_control(
        page,
        &config.challenge_role,
        &config.challenge_name,
        config.challenge_timeout,
    )
    .await?
    {
        ChallengeProbe::Found => info!("challenge dialog opened"),
        ChallengeProbe::TimedOut => {
            warn!(path = %config.screenshot_path.display(), "capturing diagnostic screenshot");
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            // The timeout is the primary cause; a failed screenshot must not
            // mask it.
            if let Err(e) = page.save_screenshot(params, &config.screenshot_path).await {
                warn!("diagnostic screenshot failed: {e}");
            }
            return Err(Error::ChallengeNotFound(format!(
                "[{}] \"{}\" not visible within {:?}",
                config.challenge_role, config.challenge_name, config.challenge_timeout
            )));
        }
        ChallengeProbe::InteractionFailed(reason) => {
            return Err(Error::ChallengeInteraction(reason));
        }
    }

    let audio_artifact = match challenge::locate_audio_challenge(
        page,
        &config.audio_selector,
        config.audio_timeout,
    )
    .await?
    {
        AssetProbe::Found(url) => {
            info!(url, "audio challenge source located");
            let asset = download::fetch_authenticated(page, &url).await?;
            asset.persist(&config.audio_path)?
        }
        AssetProbe::TimedOut => {
            return Err(Error::Timeout(format!(
                "audio element {:?} never appeared within {:?}",
                config.audio_selector, config.audio_timeout
            )));
        }
        AssetProbe::AttributeEmpty => None,
    };

    // Every stage completed (possibly with an incomplete audio outcome), so
    // the session is worth resuming later.
    session.persist_state(&config.state_path).await?;

    let captures = interceptor.finish();
    info!(captures = captures.len(), "run complete");

    Ok(RunReport {
        captures,
        audio_artifact,
        state_artifact: config.state_path.clone(),
    })
}
