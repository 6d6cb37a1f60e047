use std::time::{Duration, Instant};

use chromiumoxide::page::Page as CrPage;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Outcome of waiting for the challenge control. The orchestrator branches
/// on this deliberately instead of unwinding through an error.
#[derive(Debug)]
pub enum ChallengeProbe {
    /// Control became visible and the click that opens the dialog landed.
    Found,
    /// Control never became visible within the timeout.
    TimedOut,
    /// Control was visible but interacting with it failed.
    InteractionFailed(String),
}

/// Outcome of locating the challenge dialog's audio element.
#[derive(Debug)]
pub enum AssetProbe {
    /// Audio element present with a non-empty source URL.
    Found(String),
    /// Audio element never appeared within the timeout.
    TimedOut,
    /// Audio element present but its src attribute is empty or absent.
    AttributeEmpty,
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Wait for an interactive control matching the accessible role and name to
/// become visible, then click it to open the challenge dialog.
pub async fn await_challenge_control(
    page: &CrPage,
    role: &str,
    name: &str,
    timeout: Duration,
) -> Result<ChallengeProbe> {
    let deadline = Instant::now() + timeout;

    loop {
        if evaluate_bool(page, &probe_js(role, name)?).await? {
            break;
        }
        if Instant::now() >= deadline {
            debug!(role, name, "challenge control never became visible");
            return Ok(ChallengeProbe::TimedOut);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    match evaluate_bool(page, &click_js(role, name)?).await {
        Ok(true) => Ok(ChallengeProbe::Found),
        Ok(false) => Ok(ChallengeProbe::InteractionFailed(format!(
            "control [{role}] \"{name}\" disappeared before it could be clicked"
        ))),
        Err(e) => Ok(ChallengeProbe::InteractionFailed(e.to_string())),
    }
}

/// Wait for the challenge dialog's audio element and read its source URL.
pub async fn locate_audio_challenge(
    page: &CrPage,
    selector: &str,
    timeout: Duration,
) -> Result<AssetProbe> {
    let deadline = Instant::now() + timeout;

    let element = loop {
        match page.find_element(selector).await {
            Ok(el) => break el,
            Err(_) if Instant::now() < deadline => {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(_) => {
                debug!(selector, "audio element never appeared");
                return Ok(AssetProbe::TimedOut);
            }
        }
    };

    match element.attribute("src").await? {
        Some(src) if !src.is_empty() => Ok(AssetProbe::Found(src)),
        _ => {
            warn!(selector, "audio element found, but its src attribute is empty");
            Ok(AssetProbe::AttributeEmpty)
        }
    }
}

async fn evaluate_bool(page: &CrPage, js: &str) -> Result<bool> {
    let result = page
        .evaluate(js)
        .await
        .map_err(|e| Error::JsError(e.to_string()))?;
    result
        .into_value::<bool>()
        .map_err(|e| Error::JsError(e.to_string()))
}

/// JS that reports whether a visible control matching the role and
/// accessible name exists. Visibility means rendered with a non-empty box,
/// matching what the accessibility tree would expose.
fn probe_js(role: &str, name: &str) -> Result<String> {
    Ok(format!(
        r#"
        (() => {{
            const el = {finder};
            return !!el;
        }})()
        "#,
        finder = finder_js(role, name)?
    ))
}

/// JS that clicks the matching control, reporting whether it was still there.
fn click_js(role: &str, name: &str) -> Result<String> {
    Ok(format!(
        r#"
        (() => {{
            const el = {finder};
            if (!el) return false;
            el.click();
            return true;
        }})()
        "#,
        finder = finder_js(role, name)?
    ))
}

fn finder_js(role: &str, name: &str) -> Result<String> {
    let role_js = serde_json::to_string(role)?;
    let name_js = serde_json::to_string(name)?;
    Ok(format!(
        r#"Array.from(document.querySelectorAll({role_js} + ', [role=' + {role_js} + ']')).find(e => {{
                const label = (e.getAttribute('aria-label') || e.innerText || '').trim();
                if (label !== {name_js}) return false;
                const style = window.getComputedStyle(e);
                if (style.display === 'none' || style.visibility === 'hidden') return false;
                const rect = e.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})"#
    ))
}
