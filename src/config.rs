use std::path::PathBuf;
use std::time::Duration;

/// The profile page whose background API traffic is captured.
pub const PROFILE_URL: &str = "https://www.tiktok.com/@yusmankusumaa";

/// URL fragment identifying the feed API responses worth capturing.
pub const ENDPOINT_FRAGMENT: &str = "api/post/item_list";

/// The user-agent string presented to the site (Chrome 120 on Windows 10).
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accessible role of the control that opens the audio challenge dialog.
pub const CHALLENGE_ROLE: &str = "button";

/// Accessible name of the control that opens the audio challenge dialog.
pub const CHALLENGE_NAME: &str = "Audio";

/// Selector scoped to the challenge dialog's embedded audio element.
pub const AUDIO_SELECTOR: &str = ".TUXModal .captcha-verify-container audio";

/// Everything a run needs: target, identity, timing, and artifact paths.
/// The defaults are the fixed production constants; fields are public so
/// tests can redirect artifact paths, but the binary exposes no flags.
pub struct RunConfig {
    pub profile_url: String,
    pub endpoint_fragment: String,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub challenge_role: String,
    pub challenge_name: String,
    pub audio_selector: String,
    /// Wait after reload so background API calls can land and be captured.
    pub settle_delay: Duration,
    /// Bound on waiting for the challenge control to become visible.
    pub challenge_timeout: Duration,
    /// Bound on waiting for the challenge dialog's audio element.
    pub audio_timeout: Duration,
    /// Bound on the whole drive sequence, independent of per-stage timeouts.
    pub run_timeout: Duration,
    /// Directory receiving `response_<epochMillis>.json` capture artifacts.
    pub capture_dir: PathBuf,
    /// Diagnostic screenshot written when the challenge control never appears.
    pub screenshot_path: PathBuf,
    /// Downloaded challenge audio, overwritten each run.
    pub audio_path: PathBuf,
    /// Serialized session cookies, written at the end of a successful run.
    pub state_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            profile_url: PROFILE_URL.into(),
            endpoint_fragment: ENDPOINT_FRAGMENT.into(),
            user_agent: DESKTOP_USER_AGENT.into(),
            viewport_width: 1920,
            viewport_height: 1080,
            headless: true,
            chrome_path: None,
            challenge_role: CHALLENGE_ROLE.into(),
            challenge_name: CHALLENGE_NAME.into(),
            audio_selector: AUDIO_SELECTOR.into(),
            settle_delay: Duration::from_secs(30),
            challenge_timeout: Duration::from_secs(5),
            audio_timeout: Duration::from_secs(10),
            run_timeout: Duration::from_secs(120),
            capture_dir: PathBuf::from("."),
            screenshot_path: PathBuf::from("error_debug.png"),
            audio_path: PathBuf::from("captcha_audio.mp3"),
            state_path: PathBuf::from("auth.json"),
        }
    }
}
