//! Browser-backed tests. They launch a real Chromium and reach the network,
//! so they are ignored by default; run them with `cargo test -- --ignored`
//! on a machine with Chrome installed.

use std::time::Duration;

use tiktok_harvest::challenge::{self, AssetProbe, ChallengeProbe};
use tiktok_harvest::download;
use tiktok_harvest::intercept::Interceptor;
use tiktok_harvest::{Error, RunConfig, Session};

/// A page with a visible "Audio" control and a challenge dialog whose audio
/// element carries no src attribute.
const EMPTY_SRC_FIXTURE: &str = "data:text/html,\
<button%20aria-label=%22Audio%22>Audio</button>\
<div%20class=%22TUXModal%22><div%20class=%22captcha-verify-container%22>\
<audio></audio></div></div>";

fn test_config(dir: &std::path::Path) -> RunConfig {
    RunConfig {
        capture_dir: dir.to_path_buf(),
        screenshot_path: dir.join("error_debug.png"),
        audio_path: dir.join("captcha_audio.mp3"),
        state_path: dir.join("auth.json"),
        challenge_timeout: Duration::from_secs(1),
        audio_timeout: Duration::from_secs(1),
        ..RunConfig::default()
    }
}

#[tokio::test]
#[ignore]
async fn session_opens_persists_state_and_closes_idempotently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let mut session = Session::open(&config).await.expect("Failed to launch browser");
    session
        .page()
        .goto("https://example.com")
        .await
        .expect("Failed to navigate");

    session
        .persist_state(&config.state_path)
        .await
        .expect("Failed to persist state");
    let state = std::fs::read_to_string(&config.state_path).expect("state file missing");
    assert!(state.contains("cookies"));

    session.close().await.expect("Failed to close session");
    // Second close must be a no-op.
    session.close().await.expect("Close should be idempotent");
}

#[tokio::test]
#[ignore]
async fn non_json_matched_responses_produce_no_artifacts_and_no_abort() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    // Match every response from the page; the HTML bodies must all be skipped.
    config.endpoint_fragment = "example.com".into();

    let mut session = Session::open(&config).await.expect("Failed to launch browser");
    let interceptor = Interceptor::attach(session.page(), &config)
        .await
        .expect("Failed to attach interceptor");

    session
        .page()
        .goto("https://example.com")
        .await
        .expect("Failed to navigate");
    tokio::time::sleep(Duration::from_secs(2)).await;

    let captures = interceptor.finish();
    assert!(captures.is_empty(), "HTML bodies should never become artifacts");
    assert!(std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .all(|e| !e.file_name().to_string_lossy().starts_with("response_")));

    session.close().await.expect("Failed to close session");
}

#[tokio::test]
#[ignore]
async fn missing_challenge_control_times_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let mut session = Session::open(&config).await.expect("Failed to launch browser");
    session
        .page()
        .goto("https://example.com")
        .await
        .expect("Failed to navigate");

    let probe = challenge::await_challenge_control(
        session.page(),
        &config.challenge_role,
        &config.challenge_name,
        config.challenge_timeout,
    )
    .await
    .expect("Probe itself should not error");
    assert!(matches!(probe, ChallengeProbe::TimedOut));

    let asset = challenge::locate_audio_challenge(
        session.page(),
        &config.audio_selector,
        config.audio_timeout,
    )
    .await
    .expect("Probe itself should not error");
    assert!(matches!(asset, AssetProbe::TimedOut));

    session.close().await.expect("Failed to close session");
}

#[tokio::test]
#[ignore]
async fn run_aborts_with_screenshot_and_no_state_when_challenge_never_appears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.profile_url = "https://example.com".into();
    config.settle_delay = Duration::from_secs(1);

    let err = tiktok_harvest::run(config)
        .await
        .expect_err("run should abort when the control never appears");
    assert!(matches!(err, Error::ChallengeNotFound(_)), "got: {err}");

    let screenshot =
        std::fs::read(dir.path().join("error_debug.png")).expect("diagnostic screenshot missing");
    assert_eq!(&screenshot[0..4], &[0x89, 0x50, 0x4E, 0x47]);
    assert!(
        !dir.path().join("auth.json").exists(),
        "no session state may be written on an aborted run"
    );
    assert!(!dir.path().join("captcha_audio.mp3").exists());
}

#[tokio::test]
#[ignore]
async fn run_continues_without_audio_artifact_when_src_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.profile_url = EMPTY_SRC_FIXTURE.into();
    config.settle_delay = Duration::from_secs(1);

    let report = tiktok_harvest::run(config)
        .await
        .expect("an empty src attribute must not abort the run");
    assert_eq!(report.audio_artifact, None);
    assert!(!dir.path().join("captcha_audio.mp3").exists());
    assert!(
        dir.path().join("auth.json").exists(),
        "session state must still be persisted on the incomplete outcome"
    );
}

#[tokio::test]
#[ignore]
async fn authenticated_fetch_returns_page_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());

    let mut session = Session::open(&config).await.expect("Failed to launch browser");
    session
        .page()
        .goto("https://example.com")
        .await
        .expect("Failed to navigate");

    let asset = download::fetch_authenticated(session.page(), "https://example.com/")
        .await
        .expect("Fetch failed");
    assert_eq!(asset.status, 200);
    assert!(!asset.bytes.is_empty());

    let written = asset.persist(&config.audio_path).expect("Persist failed");
    let on_disk = std::fs::read(written.expect("200 should produce an artifact")).unwrap();
    assert_eq!(on_disk.len(), asset.bytes.len());

    session.close().await.expect("Failed to close session");
}
