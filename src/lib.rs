pub mod capture;
pub mod challenge;
pub mod config;
pub mod download;
pub mod error;
pub mod intercept;
pub mod orchestrator;
pub mod session;

pub use capture::{CaptureRecord, CapturedPayload};
pub use challenge::{AssetProbe, ChallengeProbe};
pub use config::RunConfig;
pub use error::{Error, Result};
pub use orchestrator::{run, RunReport};
pub use session::Session;
