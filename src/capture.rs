use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// One intercepted API response, parsed and ready to persist.
/// Immutable once built; each payload becomes exactly one artifact.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapturedPayload {
    pub source_url: String,
    pub captured_at_epoch_millis: u64,
    pub item_count: Option<usize>,
    pub raw_json: Value,
}

/// Summary of a persisted capture, reported back to the orchestrator.
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub source_url: String,
    pub artifact: PathBuf,
    pub item_count: Option<usize>,
}

/// Milliseconds since the Unix epoch, used to key capture artifacts.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Parse a matched response body into a payload. A body that is not JSON
/// (204 No Content, truncated, etc.) is a local condition: log and skip.
pub fn parse_capture(source_url: &str, body: &str, millis: u64) -> Option<CapturedPayload> {
    let raw_json = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(url = source_url, "capture body is not JSON, skipping: {e}");
            return None;
        }
    };
    let item_count = raw_json
        .get("itemList")
        .and_then(Value::as_array)
        .map(Vec::len);
    Some(CapturedPayload {
        source_url: source_url.to_string(),
        captured_at_epoch_millis: millis,
        item_count,
        raw_json,
    })
}

/// Writes capture artifacts under one directory with collision-proof names.
/// Owned by the single listener task, so no locking is needed.
pub struct ArtifactSink {
    dir: PathBuf,
    last_stamp: u64,
    seq: u32,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_stamp: 0,
            seq: 0,
        }
    }

    /// `response_<millis>.json`, with a monotonic `_<n>` suffix when several
    /// captures share one millisecond stamp.
    fn artifact_name(&mut self, millis: u64) -> String {
        if millis == self.last_stamp {
            self.seq += 1;
            format!("response_{millis}_{}.json", self.seq)
        } else {
            self.last_stamp = millis;
            self.seq = 0;
            format!("response_{millis}.json")
        }
    }

    /// Persist the raw payload as pretty-printed UTF-8 JSON. serde_json does
    /// not escape non-ASCII, so emoji and CJK text survive verbatim.
    pub fn write(&mut self, payload: &CapturedPayload) -> Result<PathBuf> {
        let name = self.artifact_name(payload.captured_at_epoch_millis);
        let path = self.dir.join(name);
        let body = serde_json::to_string_pretty(&payload.raw_json)?;
        fs::write(&path, body)?;
        Ok(path)
    }
}
