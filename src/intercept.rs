use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::page::Page as CrPage;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capture::{epoch_millis, parse_capture, ArtifactSink, CaptureRecord};
use crate::config::RunConfig;
use crate::error::Result;

/// Listens for matching API responses on its own task while the orchestrator
/// proceeds on its own schedule. The two sides cooperate over a channel: the
/// listener persists artifacts as responses arrive and pushes a record per
/// capture; `finish` drains whatever accumulated.
pub struct Interceptor {
    task: tokio::task::JoinHandle<()>,
    records: mpsc::UnboundedReceiver<CaptureRecord>,
}

impl Interceptor {
    /// Subscribe to response events. Must be called before navigation so the
    /// earliest background API calls are not missed.
    pub async fn attach(page: &CrPage, config: &RunConfig) -> Result<Self> {
        let mut events = page.event_listener::<EventResponseReceived>().await?;
        let (tx, records) = mpsc::unbounded_channel();

        let page = page.clone();
        let fragment = config.endpoint_fragment.clone();
        let capture_dir = config.capture_dir.clone();

        let task = tokio::spawn(async move {
            let mut sink = ArtifactSink::new(capture_dir);
            while let Some(event) = events.next().await {
                if !event.response.url.contains(&fragment) {
                    continue;
                }
                debug!(url = %event.response.url, "matched endpoint response");
                if let Some(record) = handle_match(&page, &event, &mut sink).await {
                    // Receiver dropped means the run is over; keep draining
                    // events quietly until the task is aborted.
                    let _ = tx.send(record);
                }
            }
        });

        Ok(Self { task, records })
    }

    /// Stop listening and return every capture recorded so far.
    pub fn finish(mut self) -> Vec<CaptureRecord> {
        self.task.abort();
        let mut captures = Vec::new();
        while let Ok(record) = self.records.try_recv() {
            captures.push(record);
        }
        captures
    }
}

/// Fetch, parse, and persist one matched response. Every failure in here is
/// local to the capture: log it, produce nothing, and let the run continue.
async fn handle_match(
    page: &CrPage,
    event: &EventResponseReceived,
    sink: &mut ArtifactSink,
) -> Option<CaptureRecord> {
    let body_params = GetResponseBodyParams::new(event.request_id.clone());
    let returns = match page.execute(body_params).await {
        Ok(response) => response.result,
        Err(e) => {
            debug!(url = %event.response.url, "response body unavailable, skipping: {e}");
            return None;
        }
    };

    let body = if returns.base64_encoded {
        match BASE64.decode(returns.body.as_bytes()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(url = %event.response.url, "base64 body decode failed, skipping: {e}");
                return None;
            }
        }
    } else {
        returns.body
    };

    let millis = epoch_millis();
    let payload = parse_capture(&event.response.url, &body, millis)?;

    match sink.write(&payload) {
        Ok(artifact) => {
            info!(
                artifact = %artifact.display(),
                items = ?payload.item_count,
                "capture persisted"
            );
            Some(CaptureRecord {
                source_url: payload.source_url,
                artifact,
                item_count: payload.item_count,
            })
        }
        Err(e) => {
            warn!(url = %payload.source_url, "failed to persist capture: {e}");
            None
        }
    }
}
