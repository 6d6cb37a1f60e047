use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::page::Page as CrPage;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Bytes fetched through the browser session. Only a 200 response is
/// considered a valid asset.
#[derive(Debug)]
pub struct FetchedAsset {
    pub status: i64,
    pub bytes: Vec<u8>,
}

impl FetchedAsset {
    /// Write the bytes verbatim to the fixed path, overwriting any previous
    /// run's artifact. A non-200 fetch is logged and produces nothing.
    pub fn persist(&self, path: &Path) -> Result<Option<PathBuf>> {
        if self.status != 200 {
            warn!(status = self.status, "download failed, no artifact written");
            return Ok(None);
        }
        std::fs::write(path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "audio asset saved");
        Ok(Some(path.to_path_buf()))
    }
}

/// Fetch a URL from inside the page so the session's cookies and tokens
/// apply. The body leaves the page base64-encoded; binary assets survive
/// the string hop intact.
pub async fn fetch_authenticated(page: &CrPage, url: &str) -> Result<FetchedAsset> {
    let url_js = serde_json::to_string(url)?;
    let js = format!(
        r#"(async () => {{
            const res = await fetch({url_js}, {{ credentials: 'include' }});
            const buf = await res.arrayBuffer();
            const bytes = new Uint8Array(buf);
            let bin = '';
            for (let i = 0; i < bytes.length; i++) bin += String.fromCharCode(bytes[i]);
            return JSON.stringify({{ status: res.status, body: btoa(bin) }});
        }})()"#
    );

    let result = page
        .evaluate(js)
        .await
        .map_err(|e| Error::JsError(e.to_string()))?;
    let raw: String = result
        .into_value()
        .map_err(|e| Error::JsError(e.to_string()))?;

    decode_fetch_result(&raw)
}

/// Parse the `{status, body}` JSON the in-page fetch hands back.
fn decode_fetch_result(raw: &str) -> Result<FetchedAsset> {
    #[derive(serde::Deserialize)]
    struct Transport {
        status: i64,
        body: String,
    }

    let transport: Transport = serde_json::from_str(raw)?;
    let bytes = BASE64
        .decode(transport.body.as_bytes())
        .map_err(|e| Error::JsError(format!("fetch body was not valid base64: {e}")))?;
    Ok(FetchedAsset {
        status: transport.status,
        bytes,
    })
}
