use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use mz_core::{ApiConfig, Error, JsonTransport, Result};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// `reqwest` backed transport.
///
/// Bodies are gunzipped when the response says so or when they start with
/// the gzip magic bytes, because the service does not always label them.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT_ENCODING, "gzip")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let gzip_header = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("gzip"))
            .unwrap_or(false);
        let bytes = response.bytes().await?;

        let text = decode_body(&bytes, gzip_header)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Gunzips (when needed) and decodes a response body, replacing non-breaking
/// spaces with plain ones.
pub fn decode_body(bytes: &[u8], gzip_header: bool) -> Result<String> {
    let text = if gzip_header || bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(|e| Error::Decode(format!("Failed to decompress body: {}", e)))?;
        text
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Decode(format!("Body is not UTF-8: {}", e)))?
    };
    Ok(text.replace('\u{a0}', " "))
}
