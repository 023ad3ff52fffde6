//! Uploads one-shot results to a collector URL.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Payload<'a> {
    address: &'a str,
    private_key: &'a str,
}

/// How an upload went. Uploads never fail the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Accepted,
    /// Server answered with something other than 200
    Rejected(u16),
    /// Request never got an answer
    Unreachable,
}

pub struct Uploader {
    client: Client,
    url: String,
}

impl Uploader {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    /// POSTs `{"address": .., "private_key": ..}` as JSON.
    pub fn upload(&self, address: &str, private_key: &str) -> UploadStatus {
        let payload = Payload {
            address,
            private_key,
        };

        match self.client.post(&self.url).json(&payload).send() {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!(url = %self.url, address, "result uploaded");
                UploadStatus::Accepted
            }
            Ok(resp) => {
                tracing::warn!(url = %self.url, status = %resp.status(), "upload rejected");
                UploadStatus::Rejected(resp.status().as_u16())
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "upload failed");
                UploadStatus::Unreachable
            }
        }
    }
}
