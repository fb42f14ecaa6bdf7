use std::sync::Arc;

use reqwest::Response;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::common::{Message, NewMessage};
use crate::config::BackendConfig;

use super::error::BackendError;

static APIKEY_HEADER: HeaderName = HeaderName::from_static("apikey");
static PREFER_HEADER: HeaderName = HeaderName::from_static("prefer");

/// Shared handle to the hosted backend.
///
/// Built once from a validated [`BackendConfig`] and cloned into every task
/// that needs it; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    config: Arc<BackendConfig>,
    http: reqwest::Client,
}

impl BackendHandle {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(APIKEY_HEADER.clone(), HeaderValue::from_str(config.anon_key())?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.anon_key()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Read every row of `table`, oldest first.
    ///
    /// Rows that do not decode as [`Message`] are logged and skipped.
    pub async fn fetch_messages(&self, table: &str) -> Result<Vec<Message>, BackendError> {
        let url = self.config.table_url(table)?;
        let response = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", "timestamp.asc")])
            .send()
            .await?;

        let rows: Vec<Value> = ensure_success(response).await?.json().await?;
        Ok(decode_rows(rows))
    }

    /// Insert one row. The backend assigns the `id`.
    pub async fn insert_message(
        &self,
        table: &str,
        message: &NewMessage,
    ) -> Result<(), BackendError> {
        let url = self.config.table_url(table)?;
        let response = self
            .http
            .post(url)
            .header(&PREFER_HEADER, "return=minimal")
            .json(&[message])
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

fn decode_rows(rows: Vec<Value>) -> Vec<Message> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Message>(row) {
            Ok(message) => Some(message),
            Err(err) => {
                log::warn!("Skipping undecodable message row: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "handle_test.rs"]
mod tests;
