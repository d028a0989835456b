use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};

use super::{MultipartBody, Transport, TransportError};
use crate::models::ErrorBody;

/// Transport backed by a reqwest client talking to the asset API.
pub struct HttpTransport {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: token.map(|s| s.to_string()),
        })
    }

    fn url(&self, endpoint: &str, query: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if query.is_empty() {
            format!("{}/{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}?{query}", self.base_url)
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Request-Id", uuid::Uuid::new_v4().to_string());
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_body(resp: Response) -> Result<Bytes, TransportError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &str, query: &str) -> Result<Bytes, TransportError> {
        let url = self.url(endpoint, query);
        tracing::debug!(%url, "GET");

        let resp = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Self::read_body(resp).await
    }

    async fn post_multipart(
        &self,
        endpoint: &str,
        body: MultipartBody,
    ) -> Result<Bytes, TransportError> {
        let url = self.url(endpoint, "");
        tracing::debug!(
            %url,
            file_name = %body.file.file_name,
            byte_size = body.file.data.len(),
            "POST multipart"
        );

        let mime_type = match body.file.mime_type.as_str() {
            "" => "application/octet-stream",
            other => other,
        };
        let part = reqwest::multipart::Part::bytes(body.file.data.to_vec())
            .file_name(body.file.file_name.clone())
            .mime_str(mime_type)
            .map_err(|e| TransportError::Request(format!("Invalid MIME type: {e}")))?;

        let mut form = reqwest::multipart::Form::new().part(body.file.field, part);
        for (name, value) in body.fields {
            form = form.text(name, value);
        }

        let resp = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Self::read_body(resp).await
    }
}
