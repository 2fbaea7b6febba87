//! Thin JSON wrapper around reqwest for the watcher service's API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use watchdash_proto::api::Ack;
use watchdash_proto::settings::ServerSettings;

use crate::error::ClientError;

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &ServerSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        self.send(path, self.http.get(self.url(path))).await
    }

    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(path, self.http.get(self.url(path)).query(query))
            .await
    }

    /// POST with an empty body; the service's lifecycle commands take none.
    pub async fn post_ack(&self, path: &str) -> Result<(), ClientError> {
        let ack: Ack = self.send(path, self.http.post(self.url(path))).await?;
        ensure_success(ack)
    }

    pub async fn post_json_ack<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let ack: Ack = self
            .send(path, self.http.post(self.url(path)).json(body))
            .await?;
        ensure_success(ack)
    }

    pub async fn put_json_ack<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let ack: Ack = self
            .send(path, self.http.put(self.url(path)).json(body))
            .await?;
        ensure_success(ack)
    }

    /// DELETE with a JSON body — the mappings endpoint identifies the victim
    /// in the body, not the path.
    pub async fn delete_json_ack<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let ack: Ack = self
            .send(path, self.http.delete(self.url(path)).json(body))
            .await?;
        ensure_success(ack)
    }

    /// Decoding happens from raw bytes rather than `Response::json` so a
    /// malformed body is distinguishable from a transport failure.
    async fn send<T>(&self, path: &str, request: RequestBuilder) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                path: path.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

fn ensure_success(ack: Ack) -> Result<(), ClientError> {
    if ack.success {
        Ok(())
    } else {
        Err(ClientError::Api(
            ack.message
                .unwrap_or_else(|| "unspecified failure".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_tolerates_slashes() {
        let settings = ServerSettings {
            base_url: "http://127.0.0.1:7502/".to_string(),
            request_timeout_secs: 8,
        };
        let api = ApiClient::new(&settings).unwrap();
        assert_eq!(
            api.url("/api/logs/recent"),
            "http://127.0.0.1:7502/api/logs/recent"
        );
        assert_eq!(api.url("api/health"), "http://127.0.0.1:7502/api/health");
    }

    #[test]
    fn test_failed_ack_surfaces_message() {
        let ack = Ack {
            success: false,
            message: Some("mapping not found".to_string()),
        };
        let err = ensure_success(ack).unwrap_err();
        assert!(matches!(err, ClientError::Api(ref m) if m == "mapping not found"));
    }
}
