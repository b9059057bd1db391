use crate::backend::{BackendError, BackendRequest, QueryBackend};
use anyhow::Context;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// Issues backend requests as HTTP GET with query-string parameters
pub struct HttpQueryBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpQueryBackend {
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        log::info!("Using backend at {}", endpoint);

        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to initialize HTTP client")?;

        Ok(Self { client, endpoint })
    }

    fn url_for(&self, request: &BackendRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }
}

impl QueryBackend for HttpQueryBackend {
    fn call<'a>(
        &'a self,
        request: &'a BackendRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BackendError>> + 'a>> {
        Box::pin(async move {
            let url = self.url_for(request);
            log::debug!("GET {}", url);

            let response = self
                .client
                .get(url)
                .header(ACCEPT, APPLICATION_JSON)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::Status(status));
            }

            Ok(response.json::<Value>().await?)
        })
    }
}
