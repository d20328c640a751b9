//! # Backoffice HTTP Client
//!
//! One HTTP client implementing all three collaborator traits against the
//! backoffice API:
//!
//! - `POST tax/quote`    → [`TaxService`]
//! - `POST sales`        → [`SalesService::create_sale`]
//! - `GET  sales/{id}`   → [`SalesService::fetch_sale`]
//! - `POST returns`      → [`ReturnsService`]
//!
//! Status handling: a non-success response body is the server's own error
//! message and becomes `RegisterError::Rejected` VERBATIM. Connection
//! failures and timeouts map to the retryable transport variants.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use keel_core::PersistedSale;

use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};
use crate::returns::{CreateReturnRequest, ReturnsService};
use crate::sales::{CreateSaleRequest, CreatedSale, SaleRecord, SalesService};
use crate::tax::{TaxQuoteRequest, TaxQuoteResponse, TaxService};

/// HTTP client for the backoffice collaborators.
#[derive(Debug, Clone)]
pub struct BackofficeClient {
    client: Client,
    base_url: String,
}

impl BackofficeClient {
    /// Creates a client from configuration. The configured request
    /// timeout applies to every call.
    pub fn new(config: &RegisterConfig) -> RegisterResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RegisterError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(BackofficeClient {
            client,
            base_url: config.backoffice_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST with a JSON body, JSON response.
    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RegisterResult<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// GET with a JSON response.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> RegisterResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> RegisterResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| RegisterError::BadResponse(e.to_string()))
        } else {
            // The body is the server's own message; surface it verbatim
            let message = response.text().await.unwrap_or_default();
            if message.trim().is_empty() {
                Err(RegisterError::Rejected(format!("request failed ({status})")))
            } else {
                Err(RegisterError::Rejected(message))
            }
        }
    }
}

#[async_trait]
impl TaxService for BackofficeClient {
    async fn quote(&self, request: TaxQuoteRequest) -> RegisterResult<TaxQuoteResponse> {
        self.post("tax/quote", &request).await
    }
}

#[async_trait]
impl SalesService for BackofficeClient {
    async fn create_sale(&self, request: CreateSaleRequest) -> RegisterResult<CreatedSale> {
        self.post("sales", &request).await
    }

    async fn fetch_sale(&self, sale_id: &str) -> RegisterResult<PersistedSale> {
        let record: SaleRecord = self.get(&format!("sales/{sale_id}")).await?;
        Ok(record.into())
    }
}

#[async_trait]
impl ReturnsService for BackofficeClient {
    async fn create_return(&self, request: CreateReturnRequest) -> RegisterResult<()> {
        // The returns endpoint answers 2xx with an empty body
        let _: serde_json::Value = self.post("returns", &request).await.or_else(|e| match e {
            RegisterError::BadResponse(_) => Ok(serde_json::Value::Null),
            other => Err(other),
        })?;
        Ok(())
    }
}
