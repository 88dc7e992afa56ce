//! HTTP client for the email service.

use async_trait::async_trait;
use reqwest::Client;

use super::http::CALL_TIMEOUT;
use crate::ports::{ClientError, Notifier, PurchaseNotice};

const SERVICE: &str = "email-service";

#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn purchase_completed(&self, notice: &PurchaseNotice) -> Result<(), ClientError> {
        let url = format!(
            "{}/send-transaction-success",
            self.base_url.trim_end_matches('/')
        );

        let response = self.client.post(&url).json(notice).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
