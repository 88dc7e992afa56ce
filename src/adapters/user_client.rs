//! HTTP client for the auth/user service.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::http::{CALL_TIMEOUT, with_retry};
use crate::ports::{ClientError, User, UserStore};

const SERVICE: &str = "auth-service";

#[derive(Deserialize)]
struct UserEnvelope {
    #[allow(dead_code)]
    message: String,
    user: User,
}

#[derive(Clone)]
pub struct HttpUserStore {
    client: Client,
    base_url: String,
}

impl HttpUserStore {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl UserStore for HttpUserStore {
    async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        let url = self.url(&format!("/users/{}", id));

        with_retry(SERVICE, 3, || {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                let response = client.get(&url).send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ClientError::Status {
                        service: SERVICE,
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }

                let envelope = response.json::<UserEnvelope>().await?;
                Ok(envelope.user)
            }
        })
        .await
    }

    async fn credit_balance(&self, id: i64, amount: &BigDecimal) -> Result<(), ClientError> {
        // Delta write, at most once: no retry.
        let url = self.url(&format!("/users/{}", id));

        let response = self
            .client
            .patch(&url)
            .json(&json!({ "amount": amount }))
            .send()
            .await?;

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
