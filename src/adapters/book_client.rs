//! HTTP client for the book service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{CALL_TIMEOUT, with_retry};
use crate::ports::{Book, BookStore, ClientError};

const SERVICE: &str = "book-service";

/// Book-service responses come wrapped in the marketplace envelope.
#[derive(Deserialize)]
struct BookEnvelope {
    #[allow(dead_code)]
    message: String,
    data: Book,
}

#[derive(Clone)]
pub struct HttpBookStore {
    client: Client,
    base_url: String,
    service_token: Option<String>,
}

impl HttpBookStore {
    pub fn new(base_url: String, service_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            service_token,
        }
    }

    /// Caller's token wins; the configured service token covers the
    /// webhook path, which carries no user credentials.
    fn token(&self, bearer: Option<&str>) -> Option<String> {
        bearer
            .map(str::to_owned)
            .or_else(|| self.service_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl BookStore for HttpBookStore {
    async fn get_book(&self, id: i64, bearer: Option<&str>) -> Result<Book, ClientError> {
        let url = self.url(&format!("/books/{}", id));
        let token = self.token(bearer);

        with_retry(SERVICE, 3, || {
            let client = self.client.clone();
            let url = url.clone();
            let token = token.clone();
            async move {
                let mut req = client.get(&url);
                if let Some(token) = token {
                    req = req.bearer_auth(token);
                }
                let response = req.send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ClientError::Status {
                        service: SERVICE,
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }

                let envelope = response.json::<BookEnvelope>().await?;
                Ok(envelope.data)
            }
        })
        .await
    }

    async fn deduct_stock(
        &self,
        id: i64,
        quantity: i32,
        bearer: Option<&str>,
    ) -> Result<(), ClientError> {
        // Delta write, at most once: no retry.
        let url = self.url(&format!("/books/{}/{}", id, quantity));

        let mut req = self.client.patch(&url);
        if let Some(token) = self.token(bearer) {
            req = req.bearer_auth(token);
        }
        let response = req.send().await?;

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
