//! HTTP client for the snap-style payment provider.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{Config, Error as FailsafeError, StateMachine, backoff, failure_policy};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::http::CALL_TIMEOUT;
use crate::ports::{ClientError, PaymentHandoff, PaymentProvider};

const SERVICE: &str = "payment-provider";

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    redirect_url: String,
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Payment provider client. External third-party API, so calls go through
/// a circuit breaker on top of the bounded request timeout.
#[derive(Clone)]
pub struct HttpPaymentProvider {
    client: Client,
    base_url: String,
    server_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl HttpPaymentProvider {
    pub fn new(base_url: String, server_key: String) -> Self {
        Self::with_circuit_breaker(base_url, server_key, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        server_key: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Self {
            client,
            base_url,
            server_key,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_handoff(
        &self,
        order_ref: &str,
        amount: &BigDecimal,
        customer_name: &str,
        customer_email: &str,
    ) -> Result<PaymentHandoff, ClientError> {
        let url = format!(
            "{}/snap/v1/transactions",
            self.base_url.trim_end_matches('/')
        );
        let payload = json!({
            "transaction_details": {
                "order_id": order_ref,
                "gross_amount": amount.to_string(),
            },
            "customer_details": {
                "first_name": customer_name,
                "email": customer_email,
            },
        });

        let client = self.client.clone();
        let server_key = self.server_key.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .basic_auth(&server_key, Some(""))
                    .json(&payload)
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

                let snap = response.json::<SnapResponse>().await?;
                if snap.token.is_empty() {
                    // Provider signals failure with an empty token
                    return Err(ClientError::InvalidResponse(
                        SERVICE,
                        snap.error_messages.join("; "),
                    ));
                }

                Ok(PaymentHandoff {
                    token: snap.token,
                    redirect_url: snap.redirect_url,
                })
            })
            .await;

        match result {
            Ok(handoff) => Ok(handoff),
            Err(FailsafeError::Rejected) => Err(ClientError::CircuitOpen(SERVICE)),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}
