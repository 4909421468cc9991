//! # Payment Gateway
//!
//! The seam between order creation and a payment processor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order                                                           │
//! │       │  CartTotal.total = Money(63250)                                 │
//! │       ▼                                                                 │
//! │  PaymentIntentRequest { amount_minor: 63250, currency: "usd",          │
//! │                         metadata: { userId, itemCount } }              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  dyn PaymentGateway ──► PaymentIntent { id, client_secret }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts cross this boundary in minor units (cents). The conversion is
//! `Money::cents()`, done by the order handler.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

// =============================================================================
// Types
// =============================================================================

/// Request to open a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Amount in the currency's minor unit (cents).
    pub amount_minor: i64,
    /// ISO 4217 code, lowercase.
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

/// An opened payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the client to confirm the payment.
    pub client_secret: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Payment gateway failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Invalid payment amount: {0} (must be positive)")]
    InvalidAmount(i64),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// A payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;
}

// =============================================================================
// Simulated Gateway
// =============================================================================

/// In-process gateway that approves every well-formed request.
///
/// Used by the CLI and tests; records each accepted request.
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    decline_reason: Option<String>,
    accepted: Mutex<Vec<PaymentIntentRequest>>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        SimulatedGateway::default()
    }

    /// A gateway that declines every request with `reason`.
    pub fn declining(reason: impl Into<String>) -> Self {
        SimulatedGateway {
            decline_reason: Some(reason.into()),
            accepted: Mutex::new(Vec::new()),
        }
    }

    /// Requests accepted so far, oldest first.
    pub async fn accepted(&self) -> Vec<PaymentIntentRequest> {
        self.accepted.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        if request.amount_minor <= 0 {
            return Err(PaymentError::InvalidAmount(request.amount_minor));
        }

        if request.currency.len() != 3 || !request.currency.chars().all(|c| c.is_ascii_lowercase())
        {
            return Err(PaymentError::UnsupportedCurrency(request.currency));
        }

        if let Some(reason) = &self.decline_reason {
            return Err(PaymentError::Provider(reason.clone()));
        }

        let id = format!("pi_sim_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: format!("{}_secret_{}", id, Uuid::new_v4().simple()),
            id,
            amount_minor: request.amount_minor,
            currency: request.currency.clone(),
        };

        debug!(id = %intent.id, amount_minor = intent.amount_minor, "Simulated payment intent created");

        self.accepted.lock().await.push(request);
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount_minor: i64, currency: &str) -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount_minor,
            currency: currency.to_string(),
            metadata: BTreeMap::from([("userId".to_string(), "guest".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_simulated_intent() {
        let gateway = SimulatedGateway::new();
        let intent = gateway
            .create_payment_intent(request(63250, "usd"))
            .await
            .unwrap();

        assert!(intent.id.starts_with("pi_sim_"));
        assert!(intent.client_secret.starts_with(&intent.id));
        assert_eq!(intent.amount_minor, 63250);

        let accepted = gateway.accepted().await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].metadata["userId"], "guest");
    }

    #[tokio::test]
    async fn test_rejects_bad_requests() {
        let gateway = SimulatedGateway::new();

        let err = gateway.create_payment_intent(request(0, "usd")).await.unwrap_err();
        assert_eq!(err, PaymentError::InvalidAmount(0));

        let err = gateway.create_payment_intent(request(100, "USDT")).await.unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedCurrency(_)));

        assert!(gateway.accepted().await.is_empty());
    }

    #[tokio::test]
    async fn test_declining_gateway() {
        let gateway = SimulatedGateway::declining("card declined");
        let err = gateway.create_payment_intent(request(100, "usd")).await.unwrap_err();
        assert_eq!(err, PaymentError::Provider("card declined".to_string()));
    }
}
