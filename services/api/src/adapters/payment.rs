//! services/api/src/adapters/payment.rs
//!
//! Payment adapters implementing the `PaymentService` port: the card gateway
//! reached over HTTP, and a sandbox that approves everything for local runs.

use async_trait::async_trait;
use aura_core::domain::{PaymentReceipt, PaymentRequest};
use aura_core::ports::{PaymentService, PortError, PortResult};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const GENERIC_PAYMENT_FAILURE: &str = "Payment failed. Please check your details and try again.";

const ACQUIRER_NOT_ENABLED: &str = "adquirente não está disponivel para api";
const ACQUIRER_NOT_ENABLED_HINT: &str = "Payment Gateway Error: Your merchant account is not configured for API transactions. Please contact Frendz.com.br support to enable API payments for your acquirer.";

/// The gateway rejects a customer block without a phone number and a tax
/// document. Checkout does not ask for either, so fixed stand-ins are sent.
const PLACEHOLDER_PHONE: &str = "11999999999";
const PLACEHOLDER_DOCUMENT: &str = "00000000000";

//=========================================================================================
// Gateway Adapter
//=========================================================================================

#[derive(Clone)]
pub struct GatewayPaymentAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl GatewayPaymentAdapter {
    pub fn new(endpoint: String, api_token: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_token,
        })
    }
}

/// Builds the gateway's transaction payload for a single-line cart.
pub fn transaction_payload(request: &PaymentRequest) -> Value {
    json!({
        "amount": request.amount_cents,
        "offer_hash": request.offering.offer_hash,
        "payment_method": "credit_card",
        "card": {
            "number": request.card.number.split_whitespace().collect::<String>(),
            "holder_name": request.card.holder_name,
            "exp_month": request.card.exp_month,
            "exp_year": request.card.exp_year,
            "cvv": request.card.cvv,
        },
        "customer": {
            "name": request.payer.name,
            "email": request.payer.email,
            "phone_number": PLACEHOLDER_PHONE,
            "document": PLACEHOLDER_DOCUMENT,
        },
        "cart": [{
            "product_hash": request.offering.product_hash,
            "title": request.title,
            "price": request.amount_cents,
            "quantity": 1,
            "operation_type": 1,
        }],
        "installments": 1,
        "transaction_origin": "api",
    })
}

/// Turns a gateway error body into the reason shown to the payer.
pub fn rejection_reason(body: Option<&Value>) -> String {
    let api_message = body
        .and_then(|b| {
            let from_errors = b
                .get("errors")
                .and_then(Value::as_array)
                .filter(|errors| !errors.is_empty())
                .map(|errors| {
                    errors
                        .iter()
                        .map(|e| {
                            e.get("message")
                                .and_then(Value::as_str)
                                .unwrap_or("Unknown API error")
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                });
            from_errors.or_else(|| b.get("message").and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.is_empty());

    match api_message {
        Some(m) if m.contains(ACQUIRER_NOT_ENABLED) => ACQUIRER_NOT_ENABLED_HINT.to_string(),
        Some(m) => m,
        None => GENERIC_PAYMENT_FAILURE.to_string(),
    }
}

fn transaction_id(body: &Value) -> Option<String> {
    ["hash", "id"].iter().find_map(|field| match body.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[async_trait]
impl PaymentService for GatewayPaymentAdapter {
    async fn charge(&self, request: &PaymentRequest) -> PortResult<PaymentReceipt> {
        info!(
            "Submitting transaction of {} cents for '{}'",
            request.amount_cents, request.title
        );
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("api_token", self.api_token.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&transaction_payload(request))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Payment gateway unreachable: {}", e)))?;

        let status = response.status();
        // The body is optional on both paths; a non-JSON body is treated as absent.
        let body = response.json::<Value>().await.ok();

        if !status.is_success() {
            error!("Payment gateway returned HTTP {}: {:?}", status.as_u16(), body);
            return Err(PortError::Rejected(rejection_reason(body.as_ref())));
        }

        Ok(PaymentReceipt {
            transaction_id: body.as_ref().and_then(transaction_id),
        })
    }
}

//=========================================================================================
// Sandbox Adapter
//=========================================================================================

/// Approves every charge without contacting anyone.
#[derive(Clone, Debug, Default)]
pub struct SandboxPaymentAdapter;

impl SandboxPaymentAdapter {
    pub fn new() -> Self {
        warn!("No payment API token configured; using the sandbox payment adapter");
        Self
    }
}

#[async_trait]
impl PaymentService for SandboxPaymentAdapter {
    async fn charge(&self, request: &PaymentRequest) -> PortResult<PaymentReceipt> {
        info!(
            "Sandbox approved {} cents for '{}'",
            request.amount_cents, request.title
        );
        Ok(PaymentReceipt {
            transaction_id: None,
        })
    }
}
