//! Outbound response envelope
//!
//! Serializes the orchestrator's result into the proxy-compatible envelope:
//! `statusCode`, JSON content-type header, and a JSON-string `body`.

use misaki_foundation::llm::types::{EscalationExhausted, FinalResponse};
use serde_json::{Value, json};

const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Proxy-style response wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaResponse {
    pub status_code: u16,
    pub body: Value,
}

impl LambdaResponse {
    /// 200 with the `output`/`tier`/`escalated` contract body.
    pub fn success(response: &FinalResponse) -> Self {
        Self {
            status_code: 200,
            body: json!({
                "output": response.text,
                "tier": response.tier.as_str(),
                "escalated": response.escalated,
            }),
        }
    }

    /// 502 with the aggregated failure body naming every attempted tier.
    pub fn exhausted(err: &EscalationExhausted) -> Self {
        let tiers: Vec<&str> = err
            .tiers_attempted()
            .iter()
            .map(|tier| tier.as_str())
            .collect();
        Self {
            status_code: 502,
            body: json!({
                "error": err.to_string(),
                "tiersAttempted": tiers,
            }),
        }
    }

    /// 400 for payloads the boundary refuses.
    pub fn bad_request(message: &str) -> Self {
        Self {
            status_code: 400,
            body: json!({"error": message}),
        }
    }

    /// The full invocation response value.
    pub fn to_value(&self) -> Value {
        json!({
            "statusCode": self.status_code,
            "headers": {"Content-Type": CONTENT_TYPE},
            "body": self.body.to_string(),
        })
    }
}
