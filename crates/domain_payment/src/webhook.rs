//! Gateway webhook verification
//!
//! Inbound gateway events carry `{signature, timestamp, data}` where the
//! signature is HMAC-SHA256 over `timestamp + canonical(data)` keyed by the
//! shared webhook secret. The payload is canonicalized with recursively
//! sorted object keys so both sides sign the same bytes regardless of field
//! order. Verification uses a constant-time comparison and a freshness
//! window against replays.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook event before it is treated as a replay
const MAX_EVENT_AGE_SECS: i64 = 300;

/// An inbound gateway webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Hex-encoded HMAC-SHA256 signature
    pub signature: String,
    /// Unix timestamp the sender signed
    pub timestamp: i64,
    /// Event payload; expected to carry the payment id and external status
    pub data: serde_json::Value,
}

/// Serializes a JSON value with recursively sorted object keys
///
/// `serde_json` preserves insertion order, so a naive `to_string` would make
/// the signature depend on the sender's field ordering.
pub fn canonical_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let entries: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        serde_json::Value::Array(items) => {
            let entries: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", entries.join(","))
        }
        other => other.to_string(),
    }
}

/// Computes the hex signature for an event payload
pub fn compute_signature(secret: &str, timestamp: i64, data: &serde_json::Value) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}{}", timestamp, canonical_json(data)).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies an event's signature and freshness
///
/// Rejection happens before any payment is loaded; the error carries enough
/// context for the caller to log a replayable record.
pub fn verify_signature(secret: &str, event: &WebhookEvent) -> Result<(), PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}{}", event.timestamp, canonical_json(&event.data)).as_bytes());

    let sig_bytes = hex::decode(&event.signature)
        .map_err(|_| PaymentError::WebhookRejected("signature is not valid hex".to_string()))?;

    mac.verify_slice(&sig_bytes)
        .map_err(|_| PaymentError::WebhookRejected("signature mismatch".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    if (now - event.timestamp).abs() > MAX_EVENT_AGE_SECS {
        return Err(PaymentError::WebhookRejected(format!(
            "event timestamp {} outside the freshness window",
            event.timestamp
        )));
    }

    Ok(())
}
