//! Webhook signature verification.
//!
//! Senders sign the raw request body with HMAC-SHA256 and pass the result in
//! a header formatted as `sha256=<lowercase hex digest>`, the scheme GitHub
//! uses for `X-Hub-Signature-256`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::SignatureError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the signature header value for `body` under `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(body);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a webhook signature header against the raw request body.
///
/// # Arguments
///
/// * `body` - The raw request body, exactly as received
/// * `secret` - The shared webhook secret
/// * `signature_header` - The received header value, if any
///
/// # Errors
///
/// [`SignatureError::MissingSignature`] when the header is absent or empty,
/// [`SignatureError::SignatureMismatch`] when it does not match.
pub fn verify_signature(
    body: &[u8],
    secret: &[u8],
    signature_header: Option<&str>,
) -> Result<(), SignatureError> {
    let received = match signature_header {
        Some(header) if !header.is_empty() => header,
        _ => {
            warn!("webhook_signature_missing");
            return Err(SignatureError::MissingSignature);
        }
    };

    let expected = match sign(body, secret) {
        Ok(signature) => signature,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return Err(SignatureError::SignatureMismatch);
        }
    };

    if !constant_time_compare(&expected, received) {
        warn!(
            expected_length = expected.len(),
            actual_length = received.len(),
            "webhook_signature_mismatch"
        );
        return Err(SignatureError::SignatureMismatch);
    }

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
