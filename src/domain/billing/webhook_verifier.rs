//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"`, compared in constant time,
//! with a timestamp window to bound replays.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

/// Maximum allowed age for a signature (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signatures (HMAC-SHA256). Stripe sends several during secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSignature` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(WebhookError::InvalidSignature)?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| WebhookError::InvalidSignature)?);
                }
                "v1" => {
                    v1_signatures
                        .push(hex::decode(value).map_err(|_| WebhookError::InvalidSignature)?);
                }
                _ => {
                    // v0 and future schemes are ignored
                }
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::InvalidSignature)?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::InvalidSignature);
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard (`whsec_...`).
    secret: SecretString,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies a delivery against the current wall clock.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Verifies a delivery as of `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - header unparseable or no v1 signature matches
    /// - `TimestampOutOfRange` - signed too long ago or too far in the future
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        let age = now
            .checked_sub(header.timestamp)
            .ok_or(WebhookError::TimestampOutOfRange)?;
        if !(-MAX_CLOCK_SKEW_SECS..=MAX_EVENT_AGE_SECS).contains(&age) {
            return Err(WebhookError::TimestampOutOfRange);
        }

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Builds a `Stripe-Signature` header value for `payload`, the way the
    /// Stripe CLI signs forwarded test deliveries.
    pub fn generate_test_header(&self, timestamp: i64, payload: &[u8]) -> String {
        match self.compute_signature(timestamp, payload) {
            Ok(signature) => format!("t={},v1={}", timestamp, hex::encode(signature)),
            Err(_) => format!("t={}", timestamp),
        }
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_704_067_200;
    const PAYLOAD: &[u8] = br#"{"id":"evt_test123","type":"customer.updated"}"#;

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_v1_only() {
        let header_str = format!("t=1234567890,v1={}", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_header_collects_multiple_v1_signatures() {
        let header_str = format!(
            "t=1234567890,v1={},v1={},v0={}",
            "a".repeat(64),
            "b".repeat(64),
            "c".repeat(64)
        );

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn parse_header_non_ascii_signature_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=ééé");
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW, PAYLOAD);

        assert!(verifier.verify_at(PAYLOAD, &header, NOW).is_ok());
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let other = StripeWebhookVerifier::new(SecretString::new("whsec_other".to_string()));
        let header = other.generate_test_header(NOW, PAYLOAD);

        let result = verifier().verify_at(PAYLOAD, &header, NOW);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW, PAYLOAD);

        let result = verifier.verify_at(br#"{"id":"evt_hacked"}"#, &header, NOW);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_accepts_any_matching_v1_signature() {
        let verifier = verifier();
        let valid = verifier.generate_test_header(NOW, PAYLOAD);
        let header = format!("{},v1={}", valid, "0".repeat(64));

        assert!(verifier.verify_at(PAYLOAD, &header, NOW).is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_timestamp_at_boundary_succeeds() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW - 300, PAYLOAD);

        assert!(verifier.verify_at(PAYLOAD, &header, NOW).is_ok());
    }

    #[test]
    fn verify_timestamp_just_past_boundary_fails() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW - 301, PAYLOAD);

        let result = verifier.verify_at(PAYLOAD, &header, NOW);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn verify_timestamp_from_future_with_skew_succeeds() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW + 30, PAYLOAD);

        assert!(verifier.verify_at(PAYLOAD, &header, NOW).is_ok());
    }

    #[test]
    fn verify_timestamp_from_future_beyond_skew_fails() {
        let verifier = verifier();
        let header = verifier.generate_test_header(NOW + 120, PAYLOAD);

        let result = verifier.verify_at(PAYLOAD, &header, NOW);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn verify_extreme_timestamps_are_out_of_range() {
        let verifier = verifier();

        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            let result = verifier.verify_at(b"{}", header, NOW);
            assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)), "{}", header);
        }
    }
}
