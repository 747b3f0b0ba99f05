//! Slack request signature verification.
//!
//! Implements <https://api.slack.com/authentication/verifying-requests-from-slack>.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

use super::error::SlackError;

/// Requests older than this many seconds are rejected.
const MAX_REQUEST_AGE_SECS: u64 = 300;

/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Version prefix of a signature header value.
const SIGNATURE_VERSION: &str = "v0=";

/// Verifies that requests were signed with the app's signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

impl SignatureVerifier {
    #[must_use]
    pub const fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret }
    }

    /// Verify a request against the current time.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - The `X-Slack-Request-Timestamp` header value
    /// * `body` - The raw request body
    /// * `signature` - The `X-Slack-Signature` header value
    ///
    /// # Errors
    ///
    /// Returns error if the timestamp is stale or the signature does not
    /// match.
    #[instrument(skip(self, body, signature))]
    pub fn verify(&self, timestamp: &str, body: &str, signature: &str) -> Result<(), SlackError> {
        let now_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| SlackError::InvalidSignature(e.to_string()))?
            .as_secs();

        let now = i64::try_from(now_secs)
            .map_err(|_| SlackError::InvalidSignature("System time overflow".to_string()))?;

        self.verify_at(now, timestamp, body, signature)
    }

    /// Verify a request as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_at(
        &self,
        now: i64,
        timestamp: &str,
        body: &str,
        signature: &str,
    ) -> Result<(), SlackError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| SlackError::InvalidSignature("Invalid timestamp".to_string()))?;

        if now.abs_diff(ts) > MAX_REQUEST_AGE_SECS {
            return Err(SlackError::InvalidSignature(
                "Request timestamp too old".to_string(),
            ));
        }

        let mismatch = || SlackError::InvalidSignature("Signature mismatch".to_string());

        let provided = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|digest| hex::decode(digest).ok())
            .ok_or_else(mismatch)?;

        self.mac(timestamp, body)?
            .verify_slice(&provided)
            .map_err(|_| mismatch())?;

        debug!("Slack signature verified");
        Ok(())
    }

    /// Compute the `v0=` signature of a request.
    ///
    /// # Errors
    ///
    /// Returns error if the signing secret cannot key the MAC.
    pub fn sign(&self, timestamp: &str, body: &str) -> Result<String, SlackError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION}{}", hex::encode(digest)))
    }

    /// MAC keyed with the signing secret over the `v0` base string.
    fn mac(&self, timestamp: &str, body: &str) -> Result<Hmac<Sha256>, SlackError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.signing_secret.expose_secret().as_bytes())
                .map_err(|e| SlackError::InvalidSignature(e.to_string()))?;

        mac.update(format!("v0:{timestamp}:{body}").as_bytes());
        Ok(mac)
    }
}
