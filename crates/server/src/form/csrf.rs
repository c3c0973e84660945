//! CSRF token generation and verification.
//!
//! Tokens are random, single-use, time-limited, and stored in the caller's
//! session alongside their issue timestamp.

use anyhow::{Result, bail};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of live tokens per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// A stored token with its issue timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    issued: i64,
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let issued = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(issued.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens: Vec<StoredToken> = session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default();

    tokens.push(StoredToken {
        token: token.clone(),
        issued,
    });

    // Keep only the most recent tokens
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens.drain(..skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session.
///
/// A matching, unexpired token is consumed; expired tokens are pruned.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let mut tokens: Vec<StoredToken> = session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default();

    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();

    let found = tokens
        .iter()
        .position(|t| t.token == submitted && now - t.issued <= TOKEN_VALIDITY_SECS);

    let Some(index) = found else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|t| now - t.issued <= TOKEN_VALIDITY_SECS);

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use sha2::Digest;

    #[test]
    fn token_format() {
        // Tokens are hex-encoded SHA256 (64 chars)
        let token = hex::encode(sha2::Sha256::digest(b"test"));
        assert_eq!(token.len(), 64);
    }
}
