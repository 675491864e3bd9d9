//! Access and refresh tokens
//!
//! Uses HMAC-signed tokens carried in cookies or the Authorization header.
//! No server-side session storage; the refresh token is additionally stored
//! on the user row so logout and rotation can invalidate it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::User;
use crate::error::AppError;

/// Token role, encoded in the payload so one kind cannot stand in for the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub username: String,
    pub kind: TokenKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn access(user: &User, ttl_seconds: i64) -> Self {
        Self::new(user, TokenKind::Access, ttl_seconds)
    }

    pub fn refresh(user: &User, ttl_seconds: i64) -> Self {
        Self::new(user, TokenKind::Refresh, ttl_seconds)
    }

    fn new(user: &User, kind: TokenKind, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            kind,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_token(claims: &TokenClaims, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload = serde_json::to_string(claims).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC key setup failed: {}", e)))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a token
///
/// # Errors
/// Returns `Unauthorized` if the token is malformed, mis-signed, expired,
/// or of a different kind than expected.
pub fn verify_token(
    token: &str,
    secret: &str,
    expected_kind: TokenKind,
) -> Result<TokenClaims, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC key setup failed: {}", e)))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if claims.kind != expected_kind || claims.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityId;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: EntityId::new().0,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            avatar_url: "https://cdn.example.com/a.png".to_string(),
            cover_image_url: None,
            password_hash: "hash".to_string(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn round_trip_access_token() {
        let user = test_user();
        let claims = TokenClaims::access(&user, 900);
        let token = create_token(&claims, SECRET).unwrap();
        let decoded = verify_token(&token, SECRET, TokenKind::Access).unwrap();
        assert_eq!(decoded.user_id, user.id);
        assert_eq!(decoded.username, "alice");
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let user = test_user();
        let claims = TokenClaims::refresh(&user, 3600);
        let token = create_token(&claims, SECRET).unwrap();
        assert!(verify_token(&token, SECRET, TokenKind::Access).is_err());
        assert!(verify_token(&token, SECRET, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn tampered_payload_rejected() {
        let user = test_user();
        let token = create_token(&TokenClaims::access(&user, 900), SECRET).unwrap();
        let mut parts = token.splitn(2, '.');
        let _payload = parts.next().unwrap();
        let signature = parts.next().unwrap();
        let forged = format!("Zm9yZ2Vk.{}", signature);
        assert!(verify_token(&forged, SECRET, TokenKind::Access).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let user = test_user();
        let token = create_token(&TokenClaims::access(&user, 900), SECRET).unwrap();
        assert!(verify_token(&token, "another-secret-also-32-bytes-long!!", TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let user = test_user();
        let claims = TokenClaims::access(&user, -1);
        let token = create_token(&claims, SECRET).unwrap();
        assert!(verify_token(&token, SECRET, TokenKind::Access).is_err());
    }
}
