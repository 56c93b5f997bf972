//! Token codec and credential hashing.
//!
//! Session tokens are compact signed blobs: `base64(claims JSON) "." base64(HMAC-SHA256)`.
//! The codec owns the signing key; everything else treats tokens as opaque
//! strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::models::enums::Role;

type HmacSha256 = Hmac<Sha256>;

/// Hash input limit kept for compatibility with credentials migrated from
/// a bcrypt backend. Longer passwords are truncated at the byte level.
const PASSWORD_INPUT_LIMIT: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub kind: TokenKind,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Signs and verifies session tokens.
pub struct TokenCodec {
    key: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    pub fn issue_access(&self, sub: Uuid, role: Role, lifetime_minutes: i64) -> String {
        self.sign(&Claims {
            sub,
            role,
            kind: TokenKind::Access,
            exp: (Utc::now() + Duration::minutes(lifetime_minutes)).timestamp(),
        })
    }

    pub fn issue_refresh(&self, sub: Uuid, role: Role, lifetime_days: i64) -> String {
        self.sign(&Claims {
            sub,
            role,
            kind: TokenKind::Refresh,
            exp: (Utc::now() + Duration::days(lifetime_days)).timestamp(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> String {
        let payload = serde_json::to_vec(claims).expect("claims serialize");
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(encoded.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{encoded}.{sig}")
    }

    /// Verify signature first, then expiry. Claims are only parsed from a
    /// payload whose MAC checked out.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (encoded, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(encoded.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Random URL-safe token with 32 bytes of entropy (43 characters).
/// Used for emergency tokens; uniqueness is enforced by the store index.
pub fn generate_opaque_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn truncate_password(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(PASSWORD_INPUT_LIMIT)]
}

pub fn hash_password(password: &str) -> Result<String, pbkdf2::password_hash::Error> {
    use pbkdf2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use pbkdf2::Pbkdf2;

    let salt = SaltString::generate(&mut OsRng);
    Ok(Pbkdf2
        .hash_password(truncate_password(password), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    use pbkdf2::password_hash::{PasswordHash, PasswordVerifier};
    use pbkdf2::Pbkdf2;

    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Pbkdf2
        .verify_password(truncate_password(password), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-test-secret-test-secret-1234")
    }

    #[test]
    fn access_token_round_trips() {
        let c = codec();
        let sub = Uuid::new_v4();
        let token = c.issue_access(sub, Role::Patient, 30);
        let claims = c.verify(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.role, Role::Patient);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn expired_token_is_rejected() {
        let c = codec();
        let token = c.sign(&Claims {
            sub: Uuid::new_v4(),
            role: Role::Doctor,
            kind: TokenKind::Access,
            exp: (Utc::now() - Duration::seconds(1)).timestamp(),
        });
        assert_eq!(c.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let c = codec();
        let token = c.issue_access(Uuid::new_v4(), Role::Patient, 30);
        let (payload, sig) = token.split_once('.').unwrap();
        // Re-encode a different payload with the original signature.
        let mut decoded = URL_SAFE_NO_PAD.decode(payload).unwrap();
        decoded[10] ^= 1;
        let forged = format!("{}.{sig}", URL_SAFE_NO_PAD.encode(decoded));
        assert_eq!(c.verify(&forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = codec().issue_access(Uuid::new_v4(), Role::Admin, 30);
        let other = TokenCodec::new("another-secret-another-secret-another-00");
        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(codec().verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec().verify("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn opaque_token_is_long_and_unique() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert!(a.len() >= 32);
        assert_ne!(a, b);
    }

    #[test]
    fn password_round_trips() {
        let hash = hash_password("Sup3rSecret!").unwrap();
        assert!(verify_password("Sup3rSecret!", &hash));
        assert!(!verify_password("Sup3rSecret?", &hash));
    }

    #[test]
    fn passwords_agree_past_truncation_limit() {
        let long = "A1".repeat(50); // 100 bytes
        let hash = hash_password(&long).unwrap();
        // Only the first 72 bytes participate in the hash.
        let mut variant = long[..72].to_string();
        variant.push_str("different-tail");
        assert!(verify_password(&variant, &hash));
    }
}
