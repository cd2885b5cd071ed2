use chrono::{ Duration, Utc };
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // email
    pub exp: usize,
    pub iat: usize,
}

/// HS256 signing material plus the lifetime of issued tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn create_token(&self, subject: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.ttl).ok_or(AuthError::TokenExpiry)?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new("secret", Duration::hours(1));
        let token = signer.create_token("a@b.c").unwrap();
        let claims = signer.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "a@b.c");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenSigner::new("one", Duration::hours(1)).create_token("x").unwrap();
        let result = TokenSigner::new("two", Duration::hours(1)).verify_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway.
        let signer = TokenSigner::new("secret", Duration::minutes(-5));
        let token = signer.create_token("x").unwrap();
        assert!(signer.verify_token(&token).is_err());
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let signer = TokenSigner::new("secret", Duration::MAX);
        assert!(matches!(signer.create_token("x"), Err(AuthError::TokenExpiry)));
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = TokenSigner::new("secret", Duration::hours(1));
        assert!(signer.verify_token("not.a.jwt").is_err());
    }
}
