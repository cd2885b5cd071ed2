pub mod jwt;
pub mod password;

use chrono::Utc;
use log::info;
use std::sync::Arc;

use self::jwt::{ Claims, TokenSigner };
use self::password::{ hash_password, verify_password };
use crate::error::AuthError;
use crate::history::{ CredentialStore, Store };
use crate::models::user::Credential;

/// Email/password registration and token issuance.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    signer: TokenSigner,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.store.find_credential(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let credential = Credential {
            email: email.clone(),
            password_hash: hash_password(password).await?,
            created_at: Utc::now().timestamp(),
        };
        if !self.store.insert_credential(&credential).await? {
            return Err(AuthError::UserExists);
        }
        info!("Registered user {}", email);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let credential = self.store
            .find_credential(&email).await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &credential.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        self.signer.create_token(&credential.email)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify_token(token)
    }
}
