use serde::{ Serialize, Deserialize };

/// Stored login record. `password_hash` is a salted bcrypt hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}
