use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Issuer every session token is stamped with and checked against.
pub const ISSUER: &str = "gtd-todo-app";

/// JWT payload as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub user_id: i64,   // user ID
    pub email: String,  // user email
    pub iat: i64,       // issued at (unix timestamp)
    pub exp: i64,       // expires at (unix timestamp)
    pub iss: String,    // issuer
}

/// Decoded claims of a token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub issuer: String,
}
