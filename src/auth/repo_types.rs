use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,                      // store-assigned, starts at 1
    pub email: String,                // unique
    pub password_hash: String,        // Argon2 PHC string, never the plaintext
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// A user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}
