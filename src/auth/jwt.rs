use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use super::claims::{Claims, SessionClaims, ISSUER};
use crate::clock::Clock;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("secret key should not be empty")]
    EmptySecret,
    #[error("token validity does not fit the calendar")]
    ValidityOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    /// Bad signature, wrong issuer, expiry and garbage input all land here.
    #[error("token verification failed")]
    VerificationFailed,
}

/// Signs and verifies HS256 session tokens against an injected clock.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        })
    }

    pub fn issue(&self, user_id: i64, email: &str, validity: Duration) -> Result<String, TokenError> {
        let now = self.clock.now();
        let exp = time::Duration::try_from(validity)
            .ok()
            .and_then(|v| now.checked_add(v))
            .ok_or(TokenError::ValidityOutOfRange)?;
        let claims = Claims {
            user_id,
            email: email.to_owned(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: ISSUER.to_owned(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        // Expiry is checked below against our own clock, not the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[ISSUER]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::VerificationFailed
        })?;
        let claims = data.claims;

        let issued_at = OffsetDateTime::from_unix_timestamp(claims.iat)
            .map_err(|_| TokenError::VerificationFailed)?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|_| TokenError::VerificationFailed)?;
        if self.clock.now() >= expires_at {
            debug!(user_id = claims.user_id, "jwt expired");
            return Err(TokenError::VerificationFailed);
        }

        debug!(user_id = claims.user_id, "jwt verified");
        Ok(SessionClaims {
            user_id: claims.user_id,
            email: claims.email,
            issued_at,
            expires_at,
            issuer: claims.iss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use time::macros::datetime;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(datetime!(2025-01-01 0:00 UTC)))
    }

    fn codec(secret: &str, clock: &Arc<ManualClock>) -> TokenCodec {
        TokenCodec::new(secret, clock.clone()).expect("non-empty secret")
    }

    #[test]
    fn empty_secret_fails_at_construction() {
        let err = TokenCodec::new("", clock()).err().expect("must fail");
        assert!(matches!(err, TokenError::EmptySecret));
    }

    #[test]
    fn oversized_validity_is_an_error() {
        let keys = codec("dev-secret", &clock());
        assert!(matches!(
            keys.issue(1, "a@x.com", Duration::from_secs(u64::MAX / 2)),
            Err(TokenError::ValidityOutOfRange)
        ));
        assert!(matches!(
            keys.issue(1, "a@x.com", Duration::MAX),
            Err(TokenError::ValidityOutOfRange)
        ));
        // Past year 9999.
        assert!(matches!(
            keys.issue(1, "a@x.com", DAY * 366 * 8000),
            Err(TokenError::ValidityOutOfRange)
        ));
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let clock = clock();
        let keys = codec("dev-secret", &clock);
        let token = keys.issue(7, "a@x.com", DAY).expect("sign");
        assert!(!token.is_empty());

        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.issuer, ISSUER);
        assert_eq!(claims.issued_at, datetime!(2025-01-01 0:00 UTC));
        assert_eq!(claims.expires_at, datetime!(2025-01-02 0:00 UTC));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let clock = clock();
        let keys = codec("dev-secret", &clock);
        let token = keys.issue(1, "a@x.com", Duration::from_secs(60)).unwrap();

        clock.advance(Duration::from_secs(59));
        assert!(keys.verify(&token).is_ok());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(keys.verify(&token), Err(TokenError::VerificationFailed)));

        clock.advance(Duration::from_secs(3600));
        assert!(matches!(keys.verify(&token), Err(TokenError::VerificationFailed)));
    }

    #[test]
    fn verify_uses_injected_clock_not_wall_clock() {
        // Issued and checked in 1990: long expired by the wall clock, valid here.
        let clock = Arc::new(ManualClock::new(datetime!(1990-06-01 0:00 UTC)));
        let keys = codec("dev-secret", &clock);
        let token = keys.issue(3, "old@x.com", Duration::from_secs(60)).unwrap();
        assert_eq!(keys.verify(&token).unwrap().user_id, 3);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let clock = clock();
        let token = codec("key-one", &clock).issue(1, "a@x.com", DAY).unwrap();
        let err = codec("key-two", &clock).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::VerificationFailed));
    }

    #[test]
    fn verify_rejects_foreign_issuer() {
        let clock = clock();
        let claims = Claims {
            user_id: 1,
            email: "a@x.com".into(),
            iat: clock.now().unix_timestamp(),
            exp: (clock.now() + DAY).unix_timestamp(),
            iss: "someone-else".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        let err = codec("dev-secret", &clock).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::VerificationFailed));
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let clock = clock();
        let claims = Claims {
            user_id: 1,
            email: "a@x.com".into(),
            iat: clock.now().unix_timestamp(),
            exp: (clock.now() + DAY).unix_timestamp(),
            iss: ISSUER.into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(codec("dev-secret", &clock).verify(&token).is_err());
    }

    #[test]
    fn every_failure_reads_the_same() {
        let clock = clock();
        let keys = codec("dev-secret", &clock);
        let expired = keys.issue(1, "a@x.com", Duration::from_secs(1)).unwrap();
        let forged = codec("other", &clock).issue(1, "a@x.com", DAY).unwrap();
        clock.advance(Duration::from_secs(5));

        let messages: Vec<String> = ["garbage", "", expired.as_str(), forged.as_str()]
            .iter()
            .map(|t| keys.verify(t).unwrap_err().to_string())
            .collect();
        assert!(messages.iter().all(|m| m == "token verification failed"));
    }
}
