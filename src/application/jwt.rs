use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::account::Account;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Claims carried by a refresh token. Deliberately minimal: the subject is
/// re-resolved against the account record at refresh time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Signs and verifies bearer tokens. Pure: same secret, issuer, claims and
/// clock always produce a verifiable result. Expiry is checked against the
/// caller-supplied `now` so tests can drive the clock.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
    issuer: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenCodec {
    pub fn new(
        secret: SecretString,
        issuer: String,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            secret,
            issuer,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue an access + refresh token pair for an account.
    pub fn issue_pair(&self, account: &Account, now: DateTime<Utc>) -> AppResult<TokenPair> {
        let iat = now.timestamp();

        let access_claims = AccessClaims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            iat,
            exp: iat + self.access_ttl_secs,
            iss: self.issuer.clone(),
        };
        let refresh_claims = RefreshClaims {
            sub: account.id.to_string(),
            iat,
            exp: iat + self.refresh_ttl_secs,
            iss: self.issuer.clone(),
        };

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let access_token = encode(&header, &access_claims, &key)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let refresh_token = encode(&header, &refresh_claims, &key)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
            refresh_expires_in: self.refresh_ttl_secs,
        })
    }

    pub fn verify_access(&self, token: &str, now: DateTime<Utc>) -> AppResult<AccessClaims> {
        let claims: AccessClaims = self.decode(token)?;
        if now.timestamp() >= claims.exp {
            return Err(AppError::TokenInvalid);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str, now: DateTime<Utc>) -> AppResult<RefreshClaims> {
        let claims: RefreshClaims = self.decode(token)?;
        if now.timestamp() >= claims.exp {
            return Err(AppError::TokenInvalid);
        }
        Ok(claims)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, token: &str) -> AppResult<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // Expiry is compared against the injected clock, not the system one.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<T>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::TokenInvalid)
    }
}
