use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::jwt::{AccessClaims, TokenCodec};
use crate::application::use_cases::account::AccountRepo;
use crate::domain::entities::account::{Account, AccountStatus};
use crate::infra::clock::Clock;

/// Decides whether a previously issued access token is still good against the
/// current account state. Revocation is a single watermark per account:
/// comparing the token's issuance time against `session_revoked_at` gives
/// O(1) revoke-all-sessions, at the cost of not being able to revoke one
/// session while keeping others alive.
#[derive(Clone)]
pub struct SessionGuard {
    codec: TokenCodec,
    accounts: Arc<dyn AccountRepo>,
    clock: Arc<dyn Clock>,
}

impl SessionGuard {
    pub fn new(codec: TokenCodec, accounts: Arc<dyn AccountRepo>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            accounts,
            clock,
        }
    }

    /// Full validation: signature/issuer/expiry, account existence, active
    /// status, revocation watermark.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> AppResult<AccessClaims> {
        let claims = self.codec.verify_access(token, self.clock.now())?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;
        let account = self
            .accounts
            .get_by_id(id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if account.status != AccountStatus::Active {
            return Err(AppError::AccountNotActive);
        }

        if let Some(revoked_at) = account.session_revoked_at
            && claims.iat < revoked_at.timestamp()
        {
            return Err(AppError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Convenience composition: the account behind a token, or None when the
    /// token does not validate. Store faults still propagate.
    #[instrument(skip_all)]
    pub async fn resolve_account(&self, token: &str) -> AppResult<Option<Account>> {
        let claims = match self.validate(token).await {
            Ok(claims) => claims,
            Err(AppError::Database(e)) => return Err(AppError::Database(e)),
            Err(AppError::Internal(e)) => return Err(AppError::Internal(e)),
            Err(_) => return Ok(None),
        };

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;
        self.accounts.get_by_id(id).await
    }
}
