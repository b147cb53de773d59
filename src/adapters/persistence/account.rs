use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::account::{AccountRepo, NewAccount},
    domain::entities::account::{Account, AccountStatus, OtpChannel},
};

// Account row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
struct AccountDb {
    id: Uuid,
    email: String,
    phone: String,
    password_hash: String,
    password_salt: String,
    status: String,
    email_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    phone_verified: bool,
    phone_verified_at: Option<DateTime<Utc>>,
    is_admin: bool,
    otp_code: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    otp_channel: Option<String>,
    otp_attempts: i32,
    access_token: Option<String>,
    password_reset_token_hash: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    session_revoked_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

const ACCOUNT_COLUMNS: &str = "id, email, phone, password_hash, password_salt, status, \
     email_verified, email_verified_at, phone_verified, phone_verified_at, is_admin, \
     otp_code, otp_expires_at, otp_channel, otp_attempts, access_token, \
     password_reset_token_hash, password_reset_expires_at, session_revoked_at, \
     created_at, updated_at";

impl TryFrom<AccountDb> for Account {
    type Error = AppError;

    fn try_from(row: AccountDb) -> Result<Self, Self::Error> {
        let status: AccountStatus = row
            .status
            .parse()
            .map_err(|_| AppError::Database(format!("unknown account status: {}", row.status)))?;
        let otp_channel = row
            .otp_channel
            .as_deref()
            .map(|c| {
                c.parse::<OtpChannel>()
                    .map_err(|_| AppError::Database(format!("unknown otp channel: {c}")))
            })
            .transpose()?;

        Ok(Account {
            id: row.id,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            password_salt: row.password_salt,
            status,
            email_verified: row.email_verified,
            email_verified_at: row.email_verified_at,
            phone_verified: row.phone_verified,
            phone_verified_at: row.phone_verified_at,
            is_admin: row.is_admin,
            otp_code: row.otp_code,
            otp_expires_at: row.otp_expires_at,
            otp_channel,
            otp_attempts: row.otp_attempts,
            access_token: row.access_token,
            password_reset_token_hash: row.password_reset_token_hash,
            password_reset_expires_at: row.password_reset_expires_at,
            session_revoked_at: row.session_revoked_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PostgresPersistence {
    async fn fetch_account_where(
        &self,
        predicate: &str,
        bind: &str,
    ) -> AppResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {predicate}");
        let row = sqlx::query_as::<_, AccountDb>(&query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.map(Account::try_from).transpose()
    }
}

#[async_trait]
impl AccountRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountDb>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.map(Account::try_from).transpose()
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        self.fetch_account_where("email = $1", email).await
    }

    async fn get_by_phone(&self, phone: &str) -> AppResult<Option<Account>> {
        self.fetch_account_where("phone = $1", phone).await
    }

    async fn create(&self, new: NewAccount) -> AppResult<Account> {
        let query = format!(
            "INSERT INTO accounts (id, email, phone, password_hash, password_salt, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountDb>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.password_hash)
            .bind(&new.password_salt)
            .bind(AccountStatus::Inactive.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.try_into()
    }

    async fn store_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
        channel: OtpChannel,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET otp_code = $2, otp_expires_at = $3, otp_channel = $4, \
             otp_attempts = 0, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .bind(channel.to_string())
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn bump_otp_attempts(&self, id: Uuid, attempts: i32) -> AppResult<()> {
        sqlx::query("UPDATE accounts SET otp_attempts = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(attempts)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn clear_otp(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET otp_code = NULL, otp_expires_at = NULL, otp_attempts = 0, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn activate(
        &self,
        id: Uuid,
        channel: OtpChannel,
        verified_at: DateTime<Utc>,
    ) -> AppResult<Account> {
        let verified_column = match channel {
            OtpChannel::Email => "email_verified = TRUE, email_verified_at = $2",
            OtpChannel::Sms => "phone_verified = TRUE, phone_verified_at = $2",
        };
        let query = format!(
            "UPDATE accounts SET status = 'active', {verified_column}, updated_at = now() \
             WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountDb>(&query)
            .bind(id)
            .bind(verified_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?
            .ok_or(AppError::AccountNotFound)?;
        row.try_into()
    }

    async fn store_access_token(&self, id: Uuid, token: &str) -> AppResult<()> {
        sqlx::query("UPDATE accounts SET access_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn revoke_sessions(&self, id: Uuid, revoked_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET access_token = NULL, session_revoked_at = $2, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(revoked_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn store_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET password_reset_token_hash = $2, password_reset_expires_at = $3, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn get_by_active_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE password_reset_token_hash = $1 AND password_reset_expires_at > $2"
        );
        let row = sqlx::query_as::<_, AccountDb>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.map(Account::try_from).transpose()
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
        password_salt: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        // Conditional on the stored hash still matching: a concurrent
        // consumer that already cleared the token makes this a no-op.
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $3, password_salt = $4, \
             password_reset_token_hash = NULL, password_reset_expires_at = NULL, \
             session_revoked_at = $5, updated_at = now() \
             WHERE id = $1 AND password_reset_token_hash = $2",
        )
        .bind(id)
        .bind(token_hash)
        .bind(password_hash)
        .bind(password_salt)
        .bind(revoked_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET password_hash = $2, password_salt = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(password_salt)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
