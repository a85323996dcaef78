//! User model and database operations
//!
//! A user is either an administrator or a consigner. Consigners own parts;
//! deleting a consigner cascades to their parts at the schema level.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id BIGSERIAL PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     code VARCHAR(6) NOT NULL UNIQUE,
//!     email TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     phone_number VARCHAR(20),
//!     address_line1 VARCHAR(150),
//!     address_line2 VARCHAR(150),
//!     city VARCHAR(100),
//!     state VARCHAR(50),
//!     zip_code VARCHAR(20)
//! );
//! ```
//!
//! `code` is the short consigner identifier that appears on part listings
//! and invoices; both `code` and `email` are globally unique.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::fields::FieldValue;

/// All user columns, in the order the struct declares them.
const USER_COLUMNS: &str = "id, name, code, email, password_hash, is_admin, created_at, \
     phone_number, address_line1, address_line2, city, state, zip_code";

/// User model representing an administrator or consigner account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Short consigner code (unique)
    pub code: String,

    /// Email address (unique, compared case-insensitively)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether this user is an administrator
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// Optional contact phone number
    pub phone_number: Option<String>,

    /// Optional mailing address
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Input for creating a new user
///
/// `password_hash` must already be an Argon2id PHC string; hashing happens
/// at the route/import boundary so this layer never sees plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub code: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,

    /// Creation timestamp; `None` defaults to now (imports carry their own)
    pub created_at: Option<DateTime<Utc>>,

    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Filters for the consigner listing
///
/// All filters are optional and combine conjunctively. `name` and `code`
/// are case-insensitive substring matches; `date` matches the calendar day
/// the account was created.
#[derive(Debug, Clone, Default)]
pub struct ConsignerFilter {
    pub name: Option<String>,
    pub code: Option<String>,
    pub date: Option<NaiveDate>,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if `email` or `code` collides with an existing user
    /// (unique constraint violation) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, code, email, password_hash, is_admin, created_at,
                               phone_number, address_line1, address_line2, city, state, zip_code)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()), $7, $8, $9, $10, $11, $12)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.code)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_admin)
        .bind(data.created_at)
        .bind(data.phone_number)
        .bind(data.address_line1)
        .bind(data.address_line2)
        .bind(data.city)
        .bind(data.state)
        .bind(data.zip_code)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address, case-insensitively
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Checks whether an email is already taken by another user
    ///
    /// `exclude_id` skips a given user, for update-time uniqueness checks.
    pub async fn email_in_use(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Checks whether a consigner code is already taken by another user
    pub async fn code_in_use(
        pool: &PgPool,
        code: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE code = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Lists consigners (non-admin users), newest first
    ///
    /// Filters combine conjunctively; see [`ConsignerFilter`].
    pub async fn list_consigners(
        pool: &PgPool,
        filter: &ConsignerFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_admin = FALSE"
        );
        let mut bind_count = 0;

        if filter.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND name ILIKE ${}", bind_count));
        }
        if filter.code.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND code ILIKE ${}", bind_count));
        }
        if filter.date.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND DATE(created_at) = ${}", bind_count));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, User>(&query);

        if let Some(ref name) = filter.name {
            q = q.bind(format!("%{}%", name));
        }
        if let Some(ref code) = filter.code {
            q = q.bind(format!("%{}%", code));
        }
        if let Some(date) = filter.date {
            q = q.bind(date);
        }

        q.fetch_all(pool).await
    }

    /// Applies a single coerced field value
    ///
    /// The field name comes from [`crate::fields::CONSIGNER_FIELDS`], never
    /// from raw request input, so interpolating it into the statement is
    /// safe. `created_at` is the only date-kinded user field and is stored
    /// at midnight UTC.
    ///
    /// # Returns
    ///
    /// True if a row was updated, false if the user does not exist.
    pub async fn set_field(
        pool: &PgPool,
        id: i64,
        field: &str,
        value: &FieldValue,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("UPDATE users SET {} = $2 WHERE id = $1", field);

        let result = match value {
            FieldValue::Text(s) => sqlx::query(&query).bind(id).bind(s).execute(pool).await?,
            FieldValue::Decimal(n) => sqlx::query(&query).bind(id).bind(n).execute(pool).await?,
            FieldValue::Date(d) => {
                let at_midnight =
                    DateTime::<Utc>::from_naive_utc_and_offset(d.and_time(NaiveTime::MIN), Utc);
                sqlx::query(&query)
                    .bind(id)
                    .bind(at_midnight)
                    .execute(pool)
                    .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }

    /// Replaces a user's password hash
    pub async fn set_password(
        pool: &PgPool,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// The parts foreign key is `ON DELETE CASCADE`, so the consigner's
    /// parts go with the account.
    ///
    /// # Returns
    ///
    /// True if a user was deleted, false if the id was unknown.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create = CreateUser {
            name: "Test Consigner".to_string(),
            code: "C01".to_string(),
            email: "c01@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            is_admin: false,
            created_at: None,
            phone_number: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state: None,
            zip_code: None,
        };

        assert_eq!(create.code, "C01");
        assert!(!create.is_admin);
    }

    #[test]
    fn test_consigner_filter_default_is_empty() {
        let filter = ConsignerFilter::default();
        assert!(filter.name.is_none());
        assert!(filter.code.is_none());
        assert!(filter.date.is_none());
    }

    // CRUD paths require a running database and are exercised through the
    // API server.
}
