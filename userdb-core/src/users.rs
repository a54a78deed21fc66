//! User resource access
//!
//! Every operation issues exactly one statement through the injected
//! [`StatementExecutor`] and maps its outcome:
//! - list / get: rows → users, zero rows on get → `NotFound`
//! - create: generated id, store rejection → `InvalidInput`
//! - update / delete: zero affected rows → `NotFound`
//!
//! Nothing is cached between calls; the store is the only source of truth.
//! Concurrent writes to one id are not serialized here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::{ExecOutcome, Row, SqlValue, StatementExecutor};
use crate::error::{AccessError, Result, StoreError};

// Only the mapped columns are selected: other columns in the table may have
// types the `Any` driver cannot decode (TIMESTAMP, DECIMAL, ENUM, ...).
pub const LIST_USERS: &str = "SELECT id, username, email FROM users";
pub const GET_USER: &str = "SELECT id, username, email FROM users WHERE id = ?";
pub const INSERT_USER: &str = "INSERT INTO users (username, email) VALUES (?, ?)";
pub const UPDATE_USER: &str = "UPDATE users SET username = ?, email = ? WHERE id = ?";
pub const DELETE_USER: &str = "DELETE FROM users WHERE id = ?";

/// A persisted user. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl TryFrom<&Row> for User {
    type Error = StoreError;

    fn try_from(row: &Row) -> std::result::Result<Self, Self::Error> {
        let id = row
            .get("id")
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| StoreError::statement("row has no integer 'id' column"))?;
        Ok(Self {
            id,
            username: text_column(row, "username")?,
            email: text_column(row, "email")?,
        })
    }
}

/// Numbers stored in a text column are read back as their text.
fn text_column(row: &Row, name: &str) -> std::result::Result<String, StoreError> {
    match row.get(name) {
        Some(SqlValue::Null) | None => Err(StoreError::statement(format!(
            "row has no text '{}' column",
            name
        ))),
        Some(value) => Ok(value.to_string()),
    }
}

/// Fields written by create and update.
///
/// Neither type nor presence is checked here: values are bound as received,
/// an absent field is bound as NULL, and the store's column constraints decide
/// what is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub username: Option<SqlValue>,
    #[serde(default)]
    pub email: Option<SqlValue>,
}

impl UserInput {
    pub fn new(username: impl Into<SqlValue>, email: impl Into<SqlValue>) -> Self {
        Self {
            username: Some(username.into()),
            email: Some(email.into()),
        }
    }

    /// Read `username` and `email` from a JSON request body.
    ///
    /// Anything other than a JSON object carries no fields, so both bind as NULL.
    pub fn from_json(body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(mut fields) => Self {
                username: fields.remove("username").map(SqlValue::from),
                email: fields.remove("email").map(SqlValue::from),
            },
            _ => Self::default(),
        }
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
}

/// The five user operations over an injected executor.
#[derive(Clone)]
pub struct UserHandler {
    store: Arc<dyn StatementExecutor>,
}

impl UserHandler {
    pub fn new(store: Arc<dyn StatementExecutor>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn StatementExecutor> {
        &self.store
    }

    /// All users in store order.
    #[tracing::instrument(name = "users.list", skip(self))]
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = self.query(LIST_USERS, &[]).await?;
        rows.iter()
            .map(|row| User::try_from(row).map_err(AccessError::from))
            .collect()
    }

    /// One user by id. The id is passed to the store as given.
    #[tracing::instrument(name = "users.get", skip(self))]
    pub async fn get(&self, id: &str) -> Result<User> {
        let rows = self.query(GET_USER, &[SqlValue::from(id)]).await?;
        match rows.first() {
            Some(row) => User::try_from(row).map_err(AccessError::from),
            None => Err(AccessError::not_found(id)),
        }
    }

    /// Insert a user and return the store-assigned id.
    #[tracing::instrument(name = "users.create", skip(self, input))]
    pub async fn create(&self, input: UserInput) -> Result<CreatedUser> {
        let params = [SqlValue::from(input.username), SqlValue::from(input.email)];
        let outcome = self
            .store
            .execute(INSERT_USER, &params)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "create rejected");
                AccessError::from_write(e)
            })?;

        let id = outcome.last_insert_id().ok_or_else(|| AccessError::StatementError {
            message: "insert succeeded but the store returned no generated id".into(),
        })?;
        tracing::info!(id, "user created");
        Ok(CreatedUser { id })
    }

    /// Overwrite both fields of an existing user.
    ///
    /// Zero affected rows means `NotFound`. The affected-row count is the only
    /// signal, so a store that ever reports zero for an existing row would be
    /// indistinguishable from a missing id; no extra read is made to tell them apart.
    #[tracing::instrument(name = "users.update", skip(self, input))]
    pub async fn update(&self, id: &str, input: UserInput) -> Result<()> {
        let params = [
            SqlValue::from(input.username),
            SqlValue::from(input.email),
            SqlValue::from(id),
        ];
        let outcome = self
            .store
            .execute(UPDATE_USER, &params)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "update rejected");
                AccessError::from_write(e)
            })?;
        expect_affected(outcome, id)
    }

    #[tracing::instrument(name = "users.delete", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let outcome = self
            .store
            .execute(DELETE_USER, &[SqlValue::from(id)])
            .await?;
        expect_affected(outcome, id)
    }

    async fn query(&self, template: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.store
            .execute(template, params)
            .await?
            .rows()
            .ok_or_else(|| AccessError::StatementError {
                message: format!("statement returned no result set: {}", template),
            })
    }
}

fn expect_affected(outcome: ExecOutcome, id: &str) -> Result<()> {
    match outcome.affected_rows() {
        Some(0) => Err(AccessError::not_found(id)),
        Some(_) => Ok(()),
        None => Err(AccessError::StatementError {
            message: "mutation returned a result set".into(),
        }),
    }
}
