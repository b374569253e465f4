//! Generic create/read/update/delete layer over Postgres.
//!
//! Entities expose their table and column names through [`Entity`]; writes go
//! through [`Changes`], an ordered field-present list. A column missing from
//! the change list is never part of the generated SQL, which is what makes
//! partial updates leave absent fields untouched.

use std::marker::PhantomData;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::role::Role;

/// Persisted entity managed by a [`Store`].
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Table name. Must be a compile-time constant, never user input.
    const TABLE: &'static str;
    /// Columns fetched on read.
    const COLUMNS: &'static [&'static str];
    /// Stable ordering for listings.
    const ORDER_BY: &'static str;
}

/// Typed column value bound into generated SQL.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Uuid(Uuid),
    Role(Role),
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Role> for Value {
    fn from(value: Role) -> Self {
        Value::Role(value)
    }
}

/// Ordered list of `(column, value)` pairs to write.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    fields: Vec<(&'static str, Value)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `column` as present with `value`.
    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    /// Mark `column` as present only when a value was supplied.
    pub fn set_if(
        self,
        column: &'static str,
        value: Option<impl Into<Value>>,
    ) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(column, _)| *column)
    }
}

/// Paginated listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// CRUD wrapper tying an [`Entity`] to a connection pool.
#[derive(Clone)]
pub struct Store<E> {
    pool: PgPool,
    _entity: PhantomData<E>,
}

impl<E: Entity> Store<E> {
    /// Create a new [`Store`].
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a row with only the supplied columns; the database fills
    /// defaults for the rest. At least one column must be present.
    pub async fn create(&self, changes: Changes) -> Result<E> {
        if changes.is_empty() {
            return Err(ServerError::Internal {
                details: "insert with no columns".to_owned(),
            });
        }

        let mut query = build_insert::<E>(changes);

        query
            .build_query_as::<E>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sql_error)
    }

    /// Fetch a row by id.
    pub async fn get(&self, id: Uuid) -> Result<E> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            E::COLUMNS.join(", "),
            E::TABLE
        );

        sqlx::query_as::<_, E>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Merge only the supplied columns into an existing row.
    pub async fn update(&self, id: Uuid, changes: Changes) -> Result<E> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut query = build_update::<E>(id, changes);

        query
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sql_error)?
            .ok_or(ServerError::NotFound)
    }

    /// Delete a row by id.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }
        Ok(())
    }

    /// Paginated listing, 1-indexed.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Page<E>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
        let query = format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::ORDER_BY
        );

        let items = sqlx::query_as::<_, E>(&query)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", E::TABLE))
                .fetch_one(&self.pool)
                .await?;

        Ok(Page {
            items,
            page,
            per_page,
            total,
        })
    }
}

fn build_insert<E: Entity>(changes: Changes) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("INSERT INTO ");
    query.push(E::TABLE).push(" (");

    let mut separated = query.separated(", ");
    for column in changes.columns() {
        separated.push(column);
    }

    query.push(") VALUES (");
    let mut separated = query.separated(", ");
    for (_, value) in changes.fields {
        bind(&mut separated, value);
    }

    query
        .push(") RETURNING ")
        .push(E::COLUMNS.join(", "));
    query
}

fn build_update<E: Entity>(
    id: Uuid,
    changes: Changes,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE ");
    query.push(E::TABLE).push(" SET ");

    let mut separated = query.separated(", ");
    for (column, value) in changes.fields {
        separated.push(column).push_unseparated(" = ");
        bind_unseparated(&mut separated, value);
    }

    query.push(" WHERE id = ").push_bind(id);
    query
        .push(" RETURNING ")
        .push(E::COLUMNS.join(", "));
    query
}

fn bind(
    separated: &mut Separated<'_, 'static, Postgres, &'static str>,
    value: Value,
) {
    match value {
        Value::Text(v) => separated.push_bind(v),
        Value::Bool(v) => separated.push_bind(v),
        Value::Date(v) => separated.push_bind(v),
        Value::Uuid(v) => separated.push_bind(v),
        Value::Role(v) => separated.push_bind(v),
    };
}

fn bind_unseparated(
    separated: &mut Separated<'_, 'static, Postgres, &'static str>,
    value: Value,
) {
    match value {
        Value::Text(v) => separated.push_bind_unseparated(v),
        Value::Bool(v) => separated.push_bind_unseparated(v),
        Value::Date(v) => separated.push_bind_unseparated(v),
        Value::Uuid(v) => separated.push_bind_unseparated(v),
        Value::Role(v) => separated.push_bind_unseparated(v),
    };
}

/// Translate low-level SQL failures into the API error taxonomy.
pub(crate) fn map_sql_error(err: sqlx::Error) -> ServerError {
    match &err {
        sqlx::Error::RowNotFound => ServerError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServerError::Conflict(
                "A resource with the same unique field already exists."
                    .to_owned(),
            )
        },
        _ => ServerError::Sql(err),
    }
}
