//! `BookStore` backed by a PostgreSQL `books` table.

use crate::domain::book::{BookRecord, StoredBook};
use crate::storage::{BookStore, StoreError, StoreResult, UpsertOutcome};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

const CREATE_BOOKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS books (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    price TEXT NOT NULL,
    availability TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// A persistent book store that uses a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresBookStore {
    pool: PgPool,
}

impl PostgresBookStore {
    /// Connects and creates the `books` table if it does not exist yet.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::new_with_pool(pool).await
    }

    pub async fn new_with_pool(pool: PgPool) -> anyhow::Result<Self> {
        sqlx::query(CREATE_BOOKS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

/// Identifiers are BIGSERIAL values rendered as strings.
fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse::<i64>().ok()
}

fn row_to_book(row: &PgRow) -> Result<StoredBook, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    Ok(StoredBook {
        id: id.to_string(),
        title: row.try_get("title")?,
        price: row.try_get("price")?,
        availability: row.try_get("availability")?,
    })
}

fn title_conflict(err: sqlx::Error, title: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateTitle(title.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl BookStore for PostgresBookStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<StoredBook>> {
        let rows = sqlx::query("SELECT id, title, price, availability FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            books.push(row_to_book(&row)?);
        }
        Ok(books)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<StoredBook>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT id, title, price, availability FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_book).transpose()?)
    }

    async fn insert(&self, record: &BookRecord) -> StoreResult<StoredBook> {
        let row = sqlx::query(
            "INSERT INTO books (title, price, availability) VALUES ($1, $2, $3)
             RETURNING id, title, price, availability",
        )
        .bind(&record.title)
        .bind(&record.price)
        .bind(&record.availability)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| title_conflict(e, &record.title))?;
        Ok(row_to_book(&row)?)
    }

    async fn replace(&self, id: &str, record: &BookRecord) -> StoreResult<Option<StoredBook>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query(
            "UPDATE books SET title = $2, price = $3, availability = $4, updated_at = now()
             WHERE id = $1
             RETURNING id, title, price, availability",
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.price)
        .bind(&record.availability)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| title_conflict(e, &record.title))?;
        Ok(row.as_ref().map(row_to_book).transpose()?)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_by_title(&self, record: &BookRecord) -> StoreResult<UpsertOutcome> {
        // xmax is 0 only for a freshly inserted tuple.
        let row = sqlx::query(
            "INSERT INTO books (title, price, availability) VALUES ($1, $2, $3)
             ON CONFLICT (title) DO UPDATE
               SET price = EXCLUDED.price, availability = EXCLUDED.availability, updated_at = now()
             RETURNING id, title, price, availability, (xmax = 0) AS inserted",
        )
        .bind(&record.title)
        .bind(&record.price)
        .bind(&record.availability)
        .fetch_one(&self.pool)
        .await?;

        let book = row_to_book(&row)?;
        let inserted: bool = row.try_get("inserted")?;
        Ok(if inserted {
            UpsertOutcome::Inserted(book)
        } else {
            UpsertOutcome::Updated(book)
        })
    }
}
