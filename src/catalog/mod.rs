//! Book catalog
//!
//! A small slug-keyed table that remembers where each book's PDF lives so
//! the resolver does not have to re-derive and re-probe it on every visit.

mod types;

pub use types::{CatalogError, DocumentReference};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Slug-keyed document catalog
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Exact-match lookup by slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<DocumentReference>, CatalogError>;

    /// Insert a reference unless its slug is already present
    async fn insert_if_absent(&self, reference: &DocumentReference) -> Result<(), CatalogError>;

    /// Insert a reference, replacing URL and title of an existing slug
    async fn upsert(&self, reference: &DocumentReference) -> Result<(), CatalogError>;

    /// Number of rows in the catalog
    async fn count(&self) -> Result<usize, CatalogError>;
}

/// SQLite-backed catalog over the `books` table
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalog for SqliteCatalog {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<DocumentReference>, CatalogError> {
        let reference = sqlx::query_as::<_, DocumentReference>(
            r#"
            SELECT slug, file_url, title
            FROM books
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reference)
    }

    async fn insert_if_absent(&self, reference: &DocumentReference) -> Result<(), CatalogError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO books (slug, file_url, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO NOTHING
            "#,
        )
        .bind(&reference.slug)
        .bind(&reference.source_url)
        .bind(&reference.title)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert(&self, reference: &DocumentReference) -> Result<(), CatalogError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO books (slug, file_url, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                file_url = excluded.file_url,
                title = excluded.title,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&reference.slug)
        .bind(&reference.source_url)
        .bind(&reference.title)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<usize, CatalogError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn catalog() -> SqliteCatalog {
        SqliteCatalog::new(create_pool("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_find_missing_slug() {
        let catalog = catalog().await;
        assert_eq!(catalog.find_by_slug("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first_row() {
        let catalog = catalog().await;
        let first = DocumentReference::new("trip-journal", "https://cdn.example/trip.pdf", "Trip Journal");
        let second = DocumentReference::new("trip-journal", "https://cdn.example/other.pdf", "Other");

        catalog.insert_if_absent(&first).await.unwrap();
        catalog.insert_if_absent(&second).await.unwrap();

        assert_eq!(catalog.count().await.unwrap(), 1);
        assert_eq!(
            catalog.find_by_slug("trip-journal").await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_upsert_replaces_url_and_title() {
        let catalog = catalog().await;
        let original = DocumentReference::new("iceland", "https://cdn.example/a.pdf", "Iceland");
        let updated = DocumentReference::new("iceland", "https://cdn.example/b.pdf", "Iceland 2024");

        catalog.upsert(&original).await.unwrap();
        catalog.upsert(&updated).await.unwrap();

        assert_eq!(catalog.count().await.unwrap(), 1);
        assert_eq!(catalog.find_by_slug("iceland").await.unwrap(), Some(updated));
    }
}
