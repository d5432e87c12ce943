//! The SQLite-backed selector cache.
//!
//! One row per distinct URL, one HTML blob per distinct page payload, and
//! at most one selector row per `(url, value)` pair. Occurrence counts and
//! context snippets are overwritten on every re-extraction, never
//! accumulated.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::StoreError;
use crate::extract::DiscoveredSelector;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS htmls (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS urls (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        value TEXT NOT NULL UNIQUE,
        html_id INTEGER NOT NULL REFERENCES htmls(id)
    )",
    "CREATE TABLE IF NOT EXISTS selectors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url_id INTEGER NOT NULL REFERENCES urls(id),
        value TEXT NOT NULL,
        occurrences INTEGER NOT NULL,
        context TEXT NOT NULL,
        UNIQUE(url_id, value)
    )",
];

/// One cached selector for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRecord {
    /// The URL the selector was discovered on.
    pub url: String,
    /// The selector string.
    pub value: String,
    /// Match count from the most recent extraction.
    pub occurrences: i64,
    /// HTML context around the first match.
    pub context: String,
}

/// Connection pool plus the four cache operations.
#[derive(Debug, Clone)]
pub struct SelectorStore {
    pool: SqlitePool,
}

impl SelectorStore {
    /// Opens (creating if missing) the cache database at `path`.
    ///
    /// WAL journal mode so cache reads and an in-flight extraction write
    /// do not block each other.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created or the schema cannot be
    /// applied.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| StoreError::new("open", sqlx::Error::Io(error)))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|source| StoreError::new("open", source))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::new("open", source))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|source| StoreError::new("schema", source))?;
        }
        Ok(Self { pool })
    }

    /// Returns the cached selectors for `url` whose occurrence count meets
    /// `min_occurrences`, most frequent first.
    pub async fn selectors_by_min_occurrence(
        &self,
        url: &str,
        min_occurrences: i64,
    ) -> Result<Vec<SelectorRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT u.value AS url, s.value, s.occurrences, s.context
             FROM selectors s
             JOIN urls u ON u.id = s.url_id
             WHERE u.value = ? AND s.occurrences >= ?
             ORDER BY s.occurrences DESC, s.value",
        )
        .bind(url)
        .bind(min_occurrences)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::new("selector query", source))?;

        Ok(rows
            .into_iter()
            .map(|row| SelectorRecord {
                url: row.get("url"),
                value: row.get("value"),
                occurrences: row.get("occurrences"),
                context: row.get("context"),
            })
            .collect())
    }

    /// Returns the cached cleaned page for `url`, if one has been stored.
    pub async fn html_for_url(&self, url: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT h.value FROM htmls h JOIN urls u ON u.html_id = h.id WHERE u.value = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| StoreError::new("html query", source))?;
        Ok(row.map(|row| row.get("value")))
    }

    /// Persists one extraction cycle: the cleaned page, the URL row, and
    /// every discovered selector, in a single transaction. A crash mid-way
    /// leaves no URL row without its page.
    pub async fn persist_extraction(
        &self,
        url: &str,
        html: &str,
        selectors: &[DiscoveredSelector],
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| StoreError::new("begin", source))?;

        let existing: Option<i64> = sqlx::query("SELECT id FROM htmls WHERE value = ?")
            .bind(html)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|source| StoreError::new("html lookup", source))?
            .map(|row| row.get(0));
        let html_id = match existing {
            Some(id) => id,
            None => sqlx::query("INSERT INTO htmls (value) VALUES (?)")
                .bind(html)
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::new("html insert", source))?
                .last_insert_rowid(),
        };

        let url_id: i64 = sqlx::query(
            "INSERT INTO urls (value, html_id) VALUES (?, ?)
             ON CONFLICT(value) DO UPDATE SET html_id = excluded.html_id
             RETURNING id",
        )
        .bind(url)
        .bind(html_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|source| StoreError::new("url upsert", source))?
        .get(0);

        for selector in selectors {
            sqlx::query(
                "INSERT INTO selectors (url_id, value, occurrences, context)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(url_id, value) DO UPDATE SET
                     occurrences = excluded.occurrences,
                     context = excluded.context",
            )
            .bind(url_id)
            .bind(&selector.value)
            .bind(selector.occurrences)
            .bind(&selector.context)
            .execute(&mut *tx)
            .await
            .map_err(|source| StoreError::new("selector upsert", source))?;
        }

        tx.commit()
            .await
            .map_err(|source| StoreError::new("commit", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(value: &str, occurrences: i64) -> DiscoveredSelector {
        DiscoveredSelector {
            value: value.to_string(),
            occurrences,
            context: format!("<context for {value}>"),
        }
    }

    async fn temp_store(dir: &tempfile::TempDir) -> SelectorStore {
        SelectorStore::open(&dir.path().join("selectors.sqlite"))
            .await
            .expect("open store")
    }

    #[tokio::test]
    async fn persists_and_reads_back_selectors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;
        store
            .persist_extraction(
                "https://example.com",
                "<html></html>",
                &[discovered("html>body>td", 3), discovered("html>body>th", 1)],
            )
            .await
            .expect("persist");

        let all = store
            .selectors_by_min_occurrence("https://example.com", 1)
            .await
            .expect("query");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, "html>body>td");
        assert_eq!(all[0].occurrences, 3);

        let frequent = store
            .selectors_by_min_occurrence("https://example.com", 2)
            .await
            .expect("query");
        assert_eq!(frequent.len(), 1);
    }

    #[tokio::test]
    async fn reextraction_upserts_instead_of_duplicating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;
        let url = "https://example.com";

        store
            .persist_extraction(url, "<html>v1</html>", &[discovered("td", 2)])
            .await
            .expect("first persist");
        store
            .persist_extraction(url, "<html>v2</html>", &[discovered("td", 5)])
            .await
            .expect("second persist");

        let records = store
            .selectors_by_min_occurrence(url, 1)
            .await
            .expect("query");
        assert_eq!(records.len(), 1, "no duplicate (url, value) rows");
        assert_eq!(records[0].occurrences, 5, "occurrences overwritten, not summed");

        let html = store.html_for_url(url).await.expect("html").expect("some");
        assert_eq!(html, "<html>v2</html>");
    }

    #[tokio::test]
    async fn identical_pages_share_one_html_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;

        store
            .persist_extraction("https://a.example", "<html>same</html>", &[])
            .await
            .expect("persist a");
        store
            .persist_extraction("https://b.example", "<html>same</html>", &[])
            .await
            .expect("persist b");

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM htmls")
            .fetch_one(&store.pool)
            .await
            .expect("count")
            .get("n");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn unknown_url_has_no_html_or_selectors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;
        assert!(store
            .html_for_url("https://nowhere.example")
            .await
            .expect("query")
            .is_none());
        assert!(store
            .selectors_by_min_occurrence("https://nowhere.example", 1)
            .await
            .expect("query")
            .is_empty());
    }
}
