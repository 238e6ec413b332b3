//! Namespace-partitioned vector storage and similarity search using sqlite-vec.
//!
//! A [`VectorIndex`] stores `(namespace, id) → (embedding, text, context)`
//! and answers k-nearest-neighbour queries within a single namespace. It is
//! backed by one SQLite file (WAL mode) holding two tables:
//!
//! ```text
//! documents            payload: namespace, id, text, context JSON
//! document_embeddings  vec0 virtual table, namespace partition key,
//!                      cosine distance
//! ```
//!
//! Namespaces are created implicitly on first write. Search never crosses
//! namespaces: the vec0 partition key constrains the KNN scan itself, not
//! a post-filter.

pub mod error;

pub use error::{IndexError, Result};

use rusqlite::{Connection, params};
use serde_json::{Map, Value};
use tracing::{debug, info};
use zerocopy::IntoBytes;

use mnemo_types::{SearchHit, validate_namespace};

/// Separator between namespace and id in the vec0 primary key.
const KEY_SEP: char = '\u{1f}';

/// Register the sqlite-vec extension for all future connections.
///
/// Must be called before opening any index. `sqlite3_auto_extension`
/// applies process-wide, so repeated calls are harmless.
pub fn init_vector_extension() {
    use rusqlite::ffi::sqlite3_auto_extension;
    use sqlite_vec::sqlite3_vec_init;

    unsafe {
        #[allow(clippy::missing_transmute_annotations)]
        sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
    }
}

/// A namespace-partitioned vector index.
pub struct VectorIndex {
    conn: Connection,
    dims: usize,
}

impl VectorIndex {
    /// Open or create an index at the given path.
    pub fn open(path: impl AsRef<std::path::Path>, dims: usize) -> Result<Self> {
        init_vector_extension();
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let index = Self { conn, dims };
        index.init_schema()?;
        info!(path = %path.as_ref().display(), dims, "opened vector index");
        Ok(index)
    }

    /// Open an in-memory index (tests, ephemeral runs).
    pub fn open_in_memory(dims: usize) -> Result<Self> {
        init_vector_extension();
        let conn = Connection::open_in_memory()?;
        let index = Self { conn, dims };
        index.init_schema()?;
        Ok(index)
    }

    /// Dimensions this index was created with.
    pub fn dimensions(&self) -> usize {
        self.dims
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                namespace TEXT NOT NULL,
                id        TEXT NOT NULL,
                text      TEXT NOT NULL,
                context   TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (namespace, id)
            )
            "#,
        )?;

        let vec_sql = format!(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS document_embeddings USING vec0(
                doc_key TEXT PRIMARY KEY,
                namespace TEXT partition key,
                embedding float[{}] distance_metric=cosine
            )
            "#,
            self.dims
        );
        self.conn.execute_batch(&vec_sql)?;
        Ok(())
    }

    fn doc_key(namespace: &str, id: &str) -> String {
        format!("{namespace}{KEY_SEP}{id}")
    }

    /// Insert or overwrite a document.
    ///
    /// Idempotent by `(namespace, id)`: re-indexing replaces the stored
    /// vector and payload without growing the namespace. The namespace is
    /// created implicitly.
    pub fn upsert(
        &mut self,
        namespace: &str,
        id: &str,
        embedding: &[f32],
        text: &str,
        context: &Map<String, Value>,
    ) -> Result<()> {
        validate_namespace(namespace)?;
        if embedding.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: embedding.len(),
            });
        }

        let key = Self::doc_key(namespace, id);
        let context_json = serde_json::to_string(context)?;

        // vec0 doesn't support INSERT OR REPLACE, so delete first.
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM document_embeddings WHERE doc_key = ?1",
            params![key],
        )?;
        tx.execute(
            "INSERT INTO document_embeddings (doc_key, namespace, embedding) VALUES (?1, ?2, ?3)",
            params![key, namespace, embedding.as_bytes()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO documents (namespace, id, text, context) VALUES (?1, ?2, ?3, ?4)",
            params![namespace, id, text, context_json],
        )?;
        tx.commit()?;

        debug!(namespace, id, "upserted document");
        Ok(())
    }

    /// Search a namespace for the `top_k` nearest documents.
    ///
    /// Scores are cosine similarity clamped to `[0, 1]`; results are
    /// filtered to `score >= min_score` and ordered by descending score.
    /// An absent or empty namespace yields an empty list.
    pub fn search(
        &self,
        namespace: &str,
        query: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        validate_namespace(namespace)?;
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        // KNN scan first; payload lookup per hit second. vec0 KNN queries
        // only support MATCH + partition constraints.
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doc_key, distance
            FROM document_embeddings
            WHERE embedding MATCH ?1
              AND namespace = ?2
            ORDER BY distance
            LIMIT ?3
            "#,
        )?;

        let mut rows = stmt.query(params![query.as_bytes(), namespace, top_k as i64])?;
        let mut scored: Vec<(String, f32)> = Vec::new();
        while let Some(row) = rows.next()? {
            let doc_key: String = row.get(0)?;
            let distance: f32 = row.get(1)?;
            let score = (1.0 - distance).clamp(0.0, 1.0);
            if score < min_score {
                continue;
            }
            let id = doc_key
                .split_once(KEY_SEP)
                .map(|(_, id)| id.to_string())
                .unwrap_or(doc_key);
            scored.push((id, score));
        }

        let mut hits = Vec::with_capacity(scored.len());
        for (id, score) in scored {
            let (text, context_json): (String, String) = self.conn.query_row(
                "SELECT text, context FROM documents WHERE namespace = ?1 AND id = ?2",
                params![namespace, id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            hits.push(SearchHit {
                id,
                text,
                score,
                context: serde_json::from_str(&context_json).unwrap_or_default(),
            });
        }

        debug!(namespace, hits = hits.len(), top_k, "vector search");
        Ok(hits)
    }

    /// Remove every document in a namespace. No-op if the namespace is
    /// absent.
    pub fn clear(&mut self, namespace: &str) -> Result<()> {
        validate_namespace(namespace)?;

        // vec0 deletes go by primary key, so collect the ids first.
        let ids: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM documents WHERE namespace = ?1")?;
            let rows = stmt.query_map(params![namespace], |row| row.get::<_, String>(0))?;
            rows.collect::<std::result::Result<_, _>>()?
        };

        let tx = self.conn.transaction()?;
        for id in &ids {
            tx.execute(
                "DELETE FROM document_embeddings WHERE doc_key = ?1",
                params![Self::doc_key(namespace, id)],
            )?;
        }
        tx.execute("DELETE FROM documents WHERE namespace = ?1", params![namespace])?;
        tx.commit()?;

        info!(namespace, removed = ids.len(), "cleared namespace");
        Ok(())
    }

    /// Number of documents stored in a namespace.
    pub fn count(&self, namespace: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE namespace = ?1",
            params![namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Namespaces currently holding at least one document.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT namespace FROM documents ORDER BY namespace")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for ns in rows {
            out.push(ns?);
        }
        Ok(out)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
