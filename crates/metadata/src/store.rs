//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{ChunkRow, FileRow, NodeRow, NodeUsageRow};
use crate::repos::{FileRepo, NodeRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + NodeRepo + Send + Sync {
    /// Apply the database schema.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and apply the schema.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MetadataError::Internal(format!("create db directory: {e}")))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under concurrent uploads.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn to_db_int(value: u64, what: &str) -> MetadataResult<i64> {
    i64::try_from(value)
        .map_err(|_| MetadataError::Constraint(format!("{what} {value} out of range")))
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use scatter_core::{Chunk, File, Node, NodeStat};

    #[async_trait]
    impl FileRepo for SqliteStore {
        async fn file(&self, name: &str) -> MetadataResult<File> {
            let row = sqlx::query_as::<_, FileRow>("SELECT name, size FROM files WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| MetadataError::NotFound(name.to_string()))?;

            let chunk_rows = sqlx::query_as::<_, ChunkRow>(
                r#"SELECT file, "index", id, "offset", size, node
                   FROM chunks WHERE file = ? ORDER BY "index""#,
            )
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

            if chunk_rows.is_empty() {
                return Err(MetadataError::ChunksMissing(name.to_string()));
            }

            let chunks = chunk_rows
                .into_iter()
                .map(|row| Chunk {
                    index: row.index as u32,
                    id: row.id,
                    offset: row.offset as u64,
                    size: row.size as u64,
                    node_base_url: row.node,
                })
                .collect();

            Ok(File {
                name: row.name,
                size: row.size as u64,
                chunks,
            })
        }

        async fn add_file(&self, file: &File) -> MetadataResult<()> {
            if file.name.is_empty() {
                return Err(MetadataError::Constraint(
                    "file name must not be empty".to_string(),
                ));
            }
            if file.chunks.is_empty() {
                return Err(MetadataError::Constraint(format!(
                    "file {} must have at least one chunk",
                    file.name
                )));
            }

            let size = to_db_int(file.size, "file size")?;

            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "INSERT INTO files (name, size) VALUES (?, ?)
                 ON CONFLICT(name) DO UPDATE SET size = excluded.size",
            )
            .bind(&file.name)
            .bind(size)
            .execute(&mut *tx)
            .await?;

            for chunk in &file.chunks {
                sqlx::query(
                    r#"INSERT INTO chunks (file, "index", id, "offset", size, node)
                       VALUES (?, ?, ?, ?, ?, ?)
                       ON CONFLICT(file, "index") DO UPDATE SET
                           id = excluded.id,
                           "offset" = excluded."offset",
                           size = excluded.size,
                           node = excluded.node"#,
                )
                .bind(&file.name)
                .bind(chunk.index as i64)
                .bind(chunk.id)
                .bind(to_db_int(chunk.offset, "chunk offset")?)
                .bind(to_db_int(chunk.size, "chunk size")?)
                .bind(&chunk.node_base_url)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }

        async fn remove_file(&self, name: &str) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM files WHERE name = ?")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM chunks WHERE file = ?")
                .bind(name)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl NodeRepo for SqliteStore {
        async fn nodes(&self) -> MetadataResult<Vec<Node>> {
            let rows = sqlx::query_as::<_, NodeRow>("SELECT base_url FROM nodes")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows
                .into_iter()
                .map(|row| Node {
                    base_url: row.base_url,
                })
                .collect())
        }

        async fn add_node(&self, node: &Node) -> MetadataResult<()> {
            if node.base_url.is_empty() {
                return Err(MetadataError::Constraint(
                    "node base_url must not be empty".to_string(),
                ));
            }

            sqlx::query(
                "INSERT INTO nodes (base_url) VALUES (?) ON CONFLICT(base_url) DO NOTHING",
            )
            .bind(&node.base_url)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn node_stats(&self) -> MetadataResult<Vec<NodeStat>> {
            // Every known node appears in the result, with zeros when it
            // hosts nothing.
            let mut stats: Vec<NodeStat> = self
                .nodes()
                .await?
                .into_iter()
                .map(|node| NodeStat {
                    base_url: node.base_url,
                    ..Default::default()
                })
                .collect();

            let usage = sqlx::query_as::<_, NodeUsageRow>(
                "SELECT node, COUNT(*) AS total_chunks, COALESCE(SUM(size), 0) AS total_size
                 FROM chunks GROUP BY node",
            )
            .fetch_all(&self.pool)
            .await?;

            for row in usage {
                match stats.iter_mut().find(|s| s.base_url == row.node) {
                    Some(stat) => {
                        stat.total_chunks = row.total_chunks as u64;
                        stat.total_size = row.total_size as u64;
                    }
                    None => stats.push(NodeStat {
                        base_url: row.node,
                        total_chunks: row.total_chunks as u64,
                        total_size: row.total_size as u64,
                    }),
                }
            }

            stats.sort_by_key(|stat| stat.total_size);
            Ok(stats)
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Files keyed by name
CREATE TABLE IF NOT EXISTS files (
    name TEXT PRIMARY KEY,
    size INTEGER NOT NULL
);

-- Chunks of a file, one row per byte range
CREATE TABLE IF NOT EXISTS chunks (
    file TEXT NOT NULL,
    "index" INTEGER NOT NULL,
    id BLOB NOT NULL,
    "offset" INTEGER NOT NULL,
    size INTEGER NOT NULL,
    node TEXT NOT NULL,
    PRIMARY KEY (file, "index")
);
CREATE INDEX IF NOT EXISTS idx_chunks_node ON chunks(node);

-- Registered storage nodes
CREATE TABLE IF NOT EXISTS nodes (
    base_url TEXT PRIMARY KEY
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use scatter_core::{Chunk, File, Node, split_into_chunks};
    use uuid::Uuid;

    async fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("meta.db")).await.unwrap();
        (temp, store)
    }

    fn sample_file(name: &str, size: u64, nodes: &[&str]) -> File {
        let chunks = split_into_chunks(size, nodes.len() as u32)
            .into_iter()
            .enumerate()
            .map(|(i, (offset, size))| Chunk {
                index: i as u32,
                id: Uuid::new_v4(),
                offset,
                size,
                node_base_url: nodes[i].to_string(),
            })
            .collect();
        File {
            name: name.to_string(),
            size,
            chunks,
        }
    }

    #[tokio::test]
    async fn add_file_round_trips() {
        let (_temp, store) = test_store().await;
        let file = sample_file("hello.txt", 1024, &["http://a:8080", "http://b:8080"]);

        store.add_file(&file).await.unwrap();
        let got = store.file("hello.txt").await.unwrap();

        assert_eq!(got, file);
        got.validate().unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (_temp, store) = test_store().await;
        let err = store.file("nope").await.unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }

    #[tokio::test]
    async fn file_row_without_chunks_is_distinct_error() {
        let (_temp, store) = test_store().await;
        sqlx::query("INSERT INTO files (name, size) VALUES ('orphan', 10)")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.file("orphan").await.unwrap_err();
        assert!(matches!(err, MetadataError::ChunksMissing(_)));
    }

    #[tokio::test]
    async fn add_file_is_idempotent() {
        let (_temp, store) = test_store().await;
        let file = sample_file("twice.bin", 512, &["http://a:8080", "http://b:8080"]);

        store.add_file(&file).await.unwrap();
        store.add_file(&file).await.unwrap();

        assert_eq!(store.file("twice.bin").await.unwrap(), file);
    }

    #[tokio::test]
    async fn add_file_last_writer_wins() {
        let (_temp, store) = test_store().await;
        let first = sample_file("name.bin", 512, &["http://a:8080", "http://b:8080"]);
        let second = sample_file("name.bin", 768, &["http://c:8080", "http://d:8080"]);

        store.add_file(&first).await.unwrap();
        store.add_file(&second).await.unwrap();

        assert_eq!(store.file("name.bin").await.unwrap(), second);
    }

    #[tokio::test]
    async fn add_file_rejects_empty_name_and_no_chunks() {
        let (_temp, store) = test_store().await;

        let unnamed = sample_file("", 16, &["http://a:8080"]);
        assert!(matches!(
            store.add_file(&unnamed).await.unwrap_err(),
            MetadataError::Constraint(_)
        ));

        let chunkless = File {
            name: "empty".to_string(),
            size: 0,
            chunks: Vec::new(),
        };
        assert!(matches!(
            store.add_file(&chunkless).await.unwrap_err(),
            MetadataError::Constraint(_)
        ));
    }

    #[tokio::test]
    async fn remove_file_deletes_file_and_chunks() {
        let (_temp, store) = test_store().await;
        let file = sample_file("gone.bin", 128, &["http://a:8080", "http://b:8080"]);
        store.add_file(&file).await.unwrap();

        store.remove_file("gone.bin").await.unwrap();

        assert!(matches!(
            store.file("gone.bin").await.unwrap_err(),
            MetadataError::NotFound(_)
        ));
        let leftover: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE file = ?")
            .bind("gone.bin")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(leftover, 0);

        // Absence is success.
        store.remove_file("gone.bin").await.unwrap();
    }

    #[tokio::test]
    async fn add_node_is_idempotent_upsert() {
        let (_temp, store) = test_store().await;
        let node = Node {
            base_url: "http://a:8080".to_string(),
        };

        store.add_node(&node).await.unwrap();
        store.add_node(&node).await.unwrap();

        let nodes = store.nodes().await.unwrap();
        assert_eq!(nodes, vec![node]);
    }

    #[tokio::test]
    async fn node_stats_includes_idle_nodes_and_sorts_ascending() {
        let (_temp, store) = test_store().await;
        for url in ["http://a:8080", "http://b:8080", "http://idle:8080"] {
            store
                .add_node(&Node {
                    base_url: url.to_string(),
                })
                .await
                .unwrap();
        }

        // a hosts 300 bytes in two chunks, b hosts 100 bytes in one.
        let file = File {
            name: "data.bin".to_string(),
            size: 400,
            chunks: vec![
                Chunk {
                    index: 0,
                    id: Uuid::new_v4(),
                    offset: 0,
                    size: 200,
                    node_base_url: "http://a:8080".to_string(),
                },
                Chunk {
                    index: 1,
                    id: Uuid::new_v4(),
                    offset: 200,
                    size: 100,
                    node_base_url: "http://b:8080".to_string(),
                },
                Chunk {
                    index: 2,
                    id: Uuid::new_v4(),
                    offset: 300,
                    size: 100,
                    node_base_url: "http://a:8080".to_string(),
                },
            ],
        };
        store.add_file(&file).await.unwrap();

        let stats = store.node_stats().await.unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].base_url, "http://idle:8080");
        assert_eq!((stats[0].total_chunks, stats[0].total_size), (0, 0));
        assert_eq!(stats[1].base_url, "http://b:8080");
        assert_eq!((stats[1].total_chunks, stats[1].total_size), (1, 100));
        assert_eq!(stats[2].base_url, "http://a:8080");
        assert_eq!((stats[2].total_chunks, stats[2].total_size), (2, 300));
    }

    #[tokio::test]
    async fn node_stats_drop_after_remove_file() {
        let (_temp, store) = test_store().await;
        store
            .add_node(&Node {
                base_url: "http://a:8080".to_string(),
            })
            .await
            .unwrap();
        let file = sample_file("counted.bin", 600, &["http://a:8080", "http://a:8080"]);
        store.add_file(&file).await.unwrap();

        let stats = store.node_stats().await.unwrap();
        assert_eq!(stats[0].total_size, 600);

        store.remove_file("counted.bin").await.unwrap();
        let stats = store.node_stats().await.unwrap();
        assert_eq!((stats[0].total_chunks, stats[0].total_size), (0, 0));
    }
}
