//! SQLite wikis table

use super::{WikiDatabase, WikiListing, WikiRecord};
use crate::Result;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;

const WIKI_COLUMNS: &str = r#"
    wiki_dbname, wiki_dbcluster, wiki_sitename, wiki_language, wiki_creation,
    wiki_category, wiki_url, wiki_private, wiki_closed_timestamp,
    wiki_inactive_exempt, wiki_inactive_timestamp, wiki_deleted
"#;

/// Read-only handle on the `cw_wikis` table
pub struct SqliteWikiDatabase {
    conn: Connection,
}

impl SqliteWikiDatabase {
    /// Open an existing database read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening wikis database");

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self { conn })
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the database file and the `cw_wikis` table if missing
    pub fn initialize(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Initializing wikis database");

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)
    }

    /// Create the `cw_wikis` table on `conn`
    pub fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cw_wikis (
                wiki_dbname TEXT PRIMARY KEY,
                wiki_dbcluster TEXT NOT NULL DEFAULT 'c1',
                wiki_sitename TEXT NOT NULL,
                wiki_language TEXT NOT NULL DEFAULT 'en',
                wiki_creation TEXT NOT NULL,
                wiki_category TEXT NOT NULL DEFAULT 'uncategorised',
                wiki_url TEXT,
                wiki_private INTEGER NOT NULL DEFAULT 0,
                wiki_closed_timestamp TEXT,
                wiki_inactive_exempt INTEGER NOT NULL DEFAULT 0,
                wiki_inactive_timestamp TEXT,
                wiki_deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_cw_wikis_deleted ON cw_wikis(wiki_deleted);
            "#,
        )?;

        Ok(())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<WikiRecord> {
    Ok(WikiRecord {
        dbname: row.get(0)?,
        dbcluster: row.get(1)?,
        sitename: row.get(2)?,
        language: row.get(3)?,
        creation: row.get(4)?,
        category: row.get(5)?,
        url: row.get(6)?,
        private: row.get(7)?,
        closed_timestamp: row.get(8)?,
        inactive_exempt: row.get(9)?,
        inactive_timestamp: row.get(10)?,
        deleted: row.get(11)?,
    })
}

impl WikiDatabase for SqliteWikiDatabase {
    fn server_time(&self) -> Result<i64> {
        let now: i64 = self.conn.query_row(
            "SELECT CAST(strftime('%Y%m%d%H%M%S', 'now') AS INTEGER)",
            [],
            |row| row.get(0),
        )?;

        Ok(now)
    }

    fn all_wikis(&self) -> Result<Vec<WikiListing>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wiki_dbname, wiki_dbcluster, wiki_sitename, wiki_url, wiki_deleted
            FROM cw_wikis
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(WikiListing {
                dbname: row.get(0)?,
                dbcluster: row.get(1)?,
                sitename: row.get(2)?,
                url: row.get(3)?,
                deleted: row.get(4)?,
            })
        })?;

        let mut wikis = Vec::new();
        for row in rows {
            wikis.push(row?);
        }

        tracing::debug!(wikis = wikis.len(), "Loaded farm wiki list");
        Ok(wikis)
    }

    fn wiki(&self, dbname: &str) -> Result<Option<WikiRecord>> {
        let sql = format!("SELECT {} FROM cw_wikis WHERE wiki_dbname = ?", WIKI_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, [dbname], record_from_row)
            .optional()?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        SqliteWikiDatabase::init_schema(&conn).unwrap();
        conn.execute(
            r#"
            INSERT INTO cw_wikis (
                wiki_dbname, wiki_dbcluster, wiki_sitename, wiki_language, wiki_creation,
                wiki_category, wiki_url, wiki_private, wiki_closed_timestamp,
                wiki_inactive_exempt, wiki_inactive_timestamp, wiki_deleted
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                "testwiki",
                "c2",
                "Test Wiki",
                "de",
                "20230405060708",
                "gaming",
                "test.example.org",
                true,
                "20240101000000",
                false,
                Option::<String>::None,
                false,
            ],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO cw_wikis (wiki_dbname, wiki_sitename, wiki_creation, wiki_deleted) VALUES (?, ?, ?, ?)",
            params!["oldwiki", "Old Wiki", "20200101000000", true],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_wiki_lookup() {
        let db = SqliteWikiDatabase::from_connection(seeded_connection());

        let record = db.wiki("testwiki").unwrap().unwrap();
        assert_eq!(record.dbcluster, "c2");
        assert_eq!(record.language, "de");
        assert_eq!(record.url.as_deref(), Some("test.example.org"));
        assert!(record.private);
        assert_eq!(record.closed_timestamp.as_deref(), Some("20240101000000"));
        assert!(record.inactive_timestamp.is_none());

        assert!(db.wiki("missingwiki").unwrap().is_none());
    }

    #[test]
    fn test_all_wikis_includes_deleted() {
        let db = SqliteWikiDatabase::from_connection(seeded_connection());

        let mut wikis = db.all_wikis().unwrap();
        wikis.sort_by(|a, b| a.dbname.cmp(&b.dbname));

        assert_eq!(wikis.len(), 2);
        assert_eq!(wikis[0].dbname, "oldwiki");
        assert!(wikis[0].deleted);
        assert_eq!(wikis[0].dbcluster, "c1");
        assert!(!wikis[1].deleted);
    }

    #[test]
    fn test_server_time_format() {
        let db = SqliteWikiDatabase::from_connection(Connection::open_in_memory().unwrap());
        let now = db.server_time().unwrap();

        // YYYYMMDDHHMMSS
        assert_eq!(now.to_string().len(), 14);
        assert!(now > 20200101000000);
    }

    #[test]
    fn test_open_read_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wikis.db");
        SqliteWikiDatabase::initialize(&path).unwrap();

        let db = SqliteWikiDatabase::open(&path).unwrap();
        assert!(db.all_wikis().unwrap().is_empty());
        assert!(db
            .conn
            .execute(
                "INSERT INTO cw_wikis (wiki_dbname, wiki_sitename, wiki_creation) VALUES ('a', 'A', '1')",
                [],
            )
            .is_err());
    }
}
