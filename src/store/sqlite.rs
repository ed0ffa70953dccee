use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{HeadlinerError, Result};
use crate::domain::{FavoriteRecord, IdentityKey, ImageBytes};
use crate::store::FavoriteStorage;

const SELECT_COLUMNS: &str = "SELECT title, creator, link, description, published_at,
        image_url, article_id, image, saved_at
 FROM favorites";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HeadlinerError::Other(format!("favorites database lock poisoned: {}", e)))
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteRecord> {
        let saved_at = row.get::<_, String>(8)?;
        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        Ok(FavoriteRecord {
            title: row.get(0)?,
            creator: row.get(1)?,
            link: row.get(2)?,
            description: row.get(3)?,
            published_at: row.get(4)?,
            image_url: row.get(5)?,
            article_id: row.get(6)?,
            image: row.get::<_, Option<Vec<u8>>>(7)?.map(ImageBytes),
            saved_at,
        })
    }
}

impl FavoriteStorage for SqliteStore {
    fn load_all(&self) -> Result<Vec<FavoriteRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let records = stmt
            .query_map([], Self::record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn find(&self, identity: IdentityKey, key: &str) -> Result<Option<FavoriteRecord>> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                &format!(
                    "{} WHERE {} = ?1 ORDER BY id LIMIT 1",
                    SELECT_COLUMNS,
                    identity.column()
                ),
                params![key],
                Self::record_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn insert(&self, identity: IdentityKey, record: &FavoriteRecord) -> Result<bool> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            &format!(
                "INSERT INTO favorites
                    (title, creator, link, description, published_at,
                     image_url, article_id, image, saved_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
                 WHERE NOT EXISTS (SELECT 1 FROM favorites WHERE {} = ?10)",
                identity.column()
            ),
            params![
                record.title,
                record.creator,
                record.link,
                record.description,
                record.published_at,
                record.image_url,
                record.article_id,
                record.image.as_ref().map(ImageBytes::as_slice),
                record.saved_at.to_rfc3339(),
                identity.of_record(record)
            ],
        )?;

        Ok(inserted > 0)
    }

    fn delete(&self, identity: IdentityKey, key: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            &format!("DELETE FROM favorites WHERE {} = ?1", identity.column()),
            params![key],
        )?;
        Ok(deleted)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM favorites", [])?)
    }
}
