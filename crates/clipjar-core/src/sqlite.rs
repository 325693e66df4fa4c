use super::*;
use include_dir::{include_dir, Dir};
use rusqlite::{params, Connection, ToSql};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

static MIGRATIONS: Dir = include_dir!("$CARGO_MANIFEST_DIR/migrations");

const CLIP_COLUMNS: &str =
    "c.id, c.kind, c.content, c.memo, c.filename, c.filesize, c.mime_type, c.created_at, c.updated_at";

pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies any
    /// pending migrations.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::new_with(path, true)
    }

    /// Like [`SqliteStore::new`], but leaves the schema untouched unless
    /// `auto_migrate` is set.
    pub fn new_with<P: AsRef<Path>>(path: P, auto_migrate: bool) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "foreign_keys", 1)?;
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.busy_timeout(std::time::Duration::from_millis(5000));
        let store = Self {
            path,
            conn: Mutex::new(conn),
        };
        if auto_migrate {
            store.init()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection lock poisoned"))
    }

    fn migration_files() -> Vec<(i64, &'static include_dir::File<'static>)> {
        let mut files: Vec<_> = MIGRATIONS
            .files()
            .filter(|f| f.path().extension().map(|e| e == "sql").unwrap_or(false))
            .filter_map(|f| {
                let stem = f.path().file_stem()?.to_string_lossy();
                Some((super::parse_version_prefix(&stem)? as i64, f))
            })
            .collect();
        files.sort_by_key(|(ver, _)| *ver);
        files
    }

    fn run_migrations(&self, conn: &Connection) -> anyhow::Result<()> {
        let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        for (ver, file) in Self::migration_files() {
            if ver <= current {
                continue;
            }
            let sql = file.contents_utf8().ok_or_else(|| {
                anyhow::anyhow!("invalid utf-8 in migration {}", file.path().display())
            })?;
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(sql)?;
            tx.execute_batch(&format!("PRAGMA user_version = {}", ver))?;
            tx.commit()?;
            tracing::info!(version = ver, db = %self.path.display(), "applied migration");
        }
        Ok(())
    }

    pub fn migrate_all(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        self.run_migrations(&conn)
    }

    pub fn migration_status(&self) -> anyhow::Result<MigrationStatus> {
        let conn = self.conn()?;
        let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        let files = Self::migration_files();
        let latest = files.last().map(|(ver, _)| *ver).unwrap_or(0);
        let pending = files
            .iter()
            .filter(|(ver, _)| *ver > current)
            .filter_map(|(_, f)| Some(f.path().file_name()?.to_string_lossy().to_string()))
            .collect();
        Ok(MigrationStatus {
            current,
            latest,
            pending,
        })
    }

    /// Loads clips matching `filter` (a WHERE clause over alias `c`) with
    /// their tags, in id order.
    fn fetch(
        conn: &Connection,
        filter: &str,
        args: &[&dyn ToSql],
    ) -> anyhow::Result<Vec<Clip>> {
        let mut tags: HashMap<ClipId, Vec<String>> = HashMap::new();
        {
            let sql = format!(
                "SELECT t.clip_id, t.tag FROM clip_tags t JOIN clips c ON c.id = t.clip_id \
                 WHERE {} ORDER BY t.clip_id, t.position",
                filter
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(args)?;
            while let Some(row) = rows.next()? {
                tags.entry(row.get(0)?).or_default().push(row.get(1)?);
            }
        }

        let sql = format!(
            "SELECT {} FROM clips c WHERE {} ORDER BY c.id",
            CLIP_COLUMNS, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(args)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let id: ClipId = row.get(0)?;
            let kind: String = row.get(1)?;
            out.push(Clip {
                id,
                kind: kind.parse()?,
                content: row.get(2)?,
                tags: tags.remove(&id).unwrap_or_default(),
                memo: row.get(3)?,
                filename: row.get(4)?,
                filesize: row.get::<_, Option<i64>>(5)?.map(|n| n as u64),
                mime_type: row.get(6)?,
                created_at: super::from_millis(row.get(7)?)?,
                updated_at: super::from_millis(row.get(8)?)?,
            });
        }
        Ok(out)
    }
}

impl Store for SqliteStore {
    fn init(&self) -> anyhow::Result<()> {
        self.migrate_all()
    }

    fn save(&self, clip: NewClip) -> anyhow::Result<ClipId> {
        clip.validate()?;
        let at = super::now_utc_millis();
        let ts = super::to_millis(at);
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO clips(kind, content, memo, filename, filesize, mime_type, created_at, updated_at) \
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                clip.kind.as_str(),
                clip.content,
                clip.memo,
                clip.filename,
                clip.filesize.map(|n| n as i64),
                clip.mime_type,
                ts
            ],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt =
                tx.prepare("INSERT INTO clip_tags(clip_id, position, tag) VALUES(?1, ?2, ?3)")?;
            for (pos, tag) in clip.tags.iter().enumerate() {
                stmt.execute(params![id, pos as i64, tag])?;
            }
        }
        tx.commit()?;
        tracing::debug!(id, kind = %clip.kind, tags = clip.tags.len(), "saved clip");
        Ok(id)
    }

    fn get_all(&self) -> anyhow::Result<Vec<Clip>> {
        let conn = self.conn()?;
        Self::fetch(&conn, "1 = 1", &[])
    }

    fn get(&self, id: ClipId) -> anyhow::Result<Option<Clip>> {
        let conn = self.conn()?;
        Ok(Self::fetch(&conn, "c.id = ?1", &[&id])?.into_iter().next())
    }

    fn delete(&self, id: ClipId) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM clips WHERE id = ?1", params![id])?;
        if n == 0 {
            tracing::debug!(id, "delete of missing clip ignored");
        }
        Ok(())
    }

    fn by_kind(&self, kind: ClipKind) -> anyhow::Result<Vec<Clip>> {
        let conn = self.conn()?;
        Self::fetch(&conn, "c.kind = ?1", &[&kind.as_str()])
    }

    fn by_tag(&self, tag: &str) -> anyhow::Result<Vec<Clip>> {
        let conn = self.conn()?;
        Self::fetch(
            &conn,
            "c.id IN (SELECT clip_id FROM clip_tags WHERE tag = ?1)",
            &[&tag],
        )
    }

    fn created_between(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<Clip>> {
        let conn = self.conn()?;
        let (from, to) = (super::to_millis(from), super::to_millis(to));
        Self::fetch(&conn, "c.created_at BETWEEN ?1 AND ?2", &[&from, &to])
    }

    fn count(&self) -> anyhow::Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM clips", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}
