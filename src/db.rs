use anyhow::{Context, Result, anyhow};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, params, params_from_iter};
use std::path::{Path, PathBuf};

use crate::models::{
    ApplicationPatch, ApplicationRecord, ApplicationStatus, NewApplication, clamp_priority,
};

/// Rows per transaction when seeding.
const SEED_BATCH: usize = 450;

const SELECT_COLUMNS: &str = "id, company_name, role_title, status, priority, applied_at,
    last_touch_at, next_action_at, next_action_label, location, work_mode, notes";

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub written: usize,
    pub skipped: usize,
    pub batches: usize,
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        ApplicationStatus::parse(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown status '{}'", raw).into()))
    }
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                role_title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'applied' CHECK (status IN (
                    'draft', 'applied', 'screen', 'interview',
                    'offer', 'rejected', 'withdrawn', 'ghosted'
                )),
                priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
                applied_at TEXT,
                last_touch_at TEXT,
                next_action_at TEXT,
                next_action_label TEXT,
                location TEXT,
                work_mode TEXT,
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_applications_company ON applications(company_name);
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='applications'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'apptrack init' first."
            ));
        }
        Ok(())
    }

    // --- Reads ---

    pub fn list_applications(&self) -> Result<Vec<ApplicationRecord>> {
        let sql = format!("SELECT {} FROM applications ORDER BY company_name, id", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_application)?;
        let records = rows
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list applications")?;
        tracing::debug!(count = records.len(), "listed applications");
        Ok(records)
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRecord>> {
        let sql = format!("SELECT {} FROM applications WHERE id = ?1", SELECT_COLUMNS);
        let result = self.conn.query_row(&sql, [id], Self::row_to_application);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRecord> {
        Ok(ApplicationRecord {
            id: row.get(0)?,
            company_name: row.get(1)?,
            role_title: row.get(2)?,
            status: row.get(3)?,
            priority: row.get(4)?,
            applied_at: row.get(5)?,
            last_touch_at: row.get(6)?,
            next_action_at: row.get(7)?,
            next_action_label: row.get(8)?,
            location: row.get(9)?,
            work_mode: row.get(10)?,
            notes: row.get(11)?,
        })
    }

    // --- Writes ---

    /// Insert a new application and return the id the store assigned.
    pub fn create_application(&self, new: &NewApplication) -> Result<String> {
        if new.company_name.trim().is_empty() || new.role_title.trim().is_empty() {
            return Err(anyhow!("Company and role are required"));
        }

        let id: String = self.conn.query_row(
            "INSERT INTO applications (id, company_name, role_title, status, priority,
                applied_at, next_action_at, next_action_label, location, work_mode, notes)
             VALUES (lower(hex(randomblob(10))), ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id",
            params![
                new.company_name,
                new.role_title,
                new.status,
                clamp_priority(new.priority),
                new.applied_at,
                new.next_action_at,
                new.next_action_label,
                new.location,
                new.work_mode,
                new.notes,
            ],
            |row| row.get(0),
        )?;

        tracing::info!(%id, company = %new.company_name, "created application");
        Ok(id)
    }

    /// Write the fields present in `patch`. An empty patch is a no-op.
    pub fn update_application(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut push = |column: &'static str, value: Value| {
            sets.push(column);
            values.push(value);
        };

        if let Some(v) = &patch.company_name {
            push("company_name", Value::Text(v.clone()));
        }
        if let Some(v) = &patch.role_title {
            push("role_title", Value::Text(v.clone()));
        }
        if let Some(v) = patch.status {
            push("status", Value::Text(v.as_str().to_string()));
        }
        if let Some(v) = patch.priority {
            push("priority", Value::Integer(clamp_priority(v)));
        }
        let nullable = [
            ("applied_at", &patch.applied_at),
            ("last_touch_at", &patch.last_touch_at),
            ("next_action_at", &patch.next_action_at),
            ("next_action_label", &patch.next_action_label),
            ("location", &patch.location),
            ("work_mode", &patch.work_mode),
            ("notes", &patch.notes),
        ];
        for (column, field) in nullable {
            if let Some(v) = field {
                push(column, v.clone().map_or(Value::Null, Value::Text));
            }
        }

        if sets.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE applications SET {}, updated_at = datetime('now') WHERE id = ?{}",
            assignments.join(", "),
            values.len() + 1
        );
        values.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        if changed == 0 {
            return Err(anyhow!("Application {} not found", id));
        }

        tracing::info!(%id, fields = ?sets, "updated application");
        Ok(())
    }

    /// Upsert records under their own ids, committing in batches.
    pub fn seed_applications(&self, records: &[ApplicationRecord]) -> Result<SeedStats> {
        let mut stats = SeedStats::default();

        for chunk in records.chunks(SEED_BATCH) {
            let tx = self.conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO applications (id, company_name, role_title, status, priority,
                        applied_at, last_touch_at, next_action_at, next_action_label,
                        location, work_mode, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET
                        company_name = excluded.company_name,
                        role_title = excluded.role_title,
                        status = excluded.status,
                        priority = excluded.priority,
                        applied_at = excluded.applied_at,
                        last_touch_at = excluded.last_touch_at,
                        next_action_at = excluded.next_action_at,
                        next_action_label = excluded.next_action_label,
                        location = excluded.location,
                        work_mode = excluded.work_mode,
                        notes = excluded.notes,
                        updated_at = datetime('now')",
                )?;

                for record in chunk {
                    if record.id.trim().is_empty() {
                        tracing::warn!(company = %record.company_name, "skipping row without id");
                        stats.skipped += 1;
                        continue;
                    }
                    stmt.execute(params![
                        record.id,
                        record.company_name,
                        record.role_title,
                        record.status,
                        clamp_priority(record.priority),
                        record.applied_at,
                        record.last_touch_at,
                        record.next_action_at,
                        record.next_action_label,
                        record.location,
                        record.work_mode,
                        record.notes,
                    ])
                    .with_context(|| format!("Failed to write application {}", record.id))?;
                    stats.written += 1;
                }
            }
            tx.commit()?;
            stats.batches += 1;
            tracing::info!(written = stats.written, "committed seed batch");
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_app(company: &str, role: &str) -> NewApplication {
        NewApplication {
            company_name: company.into(),
            role_title: role.into(),
            status: ApplicationStatus::Applied,
            priority: 3,
            applied_at: Some("2025-12-29".into()),
            next_action_at: None,
            next_action_label: None,
            location: Some("Austin, TX".into()),
            work_mode: Some("hybrid".into()),
            notes: None,
        }
    }

    #[test]
    fn uninitialized_database_is_reported() {
        let db = Database {
            conn: Connection::open_in_memory().unwrap(),
            path: PathBuf::from(":memory:"),
        };
        let err = db.ensure_initialized().unwrap_err();
        assert!(err.to_string().contains("apptrack init"));
        db.init().unwrap();
        db.ensure_initialized().unwrap();
    }

    #[test]
    fn create_assigns_opaque_id_and_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_application(&new_app("IBM", "Engineer")).unwrap();
        assert_eq!(id.len(), 20);

        let stored = db.get_application(&id).unwrap().unwrap();
        assert_eq!(stored, new_app("IBM", "Engineer").into_record(id.clone()));
        assert_eq!(db.get_application("nope").unwrap(), None);
    }

    #[test]
    fn create_rejects_blank_names_and_clamps_priority() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_application(&new_app("  ", "Engineer")).is_err());

        let mut app = new_app("Acme", "Dev");
        app.priority = 99;
        let id = db.create_application(&app).unwrap();
        assert_eq!(db.get_application(&id).unwrap().unwrap().priority, 5);
    }

    #[test]
    fn list_is_ordered_by_company() {
        let db = Database::open_in_memory().unwrap();
        for company in ["Zeta", "Acme", "Mid"] {
            db.create_application(&new_app(company, "Dev")).unwrap();
        }
        let names: Vec<String> = db
            .list_applications()
            .unwrap()
            .into_iter()
            .map(|r| r.company_name)
            .collect();
        assert_eq!(names, vec!["Acme", "Mid", "Zeta"]);
    }

    #[test]
    fn update_writes_only_patched_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_application(&new_app("IBM", "Engineer")).unwrap();

        let patch = ApplicationPatch {
            status: Some(ApplicationStatus::Rejected),
            priority: Some(-3),
            location: Some(None),
            notes: Some(Some("Rejected two days later.".into())),
            ..Default::default()
        };
        db.update_application(&id, &patch).unwrap();

        let stored = db.get_application(&id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Rejected);
        assert_eq!(stored.priority, 1);
        assert_eq!(stored.location, None);
        assert_eq!(stored.notes.as_deref(), Some("Rejected two days later."));
        assert_eq!(stored.work_mode.as_deref(), Some("hybrid"));
        assert_eq!(stored.applied_at.as_deref(), Some("2025-12-29"));
    }

    #[test]
    fn update_unknown_id_fails_and_empty_patch_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let patch = ApplicationPatch {
            status: Some(ApplicationStatus::Offer),
            ..Default::default()
        };
        let err = db.update_application("missing", &patch).unwrap_err();
        assert!(err.to_string().contains("not found"));
        db.update_application("missing", &ApplicationPatch::default()).unwrap();
    }

    #[test]
    fn seed_upserts_and_skips_rows_without_id() {
        let db = Database::open_in_memory().unwrap();
        let mut first = new_app("IBM", "Engineer").into_record("1".into());
        let blank = new_app("Nobody", "Dev").into_record("".into());
        let stats = db.seed_applications(&[first.clone(), blank]).unwrap();
        assert_eq!(
            stats,
            SeedStats {
                written: 1,
                skipped: 1,
                batches: 1,
            }
        );

        first.status = ApplicationStatus::Ghosted;
        db.seed_applications(&[first.clone()]).unwrap();
        let all = db.list_applications().unwrap();
        assert_eq!(all, vec![first]);
    }

    #[test]
    fn seeded_raw_values_open_clean_for_editing() {
        let db = Database::open_in_memory().unwrap();
        let mut record = new_app(" Acme ", "Engineer").into_record("g1".into());
        record.work_mode = Some("Remote".into());
        record.notes = Some("call back\n".into());
        db.seed_applications(&[record]).unwrap();

        let stored = db.get_application("g1").unwrap().unwrap();
        assert_eq!(stored.work_mode.as_deref(), Some("Remote"));
        let form = crate::forms::QuickEditForm::open(&stored);
        assert!(!form.is_dirty());
    }

    #[test]
    fn seed_commits_in_batches() {
        let db = Database::open_in_memory().unwrap();
        let records: Vec<ApplicationRecord> = (0..SEED_BATCH + 5)
            .map(|i| new_app("Bulk", "Dev").into_record(format!("id-{}", i)))
            .collect();
        let stats = db.seed_applications(&records).unwrap();
        assert_eq!(stats.written, SEED_BATCH + 5);
        assert_eq!(stats.batches, 2);
        assert_eq!(db.list_applications().unwrap().len(), SEED_BATCH + 5);
    }
}
