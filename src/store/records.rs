use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classify::Denylist;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine data directory")]
    NoDataDir,

    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("id {0} does not fit the id column")]
    IdOutOfRange(u64),

    #[error("refusing to store {name:?} as the name for {id}")]
    InvalidName { id: u64, name: String },
}

/// A stored (id, name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
}

/// What `upsert_found` did with a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Repaired { previous: String },
    Skipped { existing: String },
}

/// Get the database path (~/.local/share/idsweep/students.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf, StoreError> {
    let data_dir = directories::ProjectDirs::from("", "", "idsweep")
        .ok_or(StoreError::NoDataDir)?
        .data_dir()
        .to_path_buf();

    std::fs::create_dir_all(&data_dir).map_err(|source| StoreError::Io {
        path: data_dir.clone(),
        source,
    })?;
    Ok(data_dir.join("students.db"))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY,
            name TEXT
        )",
        [],
    )?;
    Ok(())
}

fn to_key(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::IdOutOfRange(id))
}

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get::<_, i64>(0)?.max(0) as u64,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    })
}

/// Database handle. Opened once per run; the scan is its only writer.
pub struct RecordStore {
    conn: Connection,
    denylist: Denylist,
}

impl RecordStore {
    pub fn open(path: &Path, denylist: Denylist) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn, denylist)
    }

    pub fn open_in_memory(denylist: Denylist) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, denylist)
    }

    fn from_connection(conn: Connection, denylist: Denylist) -> Result<Self, StoreError> {
        conn.pragma_update(None, "synchronous", "FULL")?;
        init_schema(&conn)?;
        Ok(RecordStore { conn, denylist })
    }

    /// Record a name found for `id`.
    ///
    /// New ids are inserted. An existing row is overwritten only when its name
    /// is a placeholder (or missing); a genuine name is never replaced. The
    /// change is committed before this returns.
    pub fn upsert_found(&mut self, id: u64, name: &str) -> Result<Upsert, StoreError> {
        let key = to_key(id)?;
        let name = name.trim();
        if name.is_empty() || self.denylist.is_placeholder(name, id) {
            return Err(StoreError::InvalidName {
                id,
                name: name.to_string(),
            });
        }

        let tx = self.conn.transaction()?;

        let existing: Option<Option<String>> = tx
            .query_row(
                "SELECT name FROM students WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let result = match existing {
            None => {
                tx.execute(
                    "INSERT INTO students (id, name) VALUES (?1, ?2)",
                    params![key, name],
                )?;
                Upsert::Inserted
            }
            Some(previous) => {
                let previous = previous.unwrap_or_default();
                if previous.trim().is_empty() || self.denylist.is_placeholder(&previous, id) {
                    tx.execute(
                        "UPDATE students SET name = ?2 WHERE id = ?1",
                        params![key, name],
                    )?;
                    Upsert::Repaired { previous }
                } else {
                    Upsert::Skipped { existing: previous }
                }
            }
        };

        tx.commit()?;
        Ok(result)
    }

    pub fn get(&self, id: u64) -> Result<Option<Record>, StoreError> {
        let key = to_key(id)?;
        let record = self
            .conn
            .query_row(
                "SELECT id, name FROM students WHERE id = ?1",
                params![key],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All records, ascending by id
    pub fn list(&self) -> Result<Vec<Record>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM students ORDER BY id ASC")?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Records whose stored name is chrome rather than a name; candidates for repair.
    pub fn placeholders(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.name.trim().is_empty() || self.denylist.is_placeholder(&r.name, r.id))
            .collect())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    #[cfg(test)]
    fn put_raw(&self, id: u64, name: Option<&str>) {
        self.conn
            .execute(
                "INSERT INTO students (id, name) VALUES (?1, ?2)",
                params![id as i64, name],
            )
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: u64 = 12345679;

    fn store() -> RecordStore {
        RecordStore::open_in_memory(Denylist::default()).unwrap()
    }

    #[test]
    fn first_find_is_inserted() {
        let mut store = store();
        assert_eq!(store.upsert_found(ID, "DELACRUZ, JUAN").unwrap(), Upsert::Inserted);
        assert_eq!(
            store.get(ID).unwrap(),
            Some(Record { id: ID, name: "DELACRUZ, JUAN".to_string() })
        );
    }

    #[test]
    fn second_upsert_is_a_skip() {
        let mut store = store();
        store.upsert_found(ID, "DELACRUZ, JUAN").unwrap();
        assert_eq!(
            store.upsert_found(ID, "DELACRUZ, JUAN").unwrap(),
            Upsert::Skipped { existing: "DELACRUZ, JUAN".to_string() }
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn genuine_name_never_overwritten() {
        let mut store = store();
        store.upsert_found(ID, "DELACRUZ, JUAN").unwrap();
        let result = store.upsert_found(ID, "SOMEONE, ELSE").unwrap();
        assert!(matches!(result, Upsert::Skipped { .. }));
        assert_eq!(store.get(ID).unwrap().unwrap().name, "DELACRUZ, JUAN");
    }

    #[test]
    fn placeholder_row_is_repaired() {
        let mut store = store();
        store.put_raw(ID, Some("No data"));
        assert_eq!(
            store.upsert_found(ID, "DELACRUZ, JUAN").unwrap(),
            Upsert::Repaired { previous: "No data".to_string() }
        );
        assert_eq!(store.get(ID).unwrap().unwrap().name, "DELACRUZ, JUAN");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn header_echo_and_null_rows_are_repaired() {
        let mut store = store();
        store.put_raw(ID, Some("LAST NAME, FIRST NAME"));
        store.put_raw(10000003, Some("10000003"));
        store.put_raw(10000014, None);

        for id in [ID, 10000003, 10000014] {
            assert!(matches!(
                store.upsert_found(id, "CRUZ, PEDRO").unwrap(),
                Upsert::Repaired { .. }
            ));
        }
        assert!(store.placeholders().unwrap().is_empty());
    }

    #[test]
    fn placeholder_names_are_rejected() {
        let mut store = store();
        assert!(matches!(
            store.upsert_found(ID, "  "),
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(
            store.upsert_found(ID, "NO DATA"),
            Err(StoreError::InvalidName { .. })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn list_is_ascending_and_placeholders_filtered() {
        let mut store = store();
        store.upsert_found(12000002, "B, B").unwrap();
        store.upsert_found(11000004, "A, A").unwrap();
        store.put_raw(13000000, Some("No data"));

        let ids: Vec<u64> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11000004, 12000002, 13000000]);

        let placeholders = store.placeholders().unwrap();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].id, 13000000);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("students.db");

        {
            let mut store = RecordStore::open(&path, Denylist::default()).unwrap();
            store.upsert_found(ID, "DELACRUZ, JUAN").unwrap();
        }

        let store = RecordStore::open(&path, Denylist::default()).unwrap();
        assert_eq!(store.get(ID).unwrap().unwrap().name, "DELACRUZ, JUAN");
        assert_eq!(store.get(10000003).unwrap(), None);
    }
}
