//! SQLite persistence for character inner state.
//!
//! A character's serialisable state is captured in a [`CharacterRecord`]
//! and stored as JSON in a per-world SQLite database:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS characters (
//!     character_id TEXT PRIMARY KEY,
//!     data         BLOB NOT NULL,
//!     updated_at   TEXT NOT NULL,
//!     checksum     TEXT
//! );
//! ```
//!
//! The shared registries, the clock, and the evaluator backend are not
//! persisted; restoring a character requires the same registries present
//! at load time. The presented vector is likewise omitted — it is a
//! derived cache and rebuilds on the next situation or emotion change.
//! JSON inside a BLOB column keeps the schema stable across state-shape
//! changes, and an optional CRC-32 checksum detects save corruption.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::belief::Belief;
use crate::character::{Character, CharacterBuilder};
use crate::config::SoulConfig;
use crate::error::{Result, SoulError};
use crate::history::HistoryState;
use crate::presentation::PresentationState;
use crate::registry::Registry;
use crate::trigger::TriggerState;
use crate::types::{CharacterId, EmotionVector, Personality, TimeSource};

/// Everything about one character that survives a save/load cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Stable character ID.
    pub id: CharacterId,
    /// Immutable personality tag.
    pub personality: Personality,
    /// Core emotion vector.
    pub emotions: EmotionVector,
    /// History layer state, when enabled.
    pub history: Option<HistoryState>,
    /// Presentation layer state (presented cache excluded), when enabled.
    pub presentation: Option<PresentationState>,
    /// Beliefs with their erosion state, when enabled.
    pub beliefs: Option<Vec<Belief>>,
    /// Trigger sensitivities and cooldowns, when enabled.
    pub triggers: Option<TriggerState>,
}

impl CharacterRecord {
    /// Rebuild a character from this record against live registries and
    /// a live clock. The evaluator backend must be re-installed by the
    /// caller via [`Character::set_evaluator`].
    #[must_use]
    pub fn restore(
        self,
        registry: Arc<Registry>,
        config: SoulConfig,
        clock: TimeSource,
    ) -> Character {
        CharacterBuilder::new(registry, self.personality)
            .config(config)
            .clock(clock)
            .restore_parts(
                self.id,
                self.emotions,
                self.history,
                self.presentation,
                self.beliefs,
                self.triggers,
            )
    }
}

impl Character {
    /// Snapshot this character's serialisable state.
    #[must_use]
    pub fn to_record(&self) -> CharacterRecord {
        CharacterRecord {
            id: self.id(),
            personality: self.personality(),
            emotions: *self.emotions(),
            history: self.history().ok().cloned(),
            presentation: self.presentation_state().cloned(),
            beliefs: self.beliefs().ok().map(<[Belief]>::to_vec),
            triggers: self.triggers().ok().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309 / ITU-T V.42) of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    format!("{:08x}", !crc)
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS characters (
    character_id TEXT PRIMARY KEY,
    data         BLOB NOT NULL,
    updated_at   TEXT NOT NULL,
    checksum     TEXT
);";

/// Handle to an open SQLite database that stores [`CharacterRecord`]s.
pub struct SqliteStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path` with WAL mode enabled.
    ///
    /// # Errors
    /// Returns [`SoulError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), "character store opened");
        Ok(Self { conn, db_path })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`SoulError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Insert or replace one character's record.
    ///
    /// # Errors
    /// Serialization or SQLite failures.
    pub fn save(&self, record: &CharacterRecord) -> Result<()> {
        let data = serde_json::to_vec(record)
            .map_err(|e| SoulError::Serialization(e.to_string()))?;
        let checksum = crc32_hex(&data);
        let updated_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO characters (character_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.id.to_string(), data, updated_at, checksum],
        )?;
        debug!(character = %record.id, bytes = data.len(), "character saved");
        Ok(())
    }

    /// Load one character's record, verifying the stored checksum.
    /// Returns `None` when the character has never been saved.
    ///
    /// # Errors
    /// Deserialization or SQLite failures.
    pub fn load(&self, id: CharacterId) -> Result<Option<CharacterRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data, checksum FROM characters WHERE character_id = ?1")?;
        let mut rows = stmt.query(params![id.to_string()])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let data: Vec<u8> = row.get(0)?;
        let stored_checksum: Option<String> = row.get(1)?;

        if let Some(stored) = stored_checksum {
            let actual = crc32_hex(&data);
            if stored != actual {
                warn!(character = %id, "checksum mismatch on load, save may be corrupt");
                return Err(SoulError::Serialization(format!(
                    "checksum mismatch for character {id}: stored {stored}, computed {actual}"
                )));
            }
        }

        let record = serde_json::from_slice(&data)
            .map_err(|e| SoulError::Serialization(e.to_string()))?;
        Ok(Some(record))
    }

    /// Delete one character's record. Returns whether a row was removed.
    ///
    /// # Errors
    /// SQLite failures.
    pub fn delete(&self, id: CharacterId) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM characters WHERE character_id = ?1",
            params![id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// IDs of every saved character.
    ///
    /// # Errors
    /// SQLite failures.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT character_id FROM characters ORDER BY character_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::types::{Emotion, zero_clock};

    fn sample_character() -> Character {
        let registry = Arc::new(Registry::builder().build());
        let mut character = Character::builder(registry, Personality::Worrier)
            .with_history()
            .with_beliefs(vec![Belief::new(
                "The road is safe",
                0.8,
                0.5,
                vec!["safety".to_string()],
            )])
            .build();
        character.apply_interaction("threat", 1.0).expect("apply");
        character
    }

    #[test]
    fn save_load_round_trip_preserves_state() {
        let store = SqliteStore::open_in_memory().expect("open");
        let character = sample_character();
        let record = character.to_record();
        store.save(&record).expect("save");

        let loaded = store
            .load(record.id)
            .expect("load")
            .expect("record exists");
        assert_eq!(loaded.personality, Personality::Worrier);
        assert!(
            (loaded.emotions.get(Emotion::Fear) - record.emotions.get(Emotion::Fear)).abs()
                < 1e-6
        );
        assert_eq!(loaded.beliefs.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn restore_rebuilds_a_working_character() {
        let registry = Arc::new(Registry::builder().build());
        let record = sample_character().to_record();
        let mut restored = record.restore(
            Arc::clone(&registry),
            SoulConfig::default(),
            zero_clock(),
        );

        // The restored character keeps its fear and can keep living.
        assert!(restored.emotion(Emotion::Fear) > 0.0);
        restored.apply_interaction("rest", 1.0).expect("apply");
        assert!(restored.history().is_ok());
    }

    #[test]
    fn load_of_unknown_character_is_none() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert!(store.load(CharacterId::new()).expect("load").is_none());
    }

    #[test]
    fn corrupted_data_is_rejected_on_load() {
        let store = SqliteStore::open_in_memory().expect("open");
        let record = sample_character().to_record();
        store.save(&record).expect("save");

        store
            .conn
            .execute(
                "UPDATE characters SET data = ?1 WHERE character_id = ?2",
                params![b"{not json".to_vec(), record.id.to_string()],
            )
            .expect("tamper");

        assert!(store.load(record.id).is_err());
    }

    #[test]
    fn delete_removes_the_row() {
        let store = SqliteStore::open_in_memory().expect("open");
        let record = sample_character().to_record();
        store.save(&record).expect("save");

        assert!(store.delete(record.id).expect("delete"));
        assert!(store.load(record.id).expect("load").is_none());
        assert!(!store.delete(record.id).expect("delete again"));
    }
}
