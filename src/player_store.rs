use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RegistryError, StoreError};
use crate::player::{name_key, sanitize_name, PlayerRecord, PlayerSummary};

/// What the core needs from wherever player records live.
pub trait PlayerStore {
    fn load_all(&self) -> Result<Vec<PlayerRecord>, StoreError>;
    fn save_one(&mut self, record: &PlayerRecord) -> Result<(), StoreError>;
    fn delete_one(&mut self, user_id: &str) -> Result<bool, StoreError>;
    fn name_exists(&self, name: &str) -> Result<bool, StoreError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlayerStoreFile {
    version: u8,
    players: BTreeMap<String, PlayerRecord>,
}

#[derive(Clone, Debug, Deserialize)]
struct PlayerStoreFileRaw {
    version: u8,
    players: BTreeMap<String, serde_json::Value>,
}

/// Versioned JSON document keyed by user id.
pub struct JsonFileStore {
    file_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read_players(&self) -> Result<BTreeMap<String, PlayerRecord>, StoreError> {
        let text = match fs::read_to_string(&self.file_path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.file_path.clone(),
                    source,
                })
            }
        };
        let raw: PlayerStoreFileRaw = serde_json::from_str(&text)?;
        if raw.version != 1 {
            return Err(StoreError::UnsupportedVersion(raw.version));
        }

        let mut players = BTreeMap::new();
        for (user_id, value) in raw.players {
            match serde_json::from_value::<PlayerRecord>(value) {
                Ok(record) => {
                    players.insert(user_id, record);
                }
                Err(error) => {
                    warn!(
                        user_id = %user_id,
                        path = %self.file_path.display(),
                        %error,
                        "skipping unreadable player entry"
                    );
                }
            }
        }
        Ok(players)
    }

    /// Base for a read-modify-write. An unreadable document is replaced
    /// instead of blocking every later save.
    fn players_for_write(&self) -> Result<BTreeMap<String, PlayerRecord>, StoreError> {
        match self.read_players() {
            Err(error @ (StoreError::Json(_) | StoreError::UnsupportedVersion(_))) => {
                warn!(path = %self.file_path.display(), %error, "overwriting unreadable player store");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_players(&self, players: BTreeMap<String, PlayerRecord>) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = PlayerStoreFile {
            version: 1,
            players,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text).map_err(|source| StoreError::Io {
            path: self.file_path.clone(),
            source,
        })
    }
}

impl PlayerStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self.read_players()?.into_values().collect())
    }

    fn save_one(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        let mut players = self.players_for_write()?;
        players.insert(record.user_id.clone(), record.clone());
        self.write_players(players)
    }

    fn delete_one(&mut self, user_id: &str) -> Result<bool, StoreError> {
        let mut players = self.players_for_write()?;
        let removed = players.remove(user_id).is_some();
        if removed {
            self.write_players(players)?;
        }
        Ok(removed)
    }

    fn name_exists(&self, name: &str) -> Result<bool, StoreError> {
        let key = name_key(name);
        Ok(self
            .read_players()?
            .values()
            .any(|record| name_key(&record.user_name) == key))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    players: BTreeMap<String, PlayerRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self.players.values().cloned().collect())
    }

    fn save_one(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.players.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn delete_one(&mut self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.players.remove(user_id).is_some())
    }

    fn name_exists(&self, name: &str) -> Result<bool, StoreError> {
        let key = name_key(name);
        Ok(self
            .players
            .values()
            .any(|record| name_key(&record.user_name) == key))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegistryExport {
    version: u8,
    players: Vec<PlayerRecord>,
}

/// In-memory view of every known player, written through to a store. Store
/// failures are logged and never reach the caller.
pub struct PlayerRegistry<S: PlayerStore> {
    store: S,
    players: BTreeMap<String, PlayerRecord>,
}

impl<S: PlayerStore> PlayerRegistry<S> {
    pub fn new(store: S) -> Self {
        let players = match store.load_all() {
            Ok(records) => records
                .into_iter()
                .map(|mut record| {
                    record.sync_catalog();
                    (record.user_id.clone(), record)
                })
                .collect(),
            Err(error) => {
                warn!(%error, "player store unavailable, starting empty");
                BTreeMap::new()
            }
        };
        debug!(count = players.len(), "player registry loaded");
        Self { store, players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, user_id: &str) -> Option<&PlayerRecord> {
        self.players.get(user_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PlayerRecord> {
        let key = name_key(name);
        self.players
            .values()
            .find(|record| name_key(&record.user_name) == key)
    }

    pub fn is_name_available(&self, name: &str) -> bool {
        if self.find_by_name(name).is_some() {
            return false;
        }
        match self.store.name_exists(name) {
            Ok(exists) => !exists,
            Err(error) => {
                warn!(%error, "name lookup failed, trusting in-memory records");
                true
            }
        }
    }

    pub fn create_player(&mut self, raw_name: &str) -> Result<PlayerRecord, RegistryError> {
        let name = sanitize_name(raw_name).ok_or(RegistryError::EmptyName)?;
        if !self.is_name_available(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        let record = PlayerRecord::new(&name);
        self.persist(&record);
        self.players.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    pub fn delete_player(&mut self, user_id: &str) -> Result<PlayerRecord, RegistryError> {
        let removed = self
            .players
            .remove(user_id)
            .ok_or_else(|| RegistryError::UnknownPlayer(user_id.to_string()))?;
        if let Err(error) = self.store.delete_one(user_id) {
            warn!(%error, user_id, "failed to delete player from store");
        }
        Ok(removed)
    }

    /// Most recently played first.
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        let mut records: Vec<&PlayerRecord> = self.players.values().collect();
        records.sort_by(|a, b| b.last_played_at.cmp(&a.last_played_at));
        records.into_iter().map(PlayerRecord::summary).collect()
    }

    /// Stores the records a finished match handed back.
    pub fn record_session(&mut self, records: &[PlayerRecord]) {
        for record in records {
            self.persist(record);
            self.players.insert(record.user_id.clone(), record.clone());
        }
    }

    pub fn export_json(&self) -> Result<String, StoreError> {
        let payload = RegistryExport {
            version: 1,
            players: self.players.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Merges an export; entries whose name belongs to a different id are
    /// skipped. Returns how many records were taken.
    pub fn import_json(&mut self, text: &str) -> Result<usize, RegistryError> {
        let payload: RegistryExport = serde_json::from_str(text)
            .map_err(|error| RegistryError::InvalidImport(error.to_string()))?;
        if payload.version != 1 {
            return Err(RegistryError::InvalidImport(format!(
                "unsupported version {}",
                payload.version
            )));
        }
        let mut imported = 0;
        for mut record in payload.players {
            let clash = self
                .find_by_name(&record.user_name)
                .is_some_and(|existing| existing.user_id != record.user_id);
            if clash || sanitize_name(&record.user_name).is_none() {
                warn!(user_name = %record.user_name, "skipping conflicting import entry");
                continue;
            }
            record.sync_catalog();
            self.persist(&record);
            self.players.insert(record.user_id.clone(), record);
            imported += 1;
        }
        Ok(imported)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self, record: &PlayerRecord) {
        if let Err(error) = self.store.save_one(record) {
            warn!(%error, user_id = %record.user_id, "failed to save player");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct BrokenStore;

    impl PlayerStore for BrokenStore {
        fn load_all(&self) -> Result<Vec<PlayerRecord>, StoreError> {
            Err(StoreError::UnsupportedVersion(9))
        }
        fn save_one(&mut self, _record: &PlayerRecord) -> Result<(), StoreError> {
            Err(StoreError::UnsupportedVersion(9))
        }
        fn delete_one(&mut self, _user_id: &str) -> Result<bool, StoreError> {
            Err(StoreError::UnsupportedVersion(9))
        }
        fn name_exists(&self, _name: &str) -> Result<bool, StoreError> {
            Err(StoreError::UnsupportedVersion(9))
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            now.saturating_add(rand::random::<u32>() as u64)
        );
        std::env::temp_dir().join(unique).join("players.json")
    }

    #[test]
    fn create_rejects_duplicate_names_case_insensitively() {
        let mut registry = PlayerRegistry::new(MemoryStore::new());
        registry.create_player("Alice").expect("first create");
        assert_eq!(
            registry.create_player("  alice "),
            Err(RegistryError::DuplicateName("alice".to_string()))
        );
        assert_eq!(registry.create_player("   "), Err(RegistryError::EmptyName));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn json_store_round_trips_records() {
        let path = temp_file("player-store-roundtrip");
        let mut registry = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        let mut alice = registry.create_player("Alice").expect("create");
        alice.stats.total_games = 3;
        alice.stats.total_distance = 420;
        registry.record_session(std::slice::from_ref(&alice));

        let reloaded = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        let stored = reloaded.get(&alice.user_id).expect("stored");
        assert_eq!(stored, &alice);
        assert!(!reloaded.is_name_available("ALICE"));

        let _ = fs::remove_file(&path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let path = temp_file("player-store-corrupt");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "{ not json").expect("write file");

        let registry = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        assert!(registry.is_empty());

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn saving_after_a_corrupt_file_replaces_it() {
        let path = temp_file("player-store-recover");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "{ not json").expect("write file");

        let mut registry = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        let mut zed = registry.create_player("Zed").expect("create");
        zed.stats.total_games = 1;
        registry.record_session(std::slice::from_ref(&zed));

        let reloaded = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&zed.user_id), Some(&zed));

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn wrong_version_file_is_replaced_on_save() {
        let path = temp_file("player-store-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, r#"{"version": 7, "players": {}}"#).expect("write file");

        let mut store = JsonFileStore::new(path.clone());
        assert!(matches!(store.load_all(), Err(StoreError::UnsupportedVersion(7))));
        let record = PlayerRecord::new("Yara");
        store.save_one(&record).expect("save replaces the file");
        let loaded = store.load_all().expect("readable again");
        assert_eq!(loaded, vec![record]);

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let path = temp_file("player-store-partial");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "players": {
    "user_1_abcdefghi": {
      "userId": "user_1_abcdefghi",
      "userName": "Erin",
      "stats": { "totalGames": 2, "totalWins": 1 },
      "achievements": [{ "id": "veteran_1", "unlocked": false, "unlockedAt": null }],
      "createdAt": "2024-01-01T00:00:00.000Z",
      "lastPlayedAt": "2024-01-02T00:00:00.000Z"
    },
    "broken": { "userName": 42 }
  }
}"#;
        fs::write(&path, raw).expect("write file");

        let registry = PlayerRegistry::new(JsonFileStore::new(path.clone()));
        assert_eq!(registry.len(), 1);
        let erin = registry.get("user_1_abcdefghi").expect("erin loaded");
        assert_eq!(erin.stats.total_wins, 1);
        assert_eq!(erin.achievements.len(), crate::achievements::CATALOG.len());

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn broken_store_degrades_without_errors() {
        let mut registry = PlayerRegistry::new(BrokenStore);
        assert!(registry.is_empty());
        let record = registry.create_player("Frank").expect("created in memory");
        assert!(registry.get(&record.user_id).is_some());
        assert!(registry.delete_player(&record.user_id).is_ok());
    }

    #[test]
    fn summaries_sort_by_last_played() {
        let mut registry = PlayerRegistry::new(MemoryStore::new());
        let mut a = registry.create_player("A").expect("a");
        let mut b = registry.create_player("B").expect("b");
        a.last_played_at = "2024-01-01T00:00:00.000Z".to_string();
        b.last_played_at = "2024-06-01T00:00:00.000Z".to_string();
        registry.record_session(&[a, b]);
        let names: Vec<String> = registry.summaries().into_iter().map(|s| s.user_name).collect();
        assert_eq!(names, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn export_then_import_into_fresh_registry() {
        let mut source = PlayerRegistry::new(MemoryStore::new());
        source.create_player("Gina").expect("create");
        let text = source.export_json().expect("export");

        let mut target = PlayerRegistry::new(MemoryStore::new());
        target.create_player("gina").expect("clashing name");
        assert_eq!(target.import_json(&text), Ok(0));

        let mut empty = PlayerRegistry::new(MemoryStore::new());
        assert_eq!(empty.import_json(&text), Ok(1));
        assert!(empty.find_by_name("GINA").is_some());
        assert!(matches!(
            empty.import_json("[]"),
            Err(RegistryError::InvalidImport(_))
        ));
    }

    #[test]
    fn delete_unknown_player_is_an_error() {
        let mut registry = PlayerRegistry::new(MemoryStore::new());
        assert_eq!(
            registry.delete_player("nobody").map(|r| r.user_id),
            Err(RegistryError::UnknownPlayer("nobody".to_string()))
        );
    }
}
