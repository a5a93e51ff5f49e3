//! De-duplication ledger of already-reported battle ids.
//!
//! One JSON file holding a per-server set of ids. The reconstruction engine
//! never touches this; the watch loop loads it at cycle start, appends while
//! processing, and saves at cycle end.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportedBattles {
    servers: BTreeMap<String, BTreeSet<i64>>,
}

impl ReportedBattles {
    /// Load the ledger. A missing or unreadable file starts an empty ledger
    /// rather than failing the cycle.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("ledger at {:?} is corrupt ({}), starting fresh", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn contains(&self, server: &str, battle_id: i64) -> bool {
        self.servers
            .get(server)
            .is_some_and(|ids| ids.contains(&battle_id))
    }

    /// Returns true if the id was not yet recorded for this server.
    pub fn insert(&mut self, server: &str, battle_id: i64) -> bool {
        self.servers
            .entry(server.to_string())
            .or_default()
            .insert(battle_id)
    }

    pub fn clear(&mut self) {
        self.servers.clear();
    }

    pub fn len(&self) -> usize {
        self.servers.values().map(|ids| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("reported.json");

        let mut ledger = ReportedBattles::default();
        assert!(ledger.insert("europe", 100));
        assert!(!ledger.insert("europe", 100));
        ledger.insert("asia", 200);
        ledger.save(&path).unwrap();

        let loaded = ReportedBattles::load(&path);
        assert!(loaded.contains("europe", 100));
        assert!(loaded.contains("asia", 200));
        assert!(!loaded.contains("europe", 200));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ReportedBattles::load(&dir.path().join("nope.json"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reported.json");
        std::fs::write(&path, "{not json").unwrap();
        let ledger = ReportedBattles::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_serialized_shape_is_per_server_map() {
        let mut ledger = ReportedBattles::default();
        ledger.insert("europe", 7);
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(json, r#"{"europe":[7]}"#);
    }
}
