use crate::error::{IopipeError, IopipeResult};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File inside the cache root holding the alias table. An alias is an
/// explicit mapping record (name -> digest), not a filesystem symlink, so
/// the store stays portable across storage backends.
const ALIAS_TABLE_FILE: &str = "aliases.json";

/// Lowercase hex SHA-256 digest of `bytes`. This is the content-addressing
/// id under which every filter record is stored.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Returns true when `reference` has the shape of a content id.
pub fn is_digest(reference: &str) -> bool {
    reference.len() == 64
        && reference
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Durable, content-addressed store for filter source
///
/// One flat namespace under a single root directory: entries named by
/// 64-character digest, plus an alias table mapping human-chosen names to
/// digests. Records are immutable once written (the same digest always maps
/// to the same bytes); aliases are mutable pointers. Removing a record does
/// not cascade to its aliases, so a dangling alias is a possible state.
pub struct FilterStore {
    root: PathBuf,
}

impl FilterStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> IopipeResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Persist `bytes` under their digest and return the id
    ///
    /// Idempotent: writing identical bytes twice yields the same id and an
    /// overwrite with identical content; "already exists" is never an error.
    pub fn write(&self, bytes: &[u8]) -> IopipeResult<String> {
        let id = digest(bytes);
        fs::write(self.entry_path(&id), bytes)?;
        debug!("cached filter {} ({} bytes)", id, bytes.len());
        Ok(id)
    }

    /// Read the bytes stored under `name`, following one level of alias
    /// indirection. Raw digests and aliases share the same namespace.
    pub fn read(&self, name: &str) -> IopipeResult<Vec<u8>> {
        let path = self.entry_path(name);
        if path.is_file() {
            return Ok(fs::read(path)?);
        }
        if let Some(id) = self.load_aliases()?.get(name) {
            let target = self.entry_path(id);
            if target.is_file() {
                return Ok(fs::read(target)?);
            }
            // Dangling alias: the record it pointed at was removed.
            return Err(IopipeError::NotFound(format!("{} -> {}", name, id)));
        }
        Err(IopipeError::NotFound(name.to_string()))
    }

    /// Create an alias from `name` to the record `id`
    ///
    /// Fails with `AliasConflict` if `name` already points at a different
    /// record; re-pointing an existing name is the distinct `retag`
    /// operation.
    pub fn alias(&self, id: &str, name: &str) -> IopipeResult<()> {
        let mut aliases = self.load_aliases()?;
        if let Some(existing) = aliases.get(name) {
            if existing != id {
                return Err(IopipeError::AliasConflict {
                    name: name.to_string(),
                    existing: existing.clone(),
                });
            }
            return Ok(());
        }
        aliases.insert(name.to_string(), id.to_string());
        self.save_aliases(&aliases)
    }

    /// Re-point an alias, overwriting any previous target. Across concurrent
    /// process invocations this is last-writer-wins.
    pub fn retag(&self, id: &str, name: &str) -> IopipeResult<()> {
        let mut aliases = self.load_aliases()?;
        aliases.insert(name.to_string(), id.to_string());
        self.save_aliases(&aliases)
    }

    /// Delete the entry stored under `name`
    ///
    /// Removing an alias deletes only the mapping record; removing a record
    /// leaves its aliases in place (dangling).
    pub fn remove(&self, name: &str) -> IopipeResult<()> {
        let mut aliases = self.load_aliases()?;
        if aliases.remove(name).is_some() {
            return self.save_aliases(&aliases);
        }
        let path = self.entry_path(name);
        if !path.is_file() {
            return Err(IopipeError::NotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Enumerate every entry: content ids and aliases, indistinguishably.
    pub fn list(&self) -> IopipeResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name != ALIAS_TABLE_FILE {
                names.push(name);
            }
        }
        names.extend(self.load_aliases()?.into_keys());
        names.sort();
        Ok(names)
    }

    fn load_aliases(&self) -> IopipeResult<BTreeMap<String, String>> {
        let path = self.root.join(ALIAS_TABLE_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save_aliases(&self, aliases: &BTreeMap<String, String>) -> IopipeResult<()> {
        let path = self.root.join(ALIAS_TABLE_FILE);
        fs::write(path, serde_json::to_vec_pretty(aliases)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FilterStore) {
        let dir = TempDir::new().unwrap();
        let store = FilterStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_digest_is_stable_lowercase_hex() {
        let id = digest(b"hello");
        assert_eq!(
            id,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(is_digest(&id));
    }

    #[test]
    fn test_is_digest_rejects_other_shapes() {
        assert!(!is_digest("short"));
        assert!(!is_digest("com.example.TypeA/com.example.TypeB"));
        // Right length, wrong alphabet.
        assert!(!is_digest(&"G".repeat(64)));
        assert!(!is_digest(&"A".repeat(64)));
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let (_dir, store) = store();
        let id = store.write(b"input + \"!\"").unwrap();
        assert_eq!(store.read(&id).unwrap(), b"input + \"!\"");
    }

    #[test]
    fn test_write_is_idempotent() {
        let (_dir, store) = store();
        let first = store.write(b"same bytes").unwrap();
        let second = store.write(b"same bytes").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.read(&first).unwrap(), b"same bytes");
    }

    #[test]
    fn test_read_missing_entry() {
        let (_dir, store) = store();
        let err = store.read("no-such-entry").unwrap_err();
        assert!(matches!(err, IopipeError::NotFound(_)));
    }

    #[test]
    fn test_alias_indirection() {
        let (_dir, store) = store();
        let id = store.write(b"body").unwrap();
        store.alias(&id, "nice-name").unwrap();
        assert_eq!(store.read("nice-name").unwrap(), store.read(&id).unwrap());
    }

    #[test]
    fn test_alias_conflict() {
        let (_dir, store) = store();
        let a = store.write(b"aaa").unwrap();
        let b = store.write(b"bbb").unwrap();
        store.alias(&a, "name").unwrap();
        // Same target again is a no-op, not a conflict.
        store.alias(&a, "name").unwrap();
        let err = store.alias(&b, "name").unwrap_err();
        assert!(matches!(err, IopipeError::AliasConflict { .. }));
        // Retag is the explicit overwrite operation.
        store.retag(&b, "name").unwrap();
        assert_eq!(store.read("name").unwrap(), b"bbb");
    }

    #[test]
    fn test_remove_does_not_cascade_to_aliases() {
        let (_dir, store) = store();
        let id = store.write(b"soon gone").unwrap();
        store.alias(&id, "dangler").unwrap();
        store.remove(&id).unwrap();
        // The alias survives but resolves to nothing.
        assert!(store.list().unwrap().contains(&"dangler".to_string()));
        assert!(matches!(
            store.read("dangler").unwrap_err(),
            IopipeError::NotFound(_)
        ));
    }

    #[test]
    fn test_remove_alias_only() {
        let (_dir, store) = store();
        let id = store.write(b"kept").unwrap();
        store.alias(&id, "name").unwrap();
        store.remove("name").unwrap();
        assert_eq!(store.read(&id).unwrap(), b"kept");
        assert!(!store.list().unwrap().contains(&"name".to_string()));
    }

    #[test]
    fn test_remove_missing_entry() {
        let (_dir, store) = store();
        assert!(matches!(
            store.remove("ghost").unwrap_err(),
            IopipeError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_merges_ids_and_aliases() {
        let (_dir, store) = store();
        let id = store.write(b"x").unwrap();
        store.alias(&id, "an-alias").unwrap();
        let names = store.list().unwrap();
        assert!(names.contains(&id));
        assert!(names.contains(&"an-alias".to_string()));
        // The alias table itself is not an entry.
        assert!(!names.iter().any(|n| n == "aliases.json"));
    }
}
