//! Batch loading of loot table directories.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use loot_core::convert::RegistrySet;
use loot_core::{LootTable, TableIndex};

use crate::loader::LoadResult;

/// Walks a directory tree, parsing every `*.json` file into a loot table.
///
/// Table keys derive from the path relative to the root, with `/` separators
/// and the extension stripped: `chests/village.json` becomes
/// `chests/village`. A file that fails to parse lands in the registry's
/// error map under its key instead of aborting the batch; only I/O problems
/// on the walk itself fail the whole load.
pub fn load_tables(directory: &Path, registries: &RegistrySet) -> LoadResult<TableRegistry> {
    let mut tables = HashMap::new();
    let mut errors = HashMap::new();

    for entry in WalkDir::new(directory) {
        let entry = entry.with_context(|| {
            format!("failed to walk table directory {}", directory.display())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let key = table_key(directory, path);
        match load_table(path, registries) {
            Ok(table) => {
                debug!(table = %key, path = %path.display(), "loaded loot table");
                tables.insert(key, Arc::new(table));
            }
            Err(error) => {
                warn!(table = %key, path = %path.display(), %error, "failed to load loot table");
                errors.insert(key, error);
            }
        }
    }

    Ok(TableRegistry { tables, errors })
}

fn load_table(path: &Path, registries: &RegistrySet) -> LoadResult<LootTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let node: Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let table = LootTable::from_node(&node, &registries.conversion())
        .with_context(|| format!("invalid loot table in {}", path.display()))?;
    Ok(table)
}

/// Derives the table key from a path relative to the scan root.
fn table_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut key = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if let Some(stripped) = key.strip_suffix(".json") {
        key = stripped.to_string();
    }
    key
}

/// The outcome of a batch load: parsed tables and per-file errors, keyed by
/// the relative-path-derived table key.
pub struct TableRegistry {
    tables: HashMap<String, Arc<LootTable>>,
    errors: HashMap<String, anyhow::Error>,
}

impl TableRegistry {
    pub fn tables(&self) -> &HashMap<String, Arc<LootTable>> {
        &self.tables
    }

    pub fn errors(&self) -> &HashMap<String, anyhow::Error> {
        &self.errors
    }

    /// The table under the given key, if it parsed.
    pub fn get(&self, key: &str) -> Option<&Arc<LootTable>> {
        self.tables.get(key)
    }

    /// The table under the given key, or an empty table.
    pub fn get_or_empty(&self, key: &str) -> Arc<LootTable> {
        self.tables
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::new(LootTable::empty()))
    }

    /// The table under the given key, failing with the parse error if the
    /// file existed but could not be loaded.
    pub fn require(&self, key: &str) -> LoadResult<Arc<LootTable>> {
        if let Some(table) = self.tables.get(key) {
            return Ok(table.clone());
        }
        match self.errors.get(key) {
            Some(error) => Err(anyhow::anyhow!("table '{key}' failed to load: {error:#}")),
            None => Err(anyhow::anyhow!("unknown table key '{key}'")),
        }
    }

    /// Builds the context-ready index for
    /// [`loot_core::keys::TABLES`], so table-reference entries can resolve.
    pub fn index(&self) -> Arc<TableIndex> {
        Arc::new(self.tables.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::registries;
    use loot_core::keys;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn loads_a_directory_tree_with_per_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write(
            root,
            "chests/village.json",
            r#"{"pools": [{"rolls": 1, "entries": [{"type": "item", "name": "bread"}]}]}"#,
        );
        write(
            root,
            "entities/zombie.json",
            r#"{"pools": [{"rolls": 2, "entries": [{"type": "item", "name": "flesh"}]}]}"#,
        );
        write(root, "broken.json", r#"{"pools": [{"rolls": 1}]}"#);
        write(root, "notes.txt", "not a table");

        let set = registries().unwrap();
        let registry = load_tables(root, &set).unwrap();

        assert_eq!(registry.tables().len(), 2);
        assert!(registry.get("chests/village").is_some());
        assert!(registry.get("entities/zombie").is_some());

        // The broken file is reported under its key, not silently dropped.
        assert_eq!(registry.errors().len(), 1);
        assert!(registry.errors().contains_key("broken"));
        assert!(registry.require("broken").is_err());

        // Unknown keys are distinguishable from parse failures.
        assert!(registry.require("missing").is_err());
        assert!(registry.get("notes").is_none());
    }

    #[test]
    fn loaded_tables_generate() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "gifts/cat.json",
            r#"{"pools": [{"rolls": 3, "entries": [{"type": "item", "name": "string"}]}]}"#,
        );

        let set = registries().unwrap();
        let registry = load_tables(root, &set).unwrap();

        let mut ctx = loot_core::LootContext::builder()
            .rng(ChaCha12Rng::seed_from_u64(1))
            .with(&keys::TABLES, registry.index())
            .build();

        let items = registry.require("gifts/cat").unwrap().generate(&mut ctx).unwrap();
        assert_eq!(items.len(), 3);
    }
}
