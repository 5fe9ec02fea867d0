//! Tag catalogue loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use loot_core::{ItemId, TagSet};

use crate::loader::LoadResult;

/// On-disk form of a tag catalogue RON file.
///
/// ```ron
/// (
///     tags: {
///         "gems": ["ruby", "topaz"],
///         "metals": ["iron", "gold"],
///     },
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TagCatalog {
    tags: HashMap<String, Vec<ItemId>>,
}

/// Loads a tag catalogue from a RON file into a [`TagSet`].
pub fn load_tags(path: &Path) -> LoadResult<TagSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let catalog: TagCatalog = ron::from_str(&text)
        .with_context(|| format!("invalid tag catalogue in {}", path.display()))?;

    let mut tags = TagSet::new();
    for (name, members) in catalog.tags {
        tags.insert(name, members);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_ron_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.ron");
        std::fs::write(
            &path,
            r#"(
    tags: {
        "gems": ["ruby", "topaz"],
        "metals": ["iron"],
    },
)"#,
        )
        .unwrap();

        let tags = load_tags(&path).unwrap();
        assert_eq!(tags.members("gems").len(), 2);
        assert_eq!(tags.members("metals"), &[ItemId::new("iron")]);
        assert!(tags.members("woods").is_empty());
    }

    #[test]
    fn missing_files_are_reported_with_their_path() {
        let err = load_tags(Path::new("/nonexistent/tags.ron")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/tags.ron"));
    }
}
