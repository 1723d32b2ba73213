//! Command manifest - declarative name -> source mapping

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the declarative manifest inside the commands directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One manifest entry: backing source file plus lookup aliases.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file: PathBuf,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The loaded manifest mapping. Keys are lower-cased command names,
/// rebuilt wholesale on every load.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    /// Load the manifest for a commands directory. Read or parse failure,
    /// or an empty mapping, falls back to a directory scan; absence of
    /// commands is a valid empty end state, never an error.
    pub fn load(dir: &Path) -> Self {
        let manifest = Self::from_file(&dir.join(MANIFEST_FILE));
        if manifest.entries.is_empty() {
            return Self::scan_dir(dir);
        }
        manifest
    }

    fn from_file(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Manifest read failed: {}", e);
                }
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, ManifestEntry>>(&raw) {
            Ok(map) => Self {
                entries: map
                    .into_iter()
                    .map(|(name, entry)| (name.to_lowercase(), entry))
                    .collect(),
            },
            Err(e) => {
                tracing::warn!("Manifest parse failed: {}", e);
                Self::default()
            }
        }
    }

    /// Fallback: synthesize one aliasless entry per library file, named
    /// after the file stem (minus the platform lib prefix).
    fn scan_dir(dir: &Path) -> Self {
        let mut entries = HashMap::new();
        let read = match std::fs::read_dir(dir) {
            Ok(read) => read,
            Err(_) => return Self::default(),
        };

        for entry in read.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(std::env::consts::DLL_EXTENSION)
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = stem
                .strip_prefix(std::env::consts::DLL_PREFIX)
                .unwrap_or(stem)
                .to_lowercase();
            if name.is_empty() {
                continue;
            }
            let file = PathBuf::from(entry.file_name());
            entries.insert(name, ManifestEntry { file, aliases: vec![] });
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    /// Case-insensitive linear scan over every entry's alias list.
    pub fn find_by_alias(&self, alias: &str) -> Option<&ManifestEntry> {
        self.entries.values().find(|entry| {
            entry
                .aliases
                .iter()
                .any(|a| a.to_lowercase() == alias)
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("waru-manifest-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn lib_name(stem: &str) -> String {
        format!(
            "{}{}.{}",
            std::env::consts::DLL_PREFIX,
            stem,
            std::env::consts::DLL_EXTENSION
        )
    }

    #[test]
    fn loads_declarative_manifest_with_lowercased_keys() {
        let dir = temp_dir();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            r#"{"Ping": {"file": "ping.so", "aliases": ["P"]}}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&dir);
        let entry = manifest.get("ping").unwrap();
        assert_eq!(entry.file, PathBuf::from("ping.so"));
        assert_eq!(entry.aliases, vec!["P".to_string()]);
        assert!(manifest.get("Ping").is_none());
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        let dir = temp_dir();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            r#"{"ping": {"file": "ping.so", "aliases": ["P"]}}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&dir);
        assert!(manifest.find_by_alias("p").is_some());
        assert!(manifest.find_by_alias("x").is_none());
    }

    #[test]
    fn missing_manifest_falls_back_to_directory_scan() {
        let dir = temp_dir();
        std::fs::write(dir.join(lib_name("menu")), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();

        let manifest = Manifest::load(&dir);
        assert_eq!(manifest.len(), 1);
        let entry = manifest.get("menu").unwrap();
        assert!(entry.aliases.is_empty());
    }

    #[test]
    fn corrupt_manifest_falls_back_to_directory_scan() {
        let dir = temp_dir();
        std::fs::write(dir.join(MANIFEST_FILE), b"{not json").unwrap();
        std::fs::write(dir.join(lib_name("ping")), b"").unwrap();

        let manifest = Manifest::load(&dir);
        assert!(manifest.get("ping").is_some());
    }

    #[test]
    fn missing_directory_yields_empty_manifest() {
        let dir = std::env::temp_dir().join(format!("waru-gone-{}", uuid::Uuid::new_v4()));
        let manifest = Manifest::load(&dir);
        assert!(manifest.is_empty());
    }
}
