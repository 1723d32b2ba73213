//! Command registry - lazy loading, alias indexing, mtime invalidation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

use super::loader::{CommandUnit, LoadedUnit, UnitLoader};
use super::manifest::Manifest;

/// A cached unit together with the source identity it was loaded from.
#[derive(Clone)]
struct CachedUnit {
    loaded: Arc<LoadedUnit>,
    source: PathBuf,
    mtime: SystemTime,
}

/// Registry of lazily-instantiated command units.
///
/// Every operation is total: faults degrade to "not found" plus a log
/// line and never reach the caller.
pub struct CommandRegistry {
    commands_dir: PathBuf,
    loader: Arc<dyn UnitLoader>,
    manifest: RwLock<Manifest>,
    cache: RwLock<HashMap<String, CachedUnit>>,
    refresh: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl CommandRegistry {
    pub fn new(commands_dir: impl Into<PathBuf>, loader: Arc<dyn UnitLoader>) -> Self {
        Self {
            commands_dir: commands_dir.into(),
            loader,
            manifest: RwLock::new(Manifest::default()),
            cache: RwLock::new(HashMap::new()),
            refresh: Mutex::new(None),
        }
    }

    /// Rebuild the manifest mapping wholesale from disk. Cached units are
    /// untouched; they invalidate per-entry via mtime.
    pub fn load_manifest(&self) {
        let manifest = Manifest::load(&self.commands_dir);
        tracing::debug!("Manifest loaded: {} entries", manifest.len());
        if let Ok(mut slot) = self.manifest.write() {
            *slot = manifest;
        }
    }

    /// Resolve a command name or alias to its unit, loading it on first
    /// use. `None` means no backing source was found or the load failed;
    /// callers treat this as a silent no-op.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn CommandUnit>> {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.cached(&key) {
            match std::fs::metadata(&cached.source).and_then(|m| m.modified()) {
                Ok(mtime) if mtime <= cached.mtime => {
                    return Some(Arc::clone(&cached.loaded.unit));
                }
                // Source edited or gone: drop every key served by it and
                // fall through to a fresh load.
                _ => self.evict_source(&cached.source),
            }
        }

        let path = self.resolve_path(&key)?;
        if !path.exists() {
            tracing::debug!("No source for command '{}'", key);
            return None;
        }
        self.load_at(&key, &path)
    }

    /// Load every manifest entry once, so listing commands does not wait
    /// for first invocation. Per-entry failures are logged and skipped.
    pub fn preload_all(&self) {
        let names: Vec<String> = self
            .manifest
            .read()
            .ok()
            .map(|m| m.names().map(str::to_string).collect())
            .unwrap_or_default();

        for name in names {
            let _ = self.resolve(&name);
        }
        tracing::info!("Commands preloaded: {}", self.unit_count());
    }

    /// Start the optional background manifest refresh. Guarded against
    /// overlapping timers; a second call is a no-op.
    pub fn spawn_manifest_refresh(self: &Arc<Self>, interval: Duration) {
        let Ok(mut slot) = self.refresh.lock() else {
            return;
        };
        if slot.is_some() {
            return;
        }

        let registry = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await;
            loop {
                tick.tick().await;
                registry.load_manifest();
                tracing::debug!("Manifest refreshed");
            }
        }));
    }

    pub fn stop_manifest_refresh(&self) {
        if let Ok(mut slot) = self.refresh.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Primary names of all currently cached units, sorted, for menu-style
    /// listings.
    pub fn cached_names(&self) -> Vec<String> {
        let Ok(cache) = self.cache.read() else {
            return Vec::new();
        };
        let mut names: Vec<String> = cache
            .iter()
            .filter(|(key, cached)| cached.loaded.unit.name().to_lowercase() == **key)
            .map(|(key, _)| key.clone())
            .collect();
        names.sort();
        names
    }

    fn cached(&self, key: &str) -> Option<CachedUnit> {
        self.cache.read().ok()?.get(key).cloned()
    }

    fn evict_source(&self, source: &Path) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, cached| cached.source != source);
        }
    }

    /// Map a key to its backing file: manifest name, then alias scan, then
    /// the filename convention.
    fn resolve_path(&self, key: &str) -> Option<PathBuf> {
        let manifest = self.manifest.read().ok()?;
        if let Some(entry) = manifest.get(key).or_else(|| manifest.find_by_alias(key)) {
            return Some(self.commands_dir.join(&entry.file));
        }
        drop(manifest);

        // Filename-convention fallback: lib<key>.<ext>, then <key>.<ext>.
        let prefixed = self.commands_dir.join(format!(
            "{}{}.{}",
            std::env::consts::DLL_PREFIX,
            key,
            std::env::consts::DLL_EXTENSION
        ));
        if prefixed.exists() {
            return Some(prefixed);
        }
        Some(
            self.commands_dir
                .join(format!("{}.{}", key, std::env::consts::DLL_EXTENSION)),
        )
    }

    fn load_at(&self, requested: &str, path: &Path) -> Option<Arc<dyn CommandUnit>> {
        let mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                return None;
            }
        };

        let loaded = match self.loader.load(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Load failed for '{}' ({}): {}", requested, path.display(), e);
                return None;
            }
        };

        let name = loaded.unit.name().trim().to_lowercase();
        if name.is_empty() {
            tracing::warn!("Malformed unit at {}: missing name", path.display());
            return None;
        }

        let cached = CachedUnit {
            loaded: Arc::new(loaded),
            source: path.to_path_buf(),
            mtime,
        };
        let unit = Arc::clone(&cached.loaded.unit);

        if let Ok(mut cache) = self.cache.write() {
            // Register under the declared name, every alias, and the key
            // that was originally asked for.
            for alias in unit.aliases() {
                cache.insert(alias.to_lowercase(), cached.clone());
            }
            cache.insert(name, cached.clone());
            cache.insert(requested.to_string(), cached);
        }

        Some(unit)
    }

    /// Number of distinct cached unit instances.
    fn unit_count(&self) -> usize {
        let Ok(cache) = self.cache.read() else {
            return 0;
        };
        let mut sources: Vec<&Path> = cache.values().map(|c| c.source.as_path()).collect();
        sources.sort();
        sources.dedup();
        sources.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::errors::{CommandError, RegistryError};
    use crate::application::messaging::Context;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process unit used across registry and dispatcher tests.
    pub(crate) struct TestUnit {
        pub name: String,
        pub aliases: Vec<String>,
        pub calls: Arc<AtomicUsize>,
        pub fail: bool,
        pub hang: bool,
    }

    #[async_trait]
    impl CommandUnit for TestUnit {
        fn name(&self) -> &str {
            &self.name
        }

        fn aliases(&self) -> &[String] {
            &self.aliases
        }

        async fn execute(&self, _ctx: Context) -> Result<(), CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(CommandError::ExecutionFailed("boom".to_string()));
            }
            Ok(())
        }
    }

    /// Loader that fabricates units from file stems instead of opening
    /// shared libraries. Counts loads so cache behavior is observable.
    pub(crate) struct StemLoader {
        pub loads: Arc<AtomicUsize>,
        pub aliases: HashMap<String, Vec<String>>,
        pub calls: Arc<AtomicUsize>,
        pub fail_names: Vec<String>,
        pub hang_names: Vec<String>,
        pub blank_names: Vec<String>,
    }

    impl StemLoader {
        pub fn new() -> Self {
            Self {
                loads: Arc::new(AtomicUsize::new(0)),
                aliases: HashMap::new(),
                calls: Arc::new(AtomicUsize::new(0)),
                fail_names: Vec::new(),
                hang_names: Vec::new(),
                blank_names: Vec::new(),
            }
        }
    }

    impl UnitLoader for StemLoader {
        fn load(&self, path: &Path) -> Result<LoadedUnit, RegistryError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let name = stem
                .strip_prefix(std::env::consts::DLL_PREFIX)
                .unwrap_or(stem)
                .to_string();
            let unit = TestUnit {
                aliases: self.aliases.get(&name).cloned().unwrap_or_default(),
                calls: Arc::clone(&self.calls),
                fail: self.fail_names.contains(&name),
                hang: self.hang_names.contains(&name),
                name: if self.blank_names.contains(&name) {
                    String::new()
                } else {
                    name
                },
            };
            Ok(LoadedUnit::from_instance(Arc::new(unit)))
        }
    }

    pub(crate) fn temp_commands_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("waru-registry-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub(crate) fn touch_source(dir: &Path, file: &str) {
        std::fs::write(dir.join(file), b"unit").unwrap();
    }

    fn registry_with(dir: &Path, loader: StemLoader) -> Arc<CommandRegistry> {
        let registry = Arc::new(CommandRegistry::new(dir, Arc::new(loader)));
        registry.load_manifest();
        registry
    }

    #[test]
    fn resolve_by_name_and_alias_share_one_instance() {
        let dir = temp_commands_dir();
        touch_source(&dir, "ping.so");
        std::fs::write(
            dir.join("manifest.json"),
            r#"{"ping": {"file": "ping.so", "aliases": ["p"]}}"#,
        )
        .unwrap();

        let mut loader = StemLoader::new();
        loader
            .aliases
            .insert("ping".to_string(), vec!["p".to_string()]);
        let registry = registry_with(&dir, loader);

        let by_name = registry.resolve("ping").unwrap();
        let by_alias = registry.resolve("P").unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_alias));
    }

    #[test]
    fn resolve_is_idempotent_until_source_changes() {
        let dir = temp_commands_dir();
        touch_source(&dir, "ping.so");
        std::fs::write(dir.join("manifest.json"), r#"{"ping": {"file": "ping.so"}}"#).unwrap();

        let loader = StemLoader::new();
        let loads = Arc::clone(&loader.loads);
        let registry = registry_with(&dir, loader);

        let first = registry.resolve("ping").unwrap();
        let second = registry.resolve("ping").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        // Advance the source mtime: next resolve reloads.
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(dir.join("ping.so"))
            .unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        let third = registry.resolve("ping").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_command_resolves_to_none() {
        let dir = temp_commands_dir();
        let registry = registry_with(&dir, StemLoader::new());
        assert!(registry.resolve("nope").is_none());
        assert!(registry.resolve("  ").is_none());
    }

    #[test]
    fn malformed_unit_is_treated_as_not_found() {
        let dir = temp_commands_dir();
        touch_source(&dir, "bad.so");
        std::fs::write(dir.join("manifest.json"), r#"{"bad": {"file": "bad.so"}}"#).unwrap();

        let mut loader = StemLoader::new();
        loader.blank_names.push("bad".to_string());
        let registry = registry_with(&dir, loader);
        assert!(registry.resolve("bad").is_none());
    }

    #[test]
    fn filename_convention_fallback_without_manifest_entry() {
        let dir = temp_commands_dir();
        let file = format!(
            "{}menu.{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_EXTENSION
        );
        touch_source(&dir, &file);

        // Empty manifest on purpose; the scan fallback picks the file up,
        // and resolve works even for keys the manifest never saw.
        let registry = registry_with(&dir, StemLoader::new());
        let unit = registry.resolve("menu").unwrap();
        assert_eq!(unit.name(), "menu");
    }

    #[test]
    fn preload_all_loads_every_entry_and_skips_failures() {
        let dir = temp_commands_dir();
        touch_source(&dir, "ping.so");
        std::fs::write(
            dir.join("manifest.json"),
            r#"{"ping": {"file": "ping.so"}, "ghost": {"file": "ghost.so"}}"#,
        )
        .unwrap();

        let registry = registry_with(&dir, StemLoader::new());
        registry.preload_all();
        assert_eq!(registry.cached_names(), vec!["ping".to_string()]);
    }
}
