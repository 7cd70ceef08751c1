//! Regret-matching engine.
//!
//! `RegretEngine` owns the regret, strategy and strategy-sum tables together
//! with the random source used for action sampling. Every decision point the
//! host visits goes through one `sample_action` call, and every observed
//! outcome comes back as a scalar regret through `accumulate_regret`.
//!
//! There is no game-tree traversal here: the engine is the strategy-update
//! primitive of MCCFR applied to single-shot states.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cfr::config::EngineConfig;
use crate::cfr::error::{EngineError, EngineResult, StorageError};
use crate::cfr::remote::{ContentStore, GithubContents};
use crate::cfr::storage::{ProgressDocument, RegretStorage, Strategy};

/// The regret-matching engine.
///
/// The engine takes `&mut self` for every mutating operation and does no
/// locking. Hosts serving concurrent requests share it through
/// [`SharedEngine`].
///
/// # Example
/// ```
/// use ofc_regret::cfr::{EngineConfig, RegretEngine};
///
/// let mut engine = RegretEngine::new(EngineConfig::default().with_seed(1));
/// engine.register_actions("r1|c12|0-0-0", ["top", "middle", "bottom"]);
/// engine.accumulate_regret("r1|c12|0-0-0", "bottom", 2.0);
///
/// let action = engine.sample_action("r1|c12|0-0-0").unwrap();
/// assert_eq!(action, "bottom");
/// ```
#[derive(Debug)]
pub struct RegretEngine {
    /// Configuration for the engine.
    config: EngineConfig,

    /// The three tables.
    storage: RegretStorage,

    /// Random number generator.
    rng: StdRng,
}

impl RegretEngine {
    /// Create an engine with empty tables.
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            storage: RegretStorage::new(),
            rng,
        }
    }

    /// Create an engine and restore it from the configured progress path.
    ///
    /// A missing progress document leaves the tables empty.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let mut engine = Self::new(config);
        let path = engine.config.progress_path.clone();
        engine.restore(&path)?;
        Ok(engine)
    }

    /// Register the actions available at `state`.
    ///
    /// Must happen (here or through [`accumulate_regret`](Self::accumulate_regret))
    /// before a strategy is requested for the state.
    pub fn register_actions<I, S>(&mut self, state: &str, actions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.storage.register_actions(state, actions);
    }

    /// Add `delta` to the cumulative regret of `action` at `state`.
    pub fn accumulate_regret(&mut self, state: &str, action: &str, delta: f64) {
        self.storage.accumulate_regret(state, action, delta);
    }

    /// Compute the current strategy for `state` by regret matching.
    ///
    /// Records the result as the state's latest strategy and adds it to the
    /// strategy sum.
    pub fn compute_strategy(&mut self, state: &str) -> EngineResult<Strategy> {
        self.storage.compute_strategy(state)
    }

    /// Sample an action for `state` using the engine's random source.
    pub fn sample_action(&mut self, state: &str) -> EngineResult<String> {
        let strategy = self.storage.compute_strategy(state)?;
        Ok(sample_from(&strategy, &mut self.rng))
    }

    /// Sample an action for `state` using the given random source.
    pub fn sample_action_with<R: Rng + ?Sized>(
        &mut self,
        state: &str,
        rng: &mut R,
    ) -> EngineResult<String> {
        let strategy = self.storage.compute_strategy(state)?;
        Ok(sample_from(&strategy, rng))
    }

    /// Get the average strategy for `state` from the strategy sums.
    pub fn average_strategy(&self, state: &str) -> EngineResult<Strategy> {
        self.storage.average_strategy(state)
    }

    /// Write all three tables to `path` as one JSON document.
    ///
    /// Parent directories are created as needed. The document is written to a
    /// sibling `.tmp` file and renamed over `path`, so an interrupted write
    /// leaves the previous document intact.
    pub fn persist(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        log::info!("{:<32}{:<32}", "saving      progress", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let json = self.storage.export().to_json()?;

        let staging = staging_path(path);
        fs::write(&staging, json).map_err(|e| StorageError::io(&staging, e))?;
        if let Err(e) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(StorageError::io(path, e).into());
        }
        Ok(())
    }

    /// Replace all three tables with the document at `path`.
    ///
    /// Returns `Ok(false)` and leaves the tables untouched if the file does
    /// not exist.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> EngineResult<bool> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{:<32}{:<32}", "no progress at", path.display());
                return Ok(false);
            }
            Err(e) => return Err(StorageError::io(path, e).into()),
        };

        log::info!("{:<32}{:<32}", "loading     progress", path.display());
        let document = ProgressDocument::from_json(&bytes)?;
        self.storage.import(document);
        Ok(true)
    }

    /// Persist to the configured progress path.
    pub fn save(&self) -> EngineResult<()> {
        self.persist(&self.config.progress_path)
    }

    /// Upload all three tables to a remote store.
    ///
    /// Fetches the current revision first so an existing document is updated
    /// rather than overwritten blind.
    pub fn persist_remote<S: ContentStore + ?Sized>(&self, store: &S) -> EngineResult<()> {
        let json = self.storage.export().to_json()?;
        let revision = store.fetch()?.map(|doc| doc.revision);
        store.upsert(json.as_bytes(), revision.as_deref())?;
        log::info!("{:<32}{:<32}", "saved remote progress", self.storage.num_states());
        Ok(())
    }

    /// Replace all three tables with the document held by a remote store.
    ///
    /// Returns `Ok(false)` if the store has no document yet.
    pub fn restore_remote<S: ContentStore + ?Sized>(&mut self, store: &S) -> EngineResult<bool> {
        match store.fetch()? {
            Some(remote) => {
                let document = ProgressDocument::from_json(&remote.content)?;
                self.storage.import(document);
                log::info!("{:<32}{:<32}", "loaded remote progress", remote.revision);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Upload to the remote store named in the configuration.
    ///
    /// Fails with [`EngineError::Configuration`] if no remote is configured or
    /// its credential is missing.
    pub fn push_remote(&self) -> EngineResult<()> {
        let remote = self.config.remote.as_ref().ok_or_else(|| {
            EngineError::Configuration("no remote store configured".to_string())
        })?;
        let store = GithubContents::new(remote)?;
        self.persist_remote(&store)
    }

    /// Registered actions for `state`, in canonical order.
    pub fn actions(&self, state: &str) -> Vec<String> {
        self.storage.actions(state)
    }

    /// Cumulative regret of one action, if registered.
    pub fn regret(&self, state: &str, action: &str) -> Option<f64> {
        self.storage.regret(state, action)
    }

    /// Check if a state has registered actions.
    pub fn contains(&self, state: &str) -> bool {
        self.storage.contains(state)
    }

    /// Get the number of states discovered.
    pub fn num_states(&self) -> usize {
        self.storage.num_states()
    }

    /// Get reference to the storage for analysis.
    pub fn storage(&self) -> &RegretStorage {
        &self.storage
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop every table entry.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

/// Sibling file `persist` writes before renaming into place.
fn staging_path(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut staged = name.to_os_string();
            staged.push(".tmp");
            path.with_file_name(staged)
        }
        None => path.with_extension("tmp"),
    }
}

/// Sample an action according to a probability distribution.
///
/// `strategy` must not be empty.
fn sample_from<R: Rng + ?Sized>(strategy: &Strategy, rng: &mut R) -> String {
    let r: f64 = rng.gen();
    let mut cumsum = 0.0;

    for (action, &prob) in strategy {
        cumsum += prob;
        if r < cumsum {
            return action.clone();
        }
    }

    // Floating point shortfall: take the last action with any weight.
    strategy
        .iter()
        .rev()
        .find(|(_, p)| **p > 0.0)
        .or_else(|| strategy.iter().next_back())
        .map(|(action, _)| action.clone())
        .unwrap_or_default()
}

/// A cloneable, thread-safe handle to one engine.
///
/// All access is serialized through a single mutex.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<RegretEngine>>,
}

impl SharedEngine {
    /// Wrap an engine for shared use.
    pub fn new(engine: RegretEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine.
    pub fn lock(&self) -> MutexGuard<'_, RegretEngine> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("engine lock poisoned; continuing with current tables");
            poisoned.into_inner()
        })
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<T>(&self, f: impl FnOnce(&mut RegretEngine) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }
}

impl From<RegretEngine> for SharedEngine {
    fn from(engine: RegretEngine) -> Self {
        Self::new(engine)
    }
}
