//! Persistent client storage for override sheets and endpoint overrides.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sheetform_types::SurveyId;

use crate::config::{ConfigError, EndpointOverrides};

/// Storage key of the endpoint-map blob.
pub const ENDPOINTS_KEY: &str = "survey-endpoints";

/// Storage key of the override sheet for a survey.
pub fn override_key(survey: SurveyId) -> String {
    format!("survey-override-{survey}")
}

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Key-value style storage for the blobs a form needs between loads.
pub trait OverrideStore: Send + Sync {
    /// The uploaded override sheet for a survey, if any.
    fn override_text(&self, survey: SurveyId) -> Result<Option<String>, StoreError>;

    /// Store an override sheet, replacing any previous one.
    fn save_override(&self, survey: SurveyId, text: &str) -> Result<(), StoreError>;

    /// Remove the override sheet for a survey. Missing overrides are not an error.
    fn clear_override(&self, survey: SurveyId) -> Result<(), StoreError>;

    /// The saved endpoint overrides (empty if none were saved).
    fn endpoint_overrides(&self) -> Result<EndpointOverrides, StoreError>;

    /// Replace the saved endpoint overrides.
    fn save_endpoint_overrides(&self, overrides: &EndpointOverrides) -> Result<(), StoreError>;
}

/// Read endpoint overrides, degrading to none when the store cannot provide them.
pub fn load_endpoint_overrides(store: &dyn OverrideStore) -> EndpointOverrides {
    store.endpoint_overrides().unwrap_or_else(|err| {
        tracing::warn!("ignoring saved endpoints: {err}");
        EndpointOverrides::new()
    })
}

/// In-memory store, used by tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an override sheet for `survey`.
    pub fn with_override(self, survey: SurveyId, text: impl Into<String>) -> Self {
        self.put(override_key(survey), text.into());
        self
    }

    /// Store a raw blob under an arbitrary key.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OverrideStore for MemoryStore {
    fn override_text(&self, survey: SurveyId) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(&override_key(survey)).cloned())
    }

    fn save_override(&self, survey: SurveyId, text: &str) -> Result<(), StoreError> {
        self.put(override_key(survey), text);
        Ok(())
    }

    fn clear_override(&self, survey: SurveyId) -> Result<(), StoreError> {
        self.lock().remove(&override_key(survey));
        Ok(())
    }

    fn endpoint_overrides(&self) -> Result<EndpointOverrides, StoreError> {
        match self.lock().get(ENDPOINTS_KEY) {
            Some(json) => Ok(EndpointOverrides::from_json(json)?),
            None => Ok(EndpointOverrides::new()),
        }
    }

    fn save_endpoint_overrides(&self, overrides: &EndpointOverrides) -> Result<(), StoreError> {
        self.put(ENDPOINTS_KEY, overrides.to_json()?);
        Ok(())
    }
}

/// Store keeping one file per key in a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The directory holding the blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn override_path(&self, survey: SurveyId) -> PathBuf {
        self.root.join(format!("{}.csv", override_key(survey)))
    }

    fn endpoints_path(&self) -> PathBuf {
        self.root.join(format!("{ENDPOINTS_KEY}.json"))
    }

    fn read(&self, path: &Path) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        std::fs::write(path, contents).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl OverrideStore for DirStore {
    fn override_text(&self, survey: SurveyId) -> Result<Option<String>, StoreError> {
        self.read(&self.override_path(survey))
    }

    fn save_override(&self, survey: SurveyId, text: &str) -> Result<(), StoreError> {
        self.write(&self.override_path(survey), text)
    }

    fn clear_override(&self, survey: SurveyId) -> Result<(), StoreError> {
        let path = self.override_path(survey);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn endpoint_overrides(&self) -> Result<EndpointOverrides, StoreError> {
        match self.read(&self.endpoints_path())? {
            Some(json) => Ok(EndpointOverrides::from_json(&json)?),
            None => Ok(EndpointOverrides::new()),
        }
    }

    fn save_endpoint_overrides(&self, overrides: &EndpointOverrides) -> Result<(), StoreError> {
        self.write(&self.endpoints_path(), &overrides.to_json()?)
    }
}
