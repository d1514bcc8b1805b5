//! LocalStorage persistence for settings and high scores
//!
//! Values are stored as JSON strings under fixed keys. On native builds an
//! in-memory store stands in for LocalStorage so the same code paths run in
//! tests.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a load or save failed
#[derive(Error, Debug)]
pub enum StorageError {
    /// No LocalStorage (private mode, sandboxed iframe, ...)
    #[error("storage unavailable")]
    Unavailable,
    /// Stored value is not valid JSON for the requested type
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    /// Value could not be serialized
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
    /// The browser rejected the write (quota, permissions)
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Load and decode the value stored under `key` (`Ok(None)` if absent)
pub fn load_json<T: DeserializeOwned>(key: &str) -> Result<Option<T>, StorageError> {
    let Some(json) = backend::get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(StorageError::Corrupt)
}

/// Encode `value` and store it under `key`
pub fn save_json<T: Serialize>(key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(StorageError::Encode)?;
    backend::set(key, &json)
}

/// Delete the value under `key`
pub fn remove(key: &str) -> Result<(), StorageError> {
    backend::remove(key)
}

/// Load `key`, falling back to `T::default()` and logging why.
/// Corrupt values are discarded so the next save starts clean.
pub fn load_or_default<T: DeserializeOwned + Default>(key: &str) -> T {
    match load_json(key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            log::info!("No stored value for {key}, using defaults");
            T::default()
        }
        Err(e @ StorageError::Corrupt(_)) => {
            log::warn!("Discarding corrupt value for {key}: {e}");
            if let Err(e) = remove(key) {
                log::warn!("Could not remove {key}: {e}");
            }
            T::default()
        }
        Err(e) => {
            log::warn!("Could not load {key}: {e}");
            T::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod backend {
    use super::StorageError;

    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }

    pub fn get(key: &str) -> Result<Option<String>, StorageError> {
        storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    pub fn set(key: &str, value: &str) -> Result<(), StorageError> {
        storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }

    pub fn remove(key: &str) -> Result<(), StorageError> {
        storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod backend {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::StorageError;

    thread_local! {
        static STORE: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
    }

    pub fn get(key: &str) -> Result<Option<String>, StorageError> {
        Ok(STORE.with(|s| s.borrow().get(key).cloned()))
    }

    pub fn set(key: &str, value: &str) -> Result<(), StorageError> {
        STORE.with(|s| s.borrow_mut().insert(key.to_string(), value.to_string()));
        Ok(())
    }

    pub fn remove(key: &str) -> Result<(), StorageError> {
        STORE.with(|s| s.borrow_mut().remove(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Default, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: u32,
    }

    #[test]
    fn test_missing_key_is_none() {
        let loaded: Option<Sample> = load_json("persistence_test_missing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let sample = Sample {
            name: "tower".into(),
            value: 7,
        };
        save_json("persistence_test_saved", &sample).unwrap();
        let loaded: Option<Sample> = load_json("persistence_test_saved").unwrap();
        assert_eq!(loaded, Some(sample));

        remove("persistence_test_saved").unwrap();
        let loaded: Option<Sample> = load_json("persistence_test_saved").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_value_reports_error_and_defaults() {
        backend::set("persistence_test_corrupt", "{not json").unwrap();
        let err = load_json::<Sample>("persistence_test_corrupt").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(err.to_string().contains("corrupt"));

        let fallback: Sample = load_or_default("persistence_test_corrupt");
        assert_eq!(fallback, Sample::default());
        // The bad value is gone afterwards
        assert!(load_json::<Sample>("persistence_test_corrupt").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_error_keeps_json_source() {
        use std::error::Error as _;

        backend::set("persistence_test_source", "[1, 2").unwrap();
        let err = load_json::<Sample>("persistence_test_source").unwrap_err();
        let source = err.source().expect("corrupt error should carry its cause");
        assert!(source.downcast_ref::<serde_json::Error>().is_some());
        assert!(StorageError::Unavailable.source().is_none());
        assert_eq!(
            StorageError::Write("quota".into()).to_string(),
            "storage write failed: quota"
        );
    }
}
