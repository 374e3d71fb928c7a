//! In-memory storage adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] on a `HashMap`.  It is
//! the host and simulation backend; an EEPROM or flash adapter implements
//! the same two traits with the same namespacing.
//!
//! - Config validation: [`ModuleConfig::validate`] runs before every save.
//! - Namespace isolation: keys are stored as `namespace::key`.
//! - Blobs larger than [`MAX_BLOB_SIZE`] are refused with `Full`.

use std::cell::RefCell;
use std::collections::HashMap;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::ModuleConfig;

const CONFIG_NAMESPACE: &str = "iochan";
const CONFIG_KEY: &str = "modcfg";

/// Largest value a single key may hold.
pub const MAX_BLOB_SIZE: usize = 512;

#[derive(Default)]
pub struct MemoryStore {
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("MemoryStore: simulation backend");
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<ModuleConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: ModuleConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            cfg.validate()?;
            info!("MemoryStore: loaded config ({} bytes)", bytes.len());
            Ok(cfg)
        } else {
            info!("MemoryStore: no stored config, using defaults");
            Ok(ModuleConfig::default())
        }
    }

    fn save(&self, config: &ModuleConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        info!("MemoryStore: config saved ({} bytes)", bytes.len());
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }
}

impl StoragePort for MemoryStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
