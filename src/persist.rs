//! Persisted output values.
//!
//! One postcard-encoded snapshot of all 16 channels lives under
//! `iochan::outputs`.  The snapshot is written back only when a committed
//! value actually changes, so a servo holding position does not wear the
//! storage.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{OutputStore, StorageError, StoragePort};
use crate::channel::{ChannelId, NUM_CHANNELS};

const OUTPUTS_NAMESPACE: &str = "iochan";
const OUTPUTS_KEY: &str = "outputs";

/// Encoded snapshot never exceeds this (16 × `Option<u8>`).
const MAX_BLOB_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct Snapshot {
    values: [Option<u8>; NUM_CHANNELS],
}

/// [`OutputStore`] backed by a [`StoragePort`].
pub struct StoredOutputs<S: StoragePort> {
    storage: S,
    snapshot: Snapshot,
}

impl<S: StoragePort> StoredOutputs<S> {
    /// Load the stored snapshot.  A missing or corrupt blob starts empty.
    pub fn new(storage: S) -> Self {
        let snapshot = match Self::read_snapshot(&storage) {
            Ok(s) => s,
            Err(StorageError::NotFound) => {
                info!("StoredOutputs: no snapshot, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                warn!("StoredOutputs: discarding snapshot ({e})");
                Snapshot::default()
            }
        };
        Self { storage, snapshot }
    }

    fn read_snapshot(storage: &S) -> Result<Snapshot, StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = storage.read(OUTPUTS_NAMESPACE, OUTPUTS_KEY, &mut buf)?;
        let bytes = buf.get(..len).ok_or(StorageError::Corrupted)?;
        postcard::from_bytes(bytes).map_err(|_| StorageError::Corrupted)
    }

    fn write_snapshot(&mut self) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(&self.snapshot).map_err(|_| StorageError::IoError)?;
        self.storage.write(OUTPUTS_NAMESPACE, OUTPUTS_KEY, &bytes)
    }

    /// Forget every stored value.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.snapshot = Snapshot::default();
        self.storage.delete(OUTPUTS_NAMESPACE, OUTPUTS_KEY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

impl<S: StoragePort> OutputStore for StoredOutputs<S> {
    fn load(&self, ch: ChannelId) -> Option<u8> {
        self.snapshot.values[ch.index()]
    }

    fn commit(&mut self, ch: ChannelId, value: u8) {
        let slot = &mut self.snapshot.values[ch.index()];
        if *slot == Some(value) {
            return;
        }
        *slot = Some(value);
        if let Err(e) = self.write_snapshot() {
            warn!("StoredOutputs: {ch} not persisted ({e})");
        }
    }
}
