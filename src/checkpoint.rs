// Copyright © 2021-2023 HQS Quantum Simulations GmbH. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the
// License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either
// express or implied. See the License for the specific language governing permissions and
// limitations under the License.

//! Optional progress reporting and checkpoint persistence (§5, §6).

use crate::ado::AdoVector;
use crate::error::{HeomError, HeomResult};
use crate::types::Parity;
use num_complex::Complex64;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// A best-effort, single-producer/single-consumer progress channel. Sends must never
/// block computation (§5): implementations should drop updates rather than block.
pub trait ProgressSink: Send + Sync {
    /// Reports that `completed` out of `total` units of work are done.
    fn report(&self, completed: usize, total: usize);
}

/// A channel-backed [`ProgressSink`] built on `std::sync::mpsc`, matching §5's
/// "single-producer, single-consumer channel" and "never block computation": sends use
/// `try_send`-style semantics and silently drop on a full/disconnected receiver.
pub struct ChannelProgressSink {
    sender: std::sync::mpsc::SyncSender<(usize, usize)>,
}

impl ChannelProgressSink {
    /// Creates a bounded channel pair; the returned sink is the producer side, and the
    /// receiver is returned for the caller to poll or forward elsewhere.
    pub fn new(buffer: usize) -> (Self, std::sync::mpsc::Receiver<(usize, usize)>) {
        let (sender, receiver) = std::sync::mpsc::sync_channel(buffer);
        (ChannelProgressSink { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, completed: usize, total: usize) {
        let _ = self.sender.try_send((completed, total));
    }
}

/// A sink that the evolver streams the current ADO vector to after each saved time
/// point (§4.5, §6). Sink write failures are fatal to the propagation (§7).
pub trait CheckpointSink {
    /// Streams the ADO vector at time `t`.
    fn write(&mut self, t: f64, ado: &AdoVector) -> HeomResult<()>;
}

/// A [`CheckpointSink`] that writes each time point to its own file under a base
/// directory. The base directory must not pre-exist (§5, §6, §8 scenario 6): its
/// presence is checked, and the error raised, before any propagation work begins.
pub struct FileCheckpointSink {
    base_path: PathBuf,
}

impl FileCheckpointSink {
    /// Creates the checkpoint directory, failing if it already exists.
    pub fn create(base_path: impl Into<PathBuf>) -> HeomResult<Self> {
        let base_path = base_path.into();
        if base_path.exists() {
            return Err(HeomError::CheckpointAlreadyExists {
                path: base_path.display().to_string(),
            });
        }
        fs::create_dir_all(&base_path).map_err(|e| HeomError::SinkWriteFailed {
            source: e.to_string(),
        })?;
        Ok(FileCheckpointSink { base_path })
    }

    fn path_for(&self, t: f64) -> PathBuf {
        self.base_path.join(format!("{t}.bin"))
    }
}

impl CheckpointSink for FileCheckpointSink {
    fn write(&mut self, t: f64, ado: &AdoVector) -> HeomResult<()> {
        let path = self.path_for(t);
        let mut file = File::create(&path).map_err(|e| HeomError::SinkWriteFailed {
            source: e.to_string(),
        })?;
        for v in ado.data().iter() {
            file.write_all(&v.re.to_le_bytes())
                .and_then(|_| file.write_all(&v.im.to_le_bytes()))
                .map_err(|e| HeomError::SinkWriteFailed {
                    source: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// A stored ADO vector, tagged with the metadata needed to reinterpret it (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredAdo {
    /// System dimension.
    pub d: usize,
    /// Number of ADO blocks.
    pub n_ado: usize,
    /// Parity tag.
    pub parity: Option<Parity>,
    /// Flattened data.
    pub data: Vec<Complex64>,
}

impl From<&AdoVector> for StoredAdo {
    fn from(ado: &AdoVector) -> Self {
        StoredAdo {
            d: ado.d(),
            n_ado: ado.n_ado(),
            parity: ado.parity(),
            data: ado.data().iter().copied().collect(),
        }
    }
}

/// An in-memory keyed blob store for ADO vectors, keyed by decimal time-stamp strings
/// (`"0"`, `"0.01"`, ...). Reopening an existing key is rejected (§6).
#[derive(Debug, Default)]
pub struct KeyedStore {
    entries: HashMap<String, StoredAdo>,
}

impl KeyedStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        KeyedStore {
            entries: HashMap::new(),
        }
    }

    /// Inserts an ADO vector under `key`, failing if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, ado: &AdoVector) -> HeomResult<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(HeomError::KeyAlreadyExists { key });
        }
        self.entries.insert(key, StoredAdo::from(ado));
        Ok(())
    }

    /// Looks up a stored ADO vector by key.
    pub fn get(&self, key: &str) -> Option<&StoredAdo> {
        self.entries.get(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
