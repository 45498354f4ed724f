//! Conversation state and its persistence.
//!
//! Each conversation is one JSON record (`<state_dir>/<id>.json`) carrying a
//! schema version. Records are loaded on first access and written back after
//! every change, before the change becomes visible in the cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::names::normalize;
use crate::roster::NameList;

/// Current on-disk schema version.
pub const STATE_VERSION: u32 = 1;

/// Chat id as issued by the chat platform (negative for groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub names: NameList,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    version: u32,
    conversation_id: ConversationId,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

impl StateRecord {
    fn from_state(id: ConversationId, state: &ConversationState) -> Self {
        Self {
            version: STATE_VERSION,
            conversation_id: id,
            names: state.names.as_slice().to_vec(),
            updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    fn into_state(self) -> ConversationState {
        let normalized: Vec<String> = self.names.iter().map(|n| normalize(n)).collect();
        let mut names = NameList::new();
        let report = names.add(&normalized);
        if !report.skipped.is_empty() {
            tracing::warn!(
                chat = %self.conversation_id,
                dropped = ?report.skipped,
                "stored list had case-insensitive duplicates"
            );
        }
        ConversationState { names }
    }
}

/// Durable key-value storage of conversation state.
pub trait StateStore {
    /// Returns `None` for a conversation that has never been saved.
    fn load(&self, id: ConversationId) -> anyhow::Result<Option<ConversationState>>;

    fn save(&mut self, id: ConversationId, state: &ConversationState) -> anyhow::Result<()>;
}

/// One JSON file per conversation in a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the state directory.
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            ExitError::Storage(format!("creating state dir {}: {e}", dir.display()))
        })?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: ConversationId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl StateStore for FileStore {
    fn load(&self, id: ConversationId) -> anyhow::Result<Option<ConversationState>> {
        let path = self.path_for(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("reading {}", path.display())));
            }
        };

        let record: StateRecord = serde_json::from_str(&contents).map_err(|e| {
            ExitError::Storage(format!("corrupt state file {}: {e}", path.display()))
        })?;
        if record.version != STATE_VERSION {
            return Err(ExitError::Storage(format!(
                "{} has schema version {}, expected {STATE_VERSION}",
                path.display(),
                record.version
            ))
            .into());
        }
        if record.conversation_id != id {
            tracing::warn!(
                path = %path.display(),
                recorded = %record.conversation_id,
                "state file names a different conversation"
            );
        }

        tracing::debug!(chat = %id, names = record.names.len(), "loaded conversation");
        Ok(Some(record.into_state()))
    }

    fn save(&mut self, id: ConversationId, state: &ConversationState) -> anyhow::Result<()> {
        let path = self.path_for(id);
        let tmp = self.dir.join(format!("{id}.json.tmp"));
        let json = serde_json::to_string_pretty(&StateRecord::from_state(id, state))
            .context("serializing conversation state")?;

        // Write then rename so a crash never leaves a half-written record.
        std::fs::write(&tmp, json)
            .map_err(|e| ExitError::Storage(format!("writing {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| ExitError::Storage(format!("replacing {}: {e}", path.display())))?;

        tracing::debug!(chat = %id, names = state.names.len(), "saved conversation");
        Ok(())
    }
}

/// Volatile store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<ConversationId, ConversationState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, id: ConversationId) -> anyhow::Result<Option<ConversationState>> {
        Ok(self.records.get(&id).cloned())
    }

    fn save(&mut self, id: ConversationId, state: &ConversationState) -> anyhow::Result<()> {
        self.records.insert(id, state.clone());
        Ok(())
    }
}

/// Keyed cache of conversation state in front of a [`StateStore`].
///
/// State is created lazily on first access. Conversations never share state,
/// and all access goes through `&mut self`, so one owner serializes every
/// mutation.
#[derive(Debug)]
pub struct Conversations<S> {
    store: S,
    cache: HashMap<ConversationId, ConversationState>,
}

impl<S: StateStore> Conversations<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current state of a conversation, loading it on first access.
    pub fn get(&mut self, id: ConversationId) -> anyhow::Result<&ConversationState> {
        match self.cache.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let state = self.store.load(id)?.unwrap_or_default();
                Ok(entry.insert(state))
            }
        }
    }

    /// Apply `f` to a copy of the state, persist the copy if it changed, and
    /// only then make it current. A failed save leaves the state untouched.
    pub fn update<T>(
        &mut self,
        id: ConversationId,
        f: impl FnOnce(&mut ConversationState) -> T,
    ) -> anyhow::Result<T> {
        let mut next = self.get(id)?.clone();
        let outcome = f(&mut next);

        if self.cache.get(&id) != Some(&next) {
            self.store.save(id, &next)?;
            self.cache.insert(id, next);
        }
        Ok(outcome)
    }
}
