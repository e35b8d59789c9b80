use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use shared::domain::ArtworkId;
use storage::KeyValueStore;
use tracing::{debug, info, warn};

use crate::error::SelectionError;

pub const DEFAULT_SELECTION_KEY: &str = "selected_artworks";

/// Checked state per artwork id, keyed by the id's decimal string.
///
/// A missing key reads as unchecked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeMap<String, bool>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_checked(&self, id: ArtworkId) -> bool {
        self.0.get(&id.to_string()).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: ArtworkId, checked: bool) {
        self.0.insert(id.to_string(), checked);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of stored entries, unchecked ones included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn checked_count(&self) -> usize {
        self.0.values().filter(|checked| **checked).count()
    }

    /// Checked ids in ascending order. Keys that are not integers are skipped.
    pub fn checked_ids(&self) -> Vec<ArtworkId> {
        let mut ids: Vec<ArtworkId> = self
            .0
            .iter()
            .filter(|(_, checked)| **checked)
            .filter_map(|(key, _)| key.parse().ok())
            .collect();
        ids.sort();
        ids
    }
}

/// What "select all" means while the universe is still being discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectAllPolicy {
    /// Select the ids known at call time only.
    #[default]
    Snapshot,
    /// Also select ids discovered later, until the user unchecks something.
    FollowUniverse,
}

impl fmt::Display for SelectAllPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => f.write_str("snapshot"),
            Self::FollowUniverse => f.write_str("follow_universe"),
        }
    }
}

impl FromStr for SelectAllPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "follow" | "follow_universe" => Ok(Self::FollowUniverse),
            other => Err(format!("unknown select-all policy '{other}'")),
        }
    }
}

/// Owns the selection and the known universe and writes every selection
/// change through to the key-value store.
pub struct SelectionCoordinator {
    store: Arc<dyn KeyValueStore>,
    key: String,
    policy: SelectAllPolicy,
    selection: SelectionSet,
    universe: Vec<ArtworkId>,
    universe_complete: bool,
    following_universe: bool,
}

impl SelectionCoordinator {
    /// Restores the persisted selection. Loading never writes back to the store.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        policy: SelectAllPolicy,
    ) -> Result<Self, SelectionError> {
        let key = key.into();
        let selection = match store.get(&key).await.map_err(SelectionError::Store)? {
            Some(raw) => serde_json::from_str::<SelectionSet>(&raw).map_err(|source| {
                SelectionError::CorruptState {
                    key: key.clone(),
                    source,
                }
            })?,
            None => SelectionSet::new(),
        };
        info!(
            key = %key,
            checked = selection.checked_count(),
            "selection: restored persisted state"
        );

        Ok(Self {
            store,
            key,
            policy,
            selection,
            universe: Vec::new(),
            universe_complete: false,
            following_universe: false,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> SelectAllPolicy {
        self.policy
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn is_checked(&self, id: ArtworkId) -> bool {
        self.selection.is_checked(id)
    }

    pub fn universe(&self) -> &[ArtworkId] {
        &self.universe
    }

    pub fn is_universe_complete(&self) -> bool {
        self.universe_complete
    }

    pub fn is_following_universe(&self) -> bool {
        self.following_universe
    }

    pub async fn toggle(&mut self, id: ArtworkId, checked: bool) {
        self.selection.set(id, checked);
        if !checked {
            self.following_universe = false;
        }
        debug!(id = id.0, checked, "selection: toggled");
        self.persist().await;
    }

    /// `true` checks every known universe id; `false` is [`Self::clear_all`].
    pub async fn select_all(&mut self, checked: bool) {
        if !checked {
            self.clear_all().await;
            return;
        }

        for id in &self.universe {
            self.selection.set(*id, true);
        }
        self.following_universe =
            self.policy == SelectAllPolicy::FollowUniverse && !self.universe_complete;
        info!(
            ids = self.universe.len(),
            universe_complete = self.universe_complete,
            following = self.following_universe,
            "selection: selected all known ids"
        );
        self.persist().await;
    }

    pub async fn clear_all(&mut self) {
        self.selection.clear();
        self.following_universe = false;
        info!("selection: cleared");
        self.persist().await;
    }

    /// True iff the universe is non-empty and every id in it is checked.
    pub fn all_selected(&self) -> bool {
        !self.universe.is_empty() && self.universe.iter().all(|id| self.selection.is_checked(*id))
    }

    /// Appends newly discovered ids, checking them when following a select-all.
    pub async fn extend_universe(&mut self, ids: &[ArtworkId]) {
        if ids.is_empty() {
            return;
        }
        self.universe.extend_from_slice(ids);
        if self.following_universe {
            for id in ids {
                self.selection.set(*id, true);
            }
            debug!(ids = ids.len(), "selection: extended select-all to new ids");
            self.persist().await;
        }
    }

    /// Forgets the known universe ahead of a new enumeration run.
    pub fn reset_universe(&mut self) {
        self.universe.clear();
        self.universe_complete = false;
    }

    pub fn set_universe_complete(&mut self, complete: bool) {
        self.universe_complete = complete;
        if complete {
            self.following_universe = false;
        }
    }

    async fn persist(&self) {
        let raw = match serde_json::to_string(&self.selection) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key = %self.key, %error, "selection: failed to encode state");
                return;
            }
        };
        if let Err(error) = self.store.set(&self.key, &raw).await {
            warn!(key = %self.key, error = %format!("{error:#}"), "selection: failed to persist state");
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
