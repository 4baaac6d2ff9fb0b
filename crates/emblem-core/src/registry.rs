//! The rank registry: every assignable entry, keyed by name.
//!
//! One registry exists per joined server. It is built once per join, from
//! the definition file on a fresh join or from the persisted snapshot on a
//! resume, and only ever mutated by realization upgrading entries in place.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::definition::parse_definition;
use crate::error::{ColourFormatError, RealizeError, SnapshotError};
use crate::rank::{LiveRoles, Ranklike, RoleCreator};

/// Outcome of a registry-wide realization pass.
#[derive(Debug)]
pub struct RealizeOutcome {
    /// Whether any persisted state may have changed; when set, the caller
    /// must write a fresh snapshot before acting on `error`.
    pub changed: bool,
    /// First platform failure. Entries after a failed one still ran.
    pub error: Option<RealizeError>,
}

/// Name-keyed registry. Insertion order is kept so realization and
/// snapshots follow the definition file.
#[derive(Debug, Default)]
pub struct RankRegistry {
    entries: Vec<Ranklike>,
    index: HashMap<String, usize>,
}

impl RankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Duplicate names keep the newest definition.
    pub fn insert(&mut self, entry: Ranklike) {
        let name = entry.name().to_owned();
        match self.index.get(&name) {
            Some(&slot) => {
                warn!(rank = %name, "duplicate rank name, keeping the newest definition");
                self.entries[slot] = entry;
            }
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Build a registry from a definition document (see
    /// [`parse_definition`]). The first bad line aborts the build.
    pub fn from_definition(text: &str) -> Result<Self, ColourFormatError> {
        let mut registry = Self::new();
        for rank in parse_definition(text)? {
            registry.insert(Ranklike::Rank(rank));
        }
        Ok(registry)
    }

    /// Restore a registry from persisted tagged records, re-binding role
    /// ids against the live platform role set. One bad record aborts the
    /// whole load; a partial registry is never installed.
    pub fn from_snapshot(records: &[Value], live: &LiveRoles) -> Result<Self, SnapshotError> {
        let mut registry = Self::new();
        for record in records {
            registry.insert(Ranklike::from_record(record, live)?);
        }
        Ok(registry)
    }

    /// Serialize every entry. Persist this after any realization pass that
    /// changed state, so the snapshot always reflects the latest progress.
    pub fn to_snapshot(&self) -> Vec<Value> {
        self.entries.iter().map(Ranklike::to_record).collect()
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&Ranklike> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ranklike> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Realize every entry. Entries are independent of each other, so the
    /// pass continues past a failed one; ordering inside an entry is that
    /// entry's own concern. The first error surfaces in the outcome once
    /// the whole pass ran.
    pub async fn realize_all(&mut self, creator: &dyn RoleCreator) -> RealizeOutcome {
        let mut outcome = RealizeOutcome { changed: false, error: None };
        for entry in &mut self.entries {
            match entry.realize(creator).await {
                Ok(changed) => outcome.changed |= changed,
                Err(error) => {
                    warn!(rank = %entry.name(), error = %error, "entry failed to realize");
                    // A group can realize some members before failing, so
                    // assume the worst and re-snapshot.
                    outcome.changed = true;
                    outcome.error.get_or_insert(error);
                }
            }
        }
        outcome
    }
}
