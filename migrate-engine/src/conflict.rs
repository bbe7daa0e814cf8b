//! Conflict resolution for collections, questions, and dashboards.
//!
//! One strategy is selected for the whole run (spec §4.6): `skip` leaves
//! an existing target entity untouched, `overwrite` updates it in place,
//! `rename` always creates a new entity under a probed unique name. Name
//! generation is cached per collection so repeated probes during a run
//! stay O(1) amortized.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The strategy selected for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    Skip,
    Overwrite,
    Rename,
}

impl std::str::FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "rename" => Ok(Self::Rename),
            other => Err(format!("unknown conflict strategy `{other}`, expected one of: skip, overwrite, rename")),
        }
    }
}

/// What to do about one particular name collision, computed by applying
/// the run's [`ConflictStrategy`] to a lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No collision existed; create a new entity with the given name.
    Create { name: String },
    /// A collision existed; reuse this existing target id as-is.
    ReuseExisting { target_id: i64 },
    /// A collision existed; update this existing target id in place.
    UpdateExisting { target_id: i64 },
}

/// Dashboard/question/collection-scoped table of existing target names,
/// used to decide collisions and to generate unique `"<name> (n)"`
/// names under `rename`.
///
/// The scope key is `(name, collection_or_parent_id)` per spec §4.6;
/// `collection_or_parent_id` is `None` for the root.
#[derive(Debug, Default)]
pub struct NameIndex {
    /// Existing target ids, keyed by `(scope, lowercase name)` — lookups
    /// against the target API are case-sensitive in practice but a
    /// single scope rarely holds near-duplicate casings, so an exact
    /// match is used for collision detection; case is preserved in the
    /// stored name for `rename` generation.
    existing: HashMap<(Option<i64>, String), i64>,
    /// Names already generated or observed in a scope, for fast
    /// `rename` probing.
    taken: HashMap<Option<i64>, std::collections::HashSet<String>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an existing target entity so later lookups in the same
    /// scope can find it.
    pub fn record(&mut self, scope: Option<i64>, name: &str, target_id: i64) {
        self.existing.insert((scope, name.to_string()), target_id);
        self.taken.entry(scope).or_default().insert(name.to_string());
    }

    /// Look up an existing target id with this exact name in this
    /// scope.
    pub fn find(&self, scope: Option<i64>, name: &str) -> Option<i64> {
        self.existing.get(&(scope, name.to_string())).copied()
    }

    /// Generate `"<name> (n)"` with the smallest `n >= 1` unique in the
    /// scope, recording it as taken so a subsequent probe in the same
    /// run doesn't repeat it.
    pub fn generate_unique_name(&mut self, scope: Option<i64>, base_name: &str) -> String {
        let taken = self.taken.entry(scope).or_default();
        if !taken.contains(base_name) {
            taken.insert(base_name.to_string());
            return base_name.to_string();
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{base_name} ({n})");
            if !taken.contains(&candidate) {
                taken.insert(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }

    /// Decide what to do about `name` in `scope` under `strategy`.
    pub fn resolve(&mut self, strategy: ConflictStrategy, scope: Option<i64>, name: &str) -> Resolution {
        match self.find(scope, name) {
            None => {
                self.taken.entry(scope).or_default().insert(name.to_string());
                Resolution::Create { name: name.to_string() }
            }
            Some(target_id) => match strategy {
                ConflictStrategy::Skip => Resolution::ReuseExisting { target_id },
                ConflictStrategy::Overwrite => Resolution::UpdateExisting { target_id },
                ConflictStrategy::Rename => {
                    let unique = self.generate_unique_name(scope, name);
                    Resolution::Create { name: unique }
                }
            },
        }
    }
}

/// Server-owned dashboard-panel fields stripped before sending a panel
/// back to the server, beyond the fields the rewriter already
/// translates. Decision recorded in `DESIGN.md` (Open Question #2): the
/// spec's source strips some but not all such fields against a live
/// schema that isn't available here, so this list is a single,
/// named edit point rather than an attempt to enumerate the server's
/// current schema.
pub const DASHCARD_STRIPPED_FIELDS: &[&str] = &[
    "id",
    "dashboard_id",
    "created_at",
    "updated_at",
    "entity_id",
    "action_id",
    "collection_authority_level",
    "dashboard_tab_id",
    "creator_id",
    "last-edit-info",
];
