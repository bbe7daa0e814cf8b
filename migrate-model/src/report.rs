//! Import report: per-entity outcome tallies and items.

use serde::{Deserialize, Serialize};

/// What kind of entity a report item describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Collection,
    Question,
    Dashboard,
    Permissions,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Collection => "collection",
            Self::Question => "question",
            Self::Dashboard => "dashboard",
            Self::Permissions => "permissions",
        };
        write!(f, "{}", s)
    }
}

/// The outcome of attempting to install one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Created,
    Updated,
    Skipped,
    Failed,
}

/// One row of the import report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub kind: EntityKind,
    pub status: ReportStatus,
    pub source_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReportItem {
    pub fn created(kind: EntityKind, source_id: i64, target_id: i64, name: impl Into<String>) -> Self {
        Self {
            kind,
            status: ReportStatus::Created,
            source_id,
            target_id: Some(target_id),
            name: name.into(),
            reason: None,
        }
    }

    pub fn updated(kind: EntityKind, source_id: i64, target_id: i64, name: impl Into<String>) -> Self {
        Self {
            kind,
            status: ReportStatus::Updated,
            source_id,
            target_id: Some(target_id),
            name: name.into(),
            reason: None,
        }
    }

    pub fn skipped(kind: EntityKind, source_id: i64, target_id: i64, name: impl Into<String>) -> Self {
        Self {
            kind,
            status: ReportStatus::Skipped,
            source_id,
            target_id: Some(target_id),
            name: name.into(),
            reason: None,
        }
    }

    pub fn failed(
        kind: EntityKind,
        source_id: i64,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status: ReportStatus::Failed,
            source_id,
            target_id: None,
            name: name.into(),
            reason: Some(reason.into()),
        }
    }
}

/// Per-kind counters, tallied as items are appended.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KindCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl KindCounts {
    fn record(&mut self, status: ReportStatus) {
        match status {
            ReportStatus::Created => self.created += 1,
            ReportStatus::Updated => self.updated += 1,
            ReportStatus::Skipped => self.skipped += 1,
            ReportStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

/// The full import report: counters per entity kind plus the ordered
/// list of items, written to `import_report_<timestamp>.json` even when
/// the run aborts partway through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub collections: KindCounts,
    pub questions: KindCounts,
    pub dashboards: KindCounts,
    pub permissions: KindCounts,
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item and update the matching kind's counters.
    pub fn push(&mut self, item: ReportItem) {
        let counts = match item.kind {
            EntityKind::Collection => &mut self.collections,
            EntityKind::Question => &mut self.questions,
            EntityKind::Dashboard => &mut self.dashboards,
            EntityKind::Permissions => &mut self.permissions,
        };
        counts.record(item.status);
        self.items.push(item);
    }

    /// True if any item failed — drives the CLI's exit code 4.
    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|i| i.status == ReportStatus::Failed)
    }
}
