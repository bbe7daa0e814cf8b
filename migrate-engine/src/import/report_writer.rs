//! Writes the final import report, unconditionally (spec §7: "the final
//! report file is always written, even on abort").

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use migrate_model::Report;

use crate::error::{EngineError, EngineResult};

pub struct ReportWriter;

impl ReportWriter {
    pub fn write(target_dir: &Path, report: &Report, now: DateTime<Utc>) -> EngineResult<PathBuf> {
        let file_name = format!("import_report_{}.json", now.format("%Y%m%d_%H%M%S"));
        let path = target_dir.join(file_name);
        let bytes = serde_json::to_vec_pretty(report).map_err(|e| EngineError::other(e.to_string()))?;
        std::fs::write(&path, bytes).map_err(|e| EngineError::other(format!("writing {}: {e}", path.display())))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use migrate_model::{EntityKind, ReportItem};

    #[test]
    fn write_names_file_from_timestamp_and_serializes_report() {
        let tmp = tempfile::tempdir().unwrap();
        let mut report = Report::new();
        report.push(ReportItem::created(EntityKind::Question, 1, 100, "Orders"));

        let stamp = Utc.with_ymd_and_hms(2026, 7, 29, 12, 0, 0).unwrap();
        let path = ReportWriter::write(tmp.path(), &report, stamp).unwrap();

        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "import_report_20260729_120000.json");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Orders"));
    }
}
