//! Report archive
//!
//! Each report is written to `<report_dir>/evaluation_report_<YYYYmmdd_HHMMSS>.json`.

use crate::report::EvaluationReport;
use pmon_common::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ReportArchive {
    dir: PathBuf,
}

impl ReportArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(report: &EvaluationReport) -> String {
        format!(
            "evaluation_report_{}.json",
            report.report_timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write `report` as pretty JSON, returning the file path
    pub async fn save(&self, report: &EvaluationReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(Self::file_name(report));
        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&path, json).await?;

        info!("Evaluation report saved: {}", path.display());
        Ok(path)
    }
}
