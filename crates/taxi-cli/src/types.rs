use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

use taxi_warehouse::{LoadOutcome, TableRef};

/// Wall time of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: &'static str,
    pub duration: Duration,
}

/// Role of a produced table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Dimension,
    Fact,
}

/// What happened to one table.
#[derive(Debug, Clone)]
pub enum TableStatus {
    Loaded(LoadOutcome),
    /// Built but the warehouse rejected it.
    LoadFailed(String),
    /// Never built, so never loaded.
    BuildFailed(String),
}

impl TableStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TableStatus::Loaded(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            TableStatus::Loaded(_) => "loaded",
            TableStatus::LoadFailed(_) => "load failed",
            TableStatus::BuildFailed(_) => "build failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSummary {
    pub table: TableRef,
    pub kind: TableKind,
    pub rows: usize,
    pub columns: usize,
    pub status: TableStatus,
}

/// Normalizer effect on one produced table.
#[derive(Debug, Clone)]
pub struct NormalizationSummary {
    pub table: String,
    pub converted: usize,
    pub failed: Vec<String>,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

#[derive(Debug)]
pub struct RunResult {
    pub input: PathBuf,
    pub dataset: String,
    pub dry_run: bool,
    pub raw_rows: usize,
    /// Text values nulled per instant column while parsing timestamps.
    pub coerced_timestamps: BTreeMap<String, usize>,
    pub stages: Vec<StageTiming>,
    pub normalization: Vec<NormalizationSummary>,
    pub tables: Vec<TableSummary>,
    /// Fact foreign-key column → references that did not resolve.
    pub unresolved: BTreeMap<String, usize>,
    /// Fact foreign-key column → non-null keys missing from their dimension.
    pub dangling: BTreeMap<String, usize>,
    pub errors: Vec<String>,
}

impl RunResult {
    /// True only when every table reached the warehouse.
    pub fn all_loaded(&self) -> bool {
        !self.tables.is_empty() && self.tables.iter().all(|t| t.status.is_loaded())
    }

    pub fn loaded_count(&self) -> usize {
        self.tables.iter().filter(|t| t.status.is_loaded()).count()
    }

    pub fn unresolved_total(&self) -> usize {
        self.unresolved.values().sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table.table == name)
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// One-line outcome for the end of a run.
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "{} of {} tables loaded into {}",
            self.loaded_count(),
            self.tables.len(),
            self.dataset
        );
        if self.dry_run {
            line.push_str(" (dry run)");
        }
        let unresolved = self.unresolved_total();
        if unresolved > 0 {
            let _ = write!(line, "; {unresolved} unresolved references");
        }
        if !self.errors.is_empty() {
            let _ = write!(line, "; {} errors", self.errors.len());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_model::WriteMode;

    fn summary(name: &str, status: TableStatus) -> TableSummary {
        TableSummary {
            table: TableRef::new("taxi_star", name),
            kind: TableKind::Dimension,
            rows: 2,
            columns: 3,
            status,
        }
    }

    fn loaded(name: &str) -> TableStatus {
        TableStatus::Loaded(LoadOutcome {
            table: TableRef::new("taxi_star", name),
            mode: WriteMode::Replace,
            rows: 2,
            columns: 3,
            total_rows: 2,
        })
    }

    fn result(tables: Vec<TableSummary>) -> RunResult {
        RunResult {
            input: PathBuf::from("trips.csv"),
            dataset: "taxi_star".to_string(),
            dry_run: false,
            raw_rows: 2,
            coerced_timestamps: BTreeMap::new(),
            stages: Vec::new(),
            normalization: Vec::new(),
            tables,
            unresolved: BTreeMap::new(),
            dangling: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn status_line_all_loaded() {
        let run = result(vec![
            summary("vendor_dim", loaded("vendor_dim")),
            summary("fact_trips", loaded("fact_trips")),
        ]);
        assert!(run.all_loaded());
        insta::assert_snapshot!(run.status_line(), @"2 of 2 tables loaded into taxi_star");
    }

    #[test]
    fn status_line_with_failures() {
        let mut run = result(vec![
            summary("vendor_dim", loaded("vendor_dim")),
            summary("fact_trips", TableStatus::BuildFailed("missing".to_string())),
        ]);
        run.dry_run = true;
        run.unresolved.insert("vendor_key".to_string(), 3);
        run.errors.push("fact_trips: missing".to_string());

        assert!(!run.all_loaded());
        insta::assert_snapshot!(
            run.status_line(),
            @"1 of 2 tables loaded into taxi_star (dry run); 3 unresolved references; 1 errors"
        );
    }

    #[test]
    fn empty_run_is_not_success() {
        assert!(!result(Vec::new()).all_loaded());
    }
}
