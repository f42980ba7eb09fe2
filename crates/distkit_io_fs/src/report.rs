//! Mirror report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one `mirror_tree` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportMirror {
    /// Total inspected directory/file entries.
    pub cnt_scanned: u64,
    /// Entries dropped by the exclusion list.
    pub cnt_excluded: u64,
    /// Files written or links created.
    pub cnt_copied: u64,
    /// Destination directories created (the root included).
    pub cnt_dirs_created: u64,
    /// Entries skipped by symlink/special-file policy or dry-run.
    pub cnt_skipped: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportMirror {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_excluded".to_string(), self.cnt_excluded);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} copied={} dirs={} excluded={} skipped={} warnings={}",
            self.cnt_scanned,
            self.cnt_copied,
            self.cnt_dirs_created,
            self.cnt_excluded,
            self.cnt_skipped,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MIRROR]"))
    }
}

/// Mutable accumulator for mirror statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportMirrorBuilder {
    report: ReportMirror,
}

impl ReportMirrorBuilder {
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    pub fn add_excluded(&mut self) {
        self.report.cnt_excluded += 1;
    }

    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.report.cnt_dirs_created += 1;
    }

    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Record a warning and echo it to the log.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.report.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportMirror {
        self.report
    }
}
