//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one `copy_filtered_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Total scanned directory/file entries.
    pub cnt_scanned: u64,
    /// Entries dropped by an exclusion pattern (subtrees count once).
    pub cnt_excluded: u64,
    /// Directories created under the destination.
    pub cnt_dirs_created: u64,
    /// Files copied.
    pub cnt_files_copied: u64,
    /// Bytes copied.
    pub cnt_bytes_copied: u64,
    /// Placeholder files written after the walk.
    pub cnt_placeholders: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportCopy {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_excluded".to_string(), self.cnt_excluded);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_bytes_copied".to_string(), self.cnt_bytes_copied);
        dict_counts.insert("cnt_placeholders".to_string(), self.cnt_placeholders);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} excluded={} dirs={} files={} bytes={} placeholders={} warnings={}",
            self.cnt_scanned,
            self.cnt_excluded,
            self.cnt_dirs_created,
            self.cnt_files_copied,
            self.cnt_bytes_copied,
            self.cnt_placeholders,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    report: ReportCopy,
}

impl ReportCopyBuilder {
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    pub fn add_excluded(&mut self) {
        self.report.cnt_excluded += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.report.cnt_dirs_created += 1;
    }

    /// Record one copied file of `n_bytes`.
    pub fn add_file_copied(&mut self, n_bytes: u64) {
        self.report.cnt_files_copied += 1;
        self.report.cnt_bytes_copied += n_bytes;
    }

    pub fn add_placeholders(&mut self, n_files: usize) {
        self.report.cnt_placeholders += n_files as u64;
    }

    /// Add warning message; also forwarded to the log.
    pub fn add_warning(&mut self, warning: String) {
        log::warn!("{warning}");
        self.report.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        self.report
    }
}
