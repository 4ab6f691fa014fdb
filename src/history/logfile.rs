//! Append-only raw sample log.
//!
//! Plain text, one tab-separated line per sample (timestamp first), with an
//! optional header line. Every append reopens the file, writes one line and
//! flushes, trading throughput for durability of each record.

use crate::core::{DaqError, Result, Sample};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle to the log file of one run.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    precision: usize,
    line: String,
    records: u64,
}

impl LogFile {
    /// Create (or truncate) the log file named by expanding the strftime
    /// `pattern` with the current local time, and write the header if any.
    pub fn create(dir: &Path, pattern: &str, headings: &[String], precision: usize) -> Result<Self> {
        let name = expand_pattern(pattern)?;
        Self::create_at(dir.join(name), headings, precision)
    }

    /// Create (or truncate) a log file at an explicit path.
    pub fn create_at(path: PathBuf, headings: &[String], precision: usize) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DaqError::log_write(parent, e))?;
        }

        let mut file = File::create(&path).map_err(|e| DaqError::log_write(&path, e))?;
        if !headings.is_empty() {
            let header = format!("{}\n", headings.join("\t"));
            file.write_all(header.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|e| DaqError::log_write(&path, e))?;
        }

        tracing::info!(path = %path.display(), "created sample log");

        Ok(Self {
            path,
            precision,
            line: String::with_capacity(64),
            records: 0,
        })
    }

    /// Append one sample as a line and flush it.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        self.line.clear();
        let precision = self.precision;
        // Writing into a String cannot fail.
        let _ = write!(self.line, "{:.*}", precision, sample.timestamp());
        for value in sample.values() {
            let _ = write!(self.line, "\t{:.*}", precision, value);
        }
        self.line.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| DaqError::log_write(&self.path, e))?;
        file.write_all(self.line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| DaqError::log_write(&self.path, e))?;

        self.records += 1;
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples appended so far
    pub fn records(&self) -> u64 {
        self.records
    }
}

/// Expand a strftime pattern with the current local time.
pub fn expand_pattern(pattern: &str) -> Result<String> {
    use chrono::format::{Item, StrftimeItems};

    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(DaqError::config(format!(
            "invalid log filename pattern '{}'",
            pattern
        )));
    }
    Ok(chrono::Local::now()
        .format_with_items(items.into_iter())
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_lines() {
        let dir = TempDir::new().unwrap();
        let headings = vec!["time".to_string(), "temp".to_string()];
        let mut log = LogFile::create_at(dir.path().join("run.txt"), &headings, 2).unwrap();

        log.append(&Sample::new(1.5, vec![20.126]).unwrap()).unwrap();
        log.append(&Sample::new(2.5, vec![21.0]).unwrap()).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "time\ttemp\n1.50\t20.13\n2.50\t21.00\n");
        assert_eq!(log.records(), 2);
    }

    #[test]
    fn test_no_header_when_headings_empty() {
        let dir = TempDir::new().unwrap();
        let mut log = LogFile::create_at(dir.path().join("run.txt"), &[], 1).unwrap();
        log.append(&Sample::new(3.0, vec![1.0, 2.0]).unwrap()).unwrap();
        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "3.0\t1.0\t2.0\n");
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.txt");
        std::fs::write(&path, "stale\n").unwrap();
        let log = LogFile::create_at(path, &[], 3).unwrap();
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "");
    }

    #[test]
    fn test_pattern_expands_time_fields() {
        let name = expand_pattern("%Y%m%d-%H%M%S.txt").unwrap();
        assert_eq!(name.len(), "20240101-120000.txt".len());
        assert!(name.ends_with(".txt"));
        assert!(name.chars().take(8).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(expand_pattern("%Q-bogus").is_err());
    }

    #[test]
    fn test_append_fails_when_file_removed_with_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("gone");
        let mut log = LogFile::create_at(sub.join("run.txt"), &[], 3).unwrap();
        std::fs::remove_dir_all(&sub).unwrap();

        let err = log.append(&Sample::scalar(1.0, 1.0).unwrap()).unwrap_err();
        assert_eq!(err.category(), "log_write");
    }
}
