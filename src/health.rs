//! Memory health probe feeding the restart verdict.

use std::fs;
use std::path::PathBuf;

/// Reports how much memory is still available to the process.
pub trait MemoryProbe {
    /// Available bytes, or `None` if the platform cannot tell
    fn free_memory(&mut self) -> Option<u64>;
}

/// Reads `MemAvailable` from `/proc/meminfo`.
#[derive(Clone, Debug)]
pub struct ProcMeminfo {
    path: PathBuf,
}

impl Default for ProcMeminfo {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/proc/meminfo"),
        }
    }
}

impl ProcMeminfo {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MemoryProbe for ProcMeminfo {
    fn free_memory(&mut self) -> Option<u64> {
        let contents = fs::read_to_string(&self.path).ok()?;
        parse_mem_available(&contents)
    }
}

/// Extract `MemAvailable` (reported in kB) as bytes.
pub fn parse_mem_available(meminfo: &str) -> Option<u64> {
    let line = meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    kib.checked_mul(1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MEMINFO: &str = "MemTotal:         427796 kB\nMemFree:           35412 kB\nMemAvailable:     251220 kB\nBuffers:           17764 kB\n";

    #[test]
    fn test_parse_mem_available() {
        assert_eq!(parse_mem_available(MEMINFO), Some(251_220 * 1024));
        assert_eq!(parse_mem_available("MemTotal: 1 kB\n"), None);
        assert_eq!(parse_mem_available("MemAvailable: lots\n"), None);
    }

    #[test]
    fn test_probe_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MEMINFO.as_bytes()).unwrap();

        let mut probe = ProcMeminfo::with_path(file.path());
        assert_eq!(probe.free_memory(), Some(251_220 * 1024));
    }

    #[test]
    fn test_missing_file_reports_unknown() {
        let mut probe = ProcMeminfo::with_path("/nonexistent/meminfo");
        assert_eq!(probe.free_memory(), None);
    }
}
