//! Pass-state (`.aux`) parsing.
//!
//! The engine appends one `\WI@definecols{auto-<index>}{<count>}` record per auto-numbered
//! list on every pass. Records may repeat or interleave across passes; the last record seen for
//! an index wins. Anything that does not parse as a record is ignored.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// How records are located inside the state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanStrategy {
    /// Only lines that start with the marker are considered.
    #[default]
    LinePrefix,
    /// Records are matched anywhere in the text.
    FullText,
}

/// List index to converged column count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnAssignment {
    columns: BTreeMap<u32, u32>,
}

impl ColumnAssignment {
    pub fn parse(text: &str, marker: &str, scan: ScanStrategy) -> Result<Self> {
        let mut columns = BTreeMap::new();
        match scan {
            ScanStrategy::LinePrefix => {
                for (lineno, line) in text.lines().enumerate() {
                    let Some(rest) = line.strip_prefix(marker) else {
                        continue;
                    };
                    match parse_record_tail(rest) {
                        Some((index, count)) => {
                            columns.insert(index, count);
                        }
                        None => {
                            tracing::debug!(
                                line = lineno + 1,
                                record = line,
                                "skipping malformed record"
                            );
                        }
                    }
                }
            }
            ScanStrategy::FullText => {
                let pattern = format!(r"{}(\d+)\}}\{{(\d+)\}}", regex::escape(marker));
                let re = Regex::new(&pattern)?;
                for caps in re.captures_iter(text) {
                    let (Ok(index), Ok(count)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>())
                    else {
                        tracing::debug!(record = &caps[0], "skipping out-of-range record");
                        continue;
                    };
                    columns.insert(index, count);
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn from_file(path: &Path, marker: &str, scan: ScanStrategy) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, marker, scan)
    }

    pub fn get(&self, index: u32) -> Option<u32> {
        self.columns.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column counts ordered by list index, not by appearance in the file.
    pub fn counts(&self) -> Vec<u32> {
        self.columns.values().copied().collect()
    }
}

/// Parses `<index>}{<count>}` following the marker.
fn parse_record_tail(rest: &str) -> Option<(u32, u32)> {
    let (index, tail) = rest.split_once('}')?;
    let (count, _) = tail.strip_prefix('{')?.split_once('}')?;
    Some((index.trim().parse().ok()?, count.trim().parse().ok()?))
}
