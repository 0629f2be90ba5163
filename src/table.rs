//! Live kernel module table parsing.
//!
//! The kernel reports loaded modules as line-oriented text with six fixed
//! whitespace-separated fields per line: name, size, reference count,
//! holder list, status, load address. This module parses those lines into
//! [`ModuleRecord`]s and builds the per-call snapshot mapping.
//!
//! A snapshot is rebuilt from scratch on every read and reflects kernel
//! state only at the instant of the call; concurrent module load/unload
//! activity can make it stale immediately afterwards.

use crate::error::{ModuleError, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Default location of the kernel's live module table.
pub const MODULE_TABLE_PATH: &str = "/proc/modules";

/// One currently loaded module, as reported by the kernel table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Module name, unique within a snapshot.
    pub name: String,
    /// Memory footprint in bytes.
    pub size_bytes: u64,
    /// Count of current references / open handles.
    pub open_count: u64,
    /// Status token as reported by the kernel ("Live", "Loading",
    /// "Unloading").
    pub status: String,
    /// Base load address.
    pub memory_offset: u64,
    /// Modules holding a reference to this one, in table order; `None`
    /// when the kernel reports `-`.
    pub used_by: Option<Vec<String>>,
}

impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used_by = match &self.used_by {
            Some(names) => names.join(","),
            None => "-".to_string(),
        };
        write!(
            f,
            "{:<24} {:>8}, {:>3}, {:>10}, 0x{:016X}, {}",
            self.name, self.size_bytes, self.open_count, self.status, self.memory_offset, used_by
        )
    }
}

/// Extract the holder list from the fourth table field.
///
/// The kernel comma-terminates the list ("e1000,"), so the empty element
/// after the final comma is discarded. `-` means no holders.
fn parse_used_by(token: &str) -> Option<Vec<String>> {
    if token == "-" {
        return None;
    }
    let mut names: Vec<String> = token.split(',').map(str::to_string).collect();
    names.pop();
    Some(names)
}

/// Parse one module table line.
///
/// The first six whitespace-separated tokens are, in fixed order: name,
/// size, open count, holder list, status, load address. Trailing tokens
/// (taint flags) are ignored. The load address is hexadecimal text with or
/// without a `0x` prefix.
///
/// # Errors
///
/// Returns `MalformedTableLine` when fewer than six tokens are present or
/// when the numeric fields do not parse.
pub fn parse_line(line: &str) -> Result<ModuleRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 6 {
        return Err(ModuleError::MalformedTableLine(format!(
            "expected 6 fields, found {} in {:?}",
            tokens.len(),
            line.trim_end()
        )));
    }

    let size_bytes = tokens[1].parse::<u64>().map_err(|_| {
        ModuleError::MalformedTableLine(format!(
            "size field {:?} is not a decimal integer",
            tokens[1]
        ))
    })?;
    let open_count = tokens[2].parse::<u64>().map_err(|_| {
        ModuleError::MalformedTableLine(format!(
            "reference count field {:?} is not a decimal integer",
            tokens[2]
        ))
    })?;

    let offset_text = tokens[5]
        .strip_prefix("0x")
        .or_else(|| tokens[5].strip_prefix("0X"))
        .unwrap_or(tokens[5]);
    let memory_offset = u64::from_str_radix(offset_text, 16).map_err(|_| {
        ModuleError::MalformedTableLine(format!(
            "load address field {:?} is not hexadecimal",
            tokens[5]
        ))
    })?;

    Ok(ModuleRecord {
        name: tokens[0].to_string(),
        size_bytes,
        open_count,
        status: tokens[4].to_string(),
        memory_offset,
        used_by: parse_used_by(tokens[3]),
    })
}

/// Parse a full module table into a name -> record mapping.
///
/// Blank lines are skipped. A duplicate module name is rejected: the table
/// is kernel-owned and cannot legitimately report the same module twice, so
/// a duplicate indicates a corrupt read.
///
/// # Errors
///
/// Returns `MalformedTableLine` for an unparseable line or a duplicate name.
pub fn parse_table(content: &str) -> Result<HashMap<String, ModuleRecord>> {
    let mut table = HashMap::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(line)?;
        if table.contains_key(&record.name) {
            return Err(ModuleError::MalformedTableLine(format!(
                "duplicate module name {:?} in table",
                record.name
            )));
        }
        table.insert(record.name.clone(), record);
    }
    Ok(table)
}

/// Read and parse the module table at `path` in one synchronous pass.
///
/// # Errors
///
/// Returns `TableUnavailable` when the resource cannot be opened or read,
/// `MalformedTableLine` when its contents do not parse.
pub fn read_table(path: &Path) -> Result<HashMap<String, ModuleRecord>> {
    let content = fs::read_to_string(path)?;
    parse_table(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_round_trip() {
        let record = parse_line("hello_5 16384 1 e1000, Live 0xffffffffc0210000").unwrap();

        assert_eq!(record.name, "hello_5");
        assert_eq!(record.size_bytes, 16384);
        assert_eq!(record.open_count, 1);
        assert_eq!(record.used_by, Some(vec!["e1000".to_string()]));
        assert_eq!(record.status, "Live");
        assert_eq!(record.memory_offset, 0xffffffffc0210000);
    }

    #[test]
    fn test_parse_line_no_holders() {
        let record = parse_line("e1000 221184 0 - Live 0xffffffffc0150000").unwrap();
        assert_eq!(record.used_by, None);
    }

    #[test]
    fn test_parse_line_multiple_holders() {
        let record =
            parse_line("ip_tables 32768 2 iptable_filter,iptable_nat, Live 0xffffffffc00f0000")
                .unwrap();
        assert_eq!(
            record.used_by,
            Some(vec!["iptable_filter".to_string(), "iptable_nat".to_string()])
        );
    }

    #[test]
    fn test_parse_line_offset_without_prefix() {
        let record = parse_line("snd 90112 3 snd_timer, Live ffffffffc0100000").unwrap();
        assert_eq!(record.memory_offset, 0xffffffffc0100000);
    }

    #[test]
    fn test_parse_line_ignores_trailing_tokens() {
        // Out-of-tree taint marker after the load address.
        let record = parse_line("vboxdrv 516096 2 vboxnetadp, Live 0xffffffffc0300000 (O)").unwrap();
        assert_eq!(record.name, "vboxdrv");
        assert_eq!(record.memory_offset, 0xffffffffc0300000);
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        let result = parse_line("hello_5 16384 1");
        assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
    }

    #[test]
    fn test_parse_line_bad_size() {
        let result = parse_line("hello_5 big 1 - Live 0xffffffffc0210000");
        assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
    }

    #[test]
    fn test_parse_line_bad_open_count() {
        let result = parse_line("hello_5 16384 one - Live 0xffffffffc0210000");
        assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
    }

    #[test]
    fn test_parse_line_bad_offset() {
        let result = parse_line("hello_5 16384 1 - Live notanaddress");
        assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
    }

    #[test]
    fn test_parse_table_keys_by_name() {
        let content = "hello_5 16384 1 e1000, Live 0xffffffffc0210000\n\
                       e1000 221184 0 - Live 0xffffffffc0150000\n";
        let table = parse_table(content).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table["hello_5"].size_bytes, 16384);
        assert_eq!(table["e1000"].used_by, None);
    }

    #[test]
    fn test_parse_table_skips_blank_lines() {
        let content = "\nhello_5 16384 1 - Live 0xffffffffc0210000\n\n";
        let table = parse_table(content).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_table_rejects_duplicate_names() {
        let content = "hello_5 16384 1 - Live 0xffffffffc0210000\n\
                       hello_5 32768 0 - Live 0xffffffffc0220000\n";
        let result = parse_table(content);
        assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
    }

    #[test]
    fn test_read_table_missing_file() {
        let result = read_table(Path::new("/nonexistent/modules"));
        assert!(matches!(result, Err(ModuleError::TableUnavailable(_))));
    }

    #[test]
    fn test_display_formats_fixed_columns() {
        let record = parse_line("hello_5 16384 1 e1000, Live 0xffffffffc0210000").unwrap();
        let text = record.to_string();

        assert!(text.starts_with("hello_5"));
        assert!(text.contains("0xFFFFFFFFC0210000"));
        assert!(text.ends_with("e1000"));
    }
}
