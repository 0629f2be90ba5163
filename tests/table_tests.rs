//! Integration tests for module table snapshots read through the facade.

use kmodule::{ModuleBackend, ModuleError, ModuleInfo, ModuleManager};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Backend that refuses every native call; table snapshots must never
/// touch the native layer.
struct InertBackend;

impl ModuleBackend for InertBackend {
    fn insert(&self, _path: &str, _encoded_params: &str) -> kmodule::Result<()> {
        panic!("table snapshots must not call the native layer");
    }

    fn remove(
        &self,
        _names: &[String],
        _force: bool,
        _wait: bool,
        _verbosity: u32,
    ) -> kmodule::Result<()> {
        panic!("table snapshots must not call the native layer");
    }

    fn query_info(
        &self,
        _identifier: &str,
        _base_dir: &str,
        _kernel_version: Option<&str>,
    ) -> kmodule::Result<Vec<ModuleInfo>> {
        panic!("table snapshots must not call the native layer");
    }

    fn set_logging(&self, _enabled: bool) {}
}

const SAMPLE_TABLE: &str = "\
hello_5 16384 1 e1000, Live 0xffffffffc0210000
e1000 221184 0 - Live 0xffffffffc0150000
ip_tables 32768 2 iptable_filter,iptable_nat, Live 0xffffffffc00f0000 (O)
";

fn write_table(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("modules");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn list_builds_full_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, SAMPLE_TABLE);
    let manager = ModuleManager::with_backend(InertBackend).with_table_path(&path);

    let table = manager.list().unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table["hello_5"].size_bytes, 16384);
    assert_eq!(table["hello_5"].used_by, Some(vec!["e1000".to_string()]));
    assert_eq!(table["e1000"].used_by, None);
    assert_eq!(table["e1000"].status, "Live");
    assert_eq!(
        table["ip_tables"].used_by,
        Some(vec![
            "iptable_filter".to_string(),
            "iptable_nat".to_string()
        ])
    );
    assert_eq!(table["ip_tables"].memory_offset, 0xffffffffc00f0000);
}

#[test]
fn list_twice_is_structurally_equal() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, SAMPLE_TABLE);
    let manager = ModuleManager::with_backend(InertBackend).with_table_path(&path);

    let first = manager.list().unwrap();
    let second = manager.list().unwrap();

    assert_eq!(first, second);
}

#[test]
fn list_reflects_table_changes_between_calls() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, SAMPLE_TABLE);
    let manager = ModuleManager::with_backend(InertBackend).with_table_path(&path);

    let before = manager.list().unwrap();
    fs::write(&path, "e1000 221184 0 - Live 0xffffffffc0150000\n").unwrap();
    let after = manager.list().unwrap();

    assert_eq!(before.len(), 3);
    assert_eq!(after.len(), 1);
}

#[test]
fn list_missing_table_is_unavailable() {
    let manager = ModuleManager::with_backend(InertBackend)
        .with_table_path(Path::new("/nonexistent/modules"));

    let result = manager.list();

    assert!(matches!(result, Err(ModuleError::TableUnavailable(_))));
}

#[test]
fn list_rejects_duplicate_module_names() {
    let dir = TempDir::new().unwrap();
    let path = write_table(
        &dir,
        "hello_5 16384 1 - Live 0xffffffffc0210000\n\
         hello_5 32768 0 - Live 0xffffffffc0220000\n",
    );
    let manager = ModuleManager::with_backend(InertBackend).with_table_path(&path);

    let result = manager.list();

    assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
}

#[test]
fn list_rejects_malformed_line() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, "hello_5 16384\n");
    let manager = ModuleManager::with_backend(InertBackend).with_table_path(&path);

    let result = manager.list();

    assert!(matches!(result, Err(ModuleError::MalformedTableLine(_))));
}
