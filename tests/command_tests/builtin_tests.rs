//! Built-in Command Tests
//!
//! Tests for the compiled-in handlers against fixture files.

use std::fs;
use std::io::Write;
use std::path::Path;

use srpcf::command::builtin::{CpuInfo, Help, PciList, PCI_LIST_CAPACITY};
use srpcf::command::{Command, CommandTable, ParseContext};
use srpcf::protocol::{ErrorCode, OptionList};
use srpcf::CommandCatalog;
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

const CPUINFO: &str = "\
processor\t: 0
model name\t: Test CPU @ 2.00GHz
physical id\t: 0
core id\t\t: 0

processor\t: 1
model name\t: Test CPU @ 2.00GHz
physical id\t: 0
core id\t\t: 1
";

fn help_parse(table: &CommandTable, args: &[&str]) -> (bool, String) {
    let catalog = CommandCatalog::builtin();
    let mut out = Vec::new();
    let options: OptionList = args.iter().copied().collect();
    let accepted = {
        let mut ctx = ParseContext {
            table,
            catalog: &catalog,
            out: &mut out,
        };
        Help.parse(&options, &mut ctx)
    };
    (accepted, String::from_utf8(out).unwrap())
}

fn add_pci_device(root: &Path, entry: &str, class: &str, device: &str, vendor: &str, rev: u8) {
    let dir = root.join(entry);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("class"), format!("{}\n", class)).unwrap();
    fs::write(dir.join("device"), format!("{}\n", device)).unwrap();
    fs::write(dir.join("vendor"), format!("{}\n", vendor)).unwrap();

    // Revision id lives at offset 8 of configuration space
    let mut config = vec![0u8; 64];
    config[8] = rev;
    fs::write(dir.join("config"), config).unwrap();
}

// =============================================================================
// xrHelp Tests
// =============================================================================

#[test]
fn test_help_prints_enabled_command() {
    let mut table = CommandTable::known();
    table.install(&[1, 6]);

    let (accepted, out) = help_parse(&table, &["xrRtcSet"]);
    assert!(accepted);
    assert!(out.contains("xrRtcSet"));
}

#[test]
fn test_help_rejects_disabled_or_missing() {
    let mut table = CommandTable::known();
    table.install(&[1]);

    assert!(!help_parse(&table, &["xrRtcSet"]).0);
    assert!(!help_parse(&table, &[]).0);
    assert!(!help_parse(&table, &["xrHelp", "xrHelp"]).0);
}

#[test]
fn test_help_execute_is_noop() {
    assert!(Help.execute(&OptionList::new()).is_success());
}

// =============================================================================
// xrCpuInfo Tests
// =============================================================================

#[test]
fn test_cpu_info_reads_source() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CPUINFO.as_bytes()).unwrap();

    let result = CpuInfo::with_source(file.path()).execute(&OptionList::new());
    assert!(result.is_success());

    let text = result.data_str().unwrap().into_owned();
    assert!(text.contains("MODEL\t\tTest CPU @ 2.00GHz\n"));
    assert!(text.contains("PROCESSORS\t2\n"));
    assert!(text.contains("CORES\t\t2\n"));
}

#[test]
fn test_cpu_info_missing_source_is_no_device() {
    let result = CpuInfo::with_source("/nonexistent/cpuinfo").execute(&OptionList::new());
    assert_eq!(result.error_code, ErrorCode::NO_DEVICE);
    assert!(result.data.is_none());
}

#[test]
fn test_cpu_info_empty_source_is_no_device() {
    let file = NamedTempFile::new().unwrap();
    let result = CpuInfo::with_source(file.path()).execute(&OptionList::new());
    assert_eq!(result.error_code, ErrorCode::NO_DEVICE);
}

// =============================================================================
// xrPciList Tests
// =============================================================================

#[test]
fn test_pci_listing_from_tree() {
    let temp = TempDir::new().unwrap();
    add_pci_device(temp.path(), "0000:00:02.0", "0x030000", "0x1916", "0x8086", 0x07);
    add_pci_device(temp.path(), "0000:00:1f.6", "0x020000", "0x15d7", "0x8086", 0x21);
    // Missing attributes are skipped
    fs::create_dir_all(temp.path().join("0000:00:1f.7")).unwrap();

    let result = PciList::with_root(temp.path()).execute(&OptionList::new());
    assert!(result.is_success());

    let text = result.data_str().unwrap().into_owned();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "PCI DEVICE\tDEVICE ID\tVENDOR ID\tREVISION ID\tFUNCTION #");
    assert!(lines[1].starts_with("DISPLAY"));
    assert!(lines[1].ends_with("0x07\t\t0x00"));
    assert!(lines[2].starts_with("NETWORK"));
    assert!(lines[2].ends_with("0x21\t\t0x06"));
}

#[test]
fn test_pci_listing_is_bounded() {
    let temp = TempDir::new().unwrap();
    for i in 0..100 {
        let entry = format!("0000:{:02x}:00.0", i);
        add_pci_device(temp.path(), &entry, "0x060400", "0x1234", "0x8086", 0);
    }

    let result = PciList::with_root(temp.path()).execute(&OptionList::new());
    let data = result.data.unwrap();
    assert!(data.len() < PCI_LIST_CAPACITY);
}

#[test]
fn test_pci_missing_sysfs_is_no_device() {
    let result = PciList::with_root("/nonexistent/pci").execute(&OptionList::new());
    assert_eq!(result.error_code, ErrorCode::NO_DEVICE);
    assert!(result.data.is_none());
}
