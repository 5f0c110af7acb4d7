//! `xrPciList`: PCI device table from sysfs
//!
//! Each entry of the devices directory is named `DDDD:BB:DD.F`; the row is
//! built from its `class`, `device`, `vendor` files and the revision byte of
//! its `config` space. Entries with unreadable attributes are skipped.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::command::{Command, ParseContext};
use crate::protocol::{ErrorCode, ExecutionResult, OptionList};

const SYSFS_PCI_DEVICES: &str = "/sys/bus/pci/devices";

const PCI_LIST_TITLE: &str = "PCI DEVICE\tDEVICE ID\tVENDOR ID\tREVISION ID\tFUNCTION #\n";

/// Largest listing returned, terminator included
pub const PCI_LIST_CAPACITY: usize = 2048;

/// Offset of the revision id in configuration space
const CONFIG_REVISION_OFFSET: usize = 0x08;

/// Base class code → display name
const CLASS_NAMES: [&str; 18] = [
    "OLD DEVICE",
    "HOST",
    "NETWORK",
    "DISPLAY",
    "MULTIMEDIA",
    "MEMORY",
    "BRIDGE",
    "SIMPLECOMM",
    "PERIPHERAL",
    "INPUT",
    "DOCKING",
    "PROCESSOR",
    "SERIALBUS",
    "WIRELESS",
    "INTELLIGENT",
    "SATELLITE",
    "ENCRYPTION",
    "SIGNAL",
];

const HELP_TEXT: &str = "\
SYNTAX:
\txrPciList
USAGE:
\tThis function will display the PCI device ID, vendor ID, revision ID, and a function number
\tof all PCI devices on the controller. Some devices show up multiple times if they are used
\tas separate devices by the firmware.
";

/// One row of the listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct PciDevice {
    class: u32,
    device: u32,
    vendor: u32,
    revision: u8,
    function: u32,
}

impl PciDevice {
    fn class_name(&self) -> &'static str {
        let base = ((self.class & 0x00FF_0000) >> 16) as usize;
        CLASS_NAMES.get(base).copied().unwrap_or("UNKNOWN")
    }

    fn row(&self) -> String {
        format!(
            "{:<16} {:04X}\t\t{:04X}\t\t0x{:02X}\t\t0x{:02X}\n",
            self.class_name(),
            self.device,
            self.vendor,
            self.revision,
            self.function
        )
    }
}

/// Parse a sysfs hex attribute such as `0x8086\n`
fn parse_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Function number: the hex digits after the last '.'
fn parse_function(entry: &str) -> u32 {
    entry
        .rsplit_once('.')
        .and_then(|(_, f)| u32::from_str_radix(f, 16).ok())
        .unwrap_or(0)
}

fn read_attribute(dir: &Path, name: &str) -> Option<u32> {
    fs::read_to_string(dir.join(name))
        .ok()
        .and_then(|text| parse_hex(&text))
}

fn read_revision(dir: &Path) -> Option<u8> {
    let mut config = Vec::with_capacity(CONFIG_REVISION_OFFSET + 1);
    fs::File::open(dir.join("config"))
        .ok()?
        .take((CONFIG_REVISION_OFFSET + 1) as u64)
        .read_to_end(&mut config)
        .ok()?;
    config.get(CONFIG_REVISION_OFFSET).copied()
}

fn read_device(dir: &Path, entry: &str) -> Option<PciDevice> {
    Some(PciDevice {
        device: read_attribute(dir, "device")?,
        vendor: read_attribute(dir, "vendor")?,
        class: read_attribute(dir, "class")?,
        revision: read_revision(dir)?,
        function: parse_function(entry),
    })
}

/// Lister for a sysfs PCI devices directory
#[derive(Debug)]
pub struct PciList {
    root: PathBuf,
}

impl Default for PciList {
    fn default() -> Self {
        Self::with_root(SYSFS_PCI_DEVICES)
    }
}

impl PciList {
    /// List devices from another directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build the listing; `None` when the devices directory cannot be read
    fn listing(&self) -> Option<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot open {}: {}", self.root.display(), e);
                return None;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        let mut out = String::with_capacity(PCI_LIST_CAPACITY);
        out.push_str(PCI_LIST_TITLE);

        for name in names {
            let Some(device) = read_device(&self.root.join(&name), &name) else {
                tracing::debug!("Skipping PCI entry {}", name);
                continue;
            };

            let row = device.row();
            if out.len() + row.len() >= PCI_LIST_CAPACITY {
                tracing::debug!("PCI listing full, dropping remaining rows");
                break;
            }
            out.push_str(&row);
        }

        Some(out)
    }
}

impl Command for PciList {
    fn name(&self) -> &str {
        "xrPciList"
    }

    fn help(&self) -> &str {
        HELP_TEXT
    }

    fn parse(&self, _options: &OptionList, _ctx: &mut ParseContext<'_>) -> bool {
        true
    }

    fn execute(&self, _options: &OptionList) -> ExecutionResult {
        match self.listing() {
            Some(listing) => ExecutionResult::with_data(listing.into_bytes()),
            None => ExecutionResult::error(ErrorCode::NO_DEVICE),
        }
    }
}
