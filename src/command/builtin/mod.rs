//! Built-in Commands
//!
//! Handlers compiled into every binary. The server offers exactly the ids
//! registered here; the shell uses the same handlers for help and parsing.

use std::sync::Arc;

use super::CommandCatalog;

mod cpu_info;
mod help;
mod pci_list;
mod rtc_set;

pub use cpu_info::CpuInfo;
pub use help::Help;
pub use pci_list::{PciList, PCI_LIST_CAPACITY};
pub use rtc_set::RtcSet;

/// Register every built-in handler
pub fn register_all(catalog: &mut CommandCatalog) {
    catalog.register(Arc::new(Help));
    catalog.register(Arc::new(CpuInfo::default()));
    catalog.register(Arc::new(PciList::default()));
    catalog.register(Arc::new(RtcSet));
}
