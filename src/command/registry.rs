//! Command Registry
//!
//! The table of command ids both peers know about, and the enabled flags
//! negotiation sets.
//!
//! ## Negotiation
//! ```text
//!   shell                                server
//!     │ ── QUERY_SUPPORT ──────────────────▶ │
//!     │ ◀────────────── count + enabled ids ─ │
//!     │ install(ids)                          │
//! ```
//! Only ids travel; each side maps them to names with its own table.

use super::CommandCatalog;
use crate::protocol::CommandId;

/// Start marker of the table; also carried by plugin execute requests
pub const PLUGIN_COMMAND_ID: CommandId = 0;

/// End sentinel of the table
pub const END_COMMAND_ID: CommandId = 10;

/// Every command id known to this build, in table order
pub const KNOWN_COMMANDS: &[(CommandId, &str)] = &[
    (1, "xrHelp"),
    (2, "xrCpuInfo"),
    (3, "xrPciList"),
    (4, "xrRtcDateSet"),
    (5, "xrRtcDateShow"),
    (6, "xrRtcSet"),
    (7, "xrRtcShow"),
    (8, "xrDateShow"),
    (9, "xrTimeShow"),
];

/// One entry of the command table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub id: CommandId,
    pub enabled: bool,
    pub name: &'static str,
}

/// Ordered table of command descriptors
///
/// Built once; afterwards only `install` changes it, and only by turning
/// entries on.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandDescriptor>,
}

impl CommandTable {
    /// Build a table from explicit descriptors
    pub fn new(entries: Vec<CommandDescriptor>) -> Self {
        Self { entries }
    }

    /// The shell's starting table: every known command, all disabled
    pub fn known() -> Self {
        let entries = KNOWN_COMMANDS
            .iter()
            .map(|&(id, name)| CommandDescriptor {
                id,
                enabled: false,
                name,
            })
            .collect();
        Self { entries }
    }

    /// The server's table: known commands, enabled exactly where the
    /// catalog provides a handler
    pub fn offering(catalog: &CommandCatalog) -> Self {
        let mut table = Self::known();
        for entry in &mut table.entries {
            entry.enabled = catalog.contains(entry.name);
        }
        table
    }

    /// Enabled ids in table order
    pub fn supported_ids(&self) -> Vec<CommandId> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.id)
            .collect()
    }

    /// Enable every listed id present in this table
    ///
    /// Returns how many ids were installed. Unknown ids are skipped.
    pub fn install(&mut self, ids: &[CommandId]) -> usize {
        let mut installed = 0;
        for id in ids {
            match self.entries.iter_mut().find(|e| e.id == *id) {
                Some(entry) => {
                    entry.enabled = true;
                    installed += 1;
                }
                None => tracing::debug!("Cannot install command #{}", id),
            }
        }
        installed
    }

    /// Id of an enabled command with this name
    pub fn lookup_enabled(&self, name: &str) -> Option<CommandId> {
        self.entries
            .iter()
            .find(|e| e.enabled && e.name == name)
            .map(|e| e.id)
    }

    pub fn name_of(&self, id: CommandId) -> Option<&'static str> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.name)
    }

    pub fn is_enabled(&self, id: CommandId) -> bool {
        self.entries.iter().any(|e| e.id == id && e.enabled)
    }

    /// Names of the enabled commands, in table order
    pub fn enabled_names(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name)
            .collect()
    }

    pub fn descriptors(&self) -> &[CommandDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
