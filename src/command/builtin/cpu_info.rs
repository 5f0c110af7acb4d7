//! `xrCpuInfo`: processor summary
//!
//! Counts logical processors, cores and packages in a procfs cpuinfo
//! listing and reports the first model name seen.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::command::{Command, ParseContext};
use crate::protocol::{ErrorCode, ExecutionResult, OptionList};

const PROC_CPUINFO_PATH: &str = "/proc/cpuinfo";

const HELP_TEXT: &str = "\
SYNTAX:
\txrCpuInfo
USAGE:
\tThis function will display the processor model and the number of
\tlogical processors, cores and packages of the controller.
";

/// `xrCpuInfo`: processor summary from procfs
#[derive(Debug)]
pub struct CpuInfo {
    source: PathBuf,
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self::with_source(PROC_CPUINFO_PATH)
    }
}

impl CpuInfo {
    /// Read processor data from another file
    pub fn with_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Render the summary of a cpuinfo listing
///
/// `None` when the listing has no processor entries.
fn summarize(text: &str) -> Option<String> {
    let mut processors = 0usize;
    let mut model: Option<&str> = None;
    let mut packages = BTreeSet::new();
    let mut cores = BTreeSet::new();
    let mut package = "0";

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "processor" => processors += 1,
            "model name" | "cpu model" | "Processor" if model.is_none() => model = Some(value),
            "physical id" => {
                package = value;
                packages.insert(value.to_string());
            }
            "core id" => {
                cores.insert(format!("{}:{}", package, value));
            }
            _ => {}
        }
    }

    if processors == 0 {
        return None;
    }

    let packages = packages.len().max(1);
    let cores = if cores.is_empty() { processors } else { cores.len() };

    Some(format!(
        "MODEL\t\t{}\nPROCESSORS\t{}\nCORES\t\t{}\nPACKAGES\t{}\n",
        model.unwrap_or("UNKNOWN"),
        processors,
        cores,
        packages
    ))
}

impl Command for CpuInfo {
    fn name(&self) -> &str {
        "xrCpuInfo"
    }

    fn help(&self) -> &str {
        HELP_TEXT
    }

    fn parse(&self, options: &OptionList, _ctx: &mut ParseContext<'_>) -> bool {
        options.is_empty()
    }

    fn execute(&self, _options: &OptionList) -> ExecutionResult {
        let text = match fs::read_to_string(&self.source) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", self.source.display(), e);
                return ExecutionResult::error(ErrorCode::NO_DEVICE);
            }
        };

        match summarize(&text) {
            Some(summary) => ExecutionResult::with_data(summary.into_bytes()),
            None => ExecutionResult::error(ErrorCode::NO_DEVICE),
        }
    }
}
