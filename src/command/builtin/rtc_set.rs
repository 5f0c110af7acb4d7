//! `xrRtcSet`: real-time clock placeholder

use crate::command::{Command, ParseContext};
use crate::protocol::{ExecutionResult, OptionList};

const HELP_TEXT: &str = "\
SYNTAX:
\txrRtcSet
USAGE:
\txrRtcSet
";

/// `xrRtcSet`: placeholder whose parser always asks for help
#[derive(Debug, Default)]
pub struct RtcSet;

impl Command for RtcSet {
    fn name(&self) -> &str {
        "xrRtcSet"
    }

    fn help(&self) -> &str {
        HELP_TEXT
    }

    fn parse(&self, _options: &OptionList, _ctx: &mut ParseContext<'_>) -> bool {
        false
    }

    fn execute(&self, _options: &OptionList) -> ExecutionResult {
        ExecutionResult::success()
    }
}
