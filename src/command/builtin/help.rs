//! `xrHelp`: prints the help text of another command
//!
//! All the work happens in the shell's parser; the server side only
//! acknowledges.

use std::io::Write;

use crate::command::{Command, ParseContext};
use crate::protocol::{ExecutionResult, OptionList};

const HELP_TEXT: &str = "\
SYNTAX:
\txrHelp <SrpcfCmd>
\t<SrpcfCmd> SRPCF Command Name.
USAGE:
\tThe function will display the help message for the specified
\tSRPCF command or a list of all SRPCF command if no SrpcfCmd is supplied.
";

/// `xrHelp <command>`: prints the help text of an enabled command
///
/// All the work happens in the parser; the server side has nothing to do.
#[derive(Debug, Default)]
pub struct Help;

impl Command for Help {
    fn name(&self) -> &str {
        "xrHelp"
    }

    fn help(&self) -> &str {
        HELP_TEXT
    }

    fn parse(&self, options: &OptionList, ctx: &mut ParseContext<'_>) -> bool {
        if options.len() != 1 {
            return false;
        }
        let Some(target) = options.get(0) else {
            return false;
        };

        if ctx.table.lookup_enabled(target).is_none() {
            return false;
        }
        let Some(command) = ctx.catalog.get(target) else {
            return false;
        };

        ctx.out.write_all(command.help().as_bytes()).is_ok()
    }

    fn execute(&self, _options: &OptionList) -> ExecutionResult {
        ExecutionResult::success()
    }
}
