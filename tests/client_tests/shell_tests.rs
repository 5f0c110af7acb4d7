//! Shell Output Tests
//!
//! Tests for how execution results are printed.

use parking_lot::Mutex;
use srpcf::client::render_result;
use srpcf::command::{Command, ParseContext};
use srpcf::protocol::{ErrorCode, ExecutionResult, OptionList};

// =============================================================================
// Helper Functions
// =============================================================================

/// Command that records the codes passed to its error hook
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<ErrorCode>>,
}

impl Command for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn help(&self) -> &str {
        ""
    }

    fn parse(&self, _options: &OptionList, _ctx: &mut ParseContext<'_>) -> bool {
        true
    }

    fn handle_error(&self, code: ErrorCode) {
        self.seen.lock().push(code);
    }

    fn execute(&self, _options: &OptionList) -> ExecutionResult {
        ExecutionResult::success()
    }
}

fn render(result: &ExecutionResult, command: &Recorder) -> String {
    let mut out = Vec::new();
    render_result(result, command, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_render_data() {
    let recorder = Recorder::default();
    let result = ExecutionResult::with_data(b"Hello World\n".to_vec());
    assert_eq!(render(&result, &recorder), "Hello World\n\n");
    assert!(recorder.seen.lock().is_empty());
}

#[test]
fn test_render_success() {
    let recorder = Recorder::default();
    assert_eq!(render(&ExecutionResult::success(), &recorder), "SUCCESSFUL\n");
}

#[test]
fn test_render_error_calls_hook() {
    let recorder = Recorder::default();
    let result = ExecutionResult::error(ErrorCode::COMMAND_NOT_FOUND);
    assert_eq!(render(&result, &recorder), "ERROR: 9\n");
    assert_eq!(*recorder.seen.lock(), vec![ErrorCode::COMMAND_NOT_FOUND]);
}
