//! Plugin Tests
//!
//! Tests for plugin discovery and the executable module contract.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use srpcf::command::{CommandTable, ParseContext, PluginDirectory, PluginLoader};
use srpcf::protocol::{ErrorCode, OptionList};
use srpcf::{CommandCatalog, DispatchError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const HELLO_MODULE: &str = r#"#!/bin/sh
case "$1" in
    help) printf 'SYNTAX:\n\txrHello\n' ;;
    parse) shift; echo "checked $#"; [ "$#" -ge 1 ] ;;
    execute) printf 'Hello World\n' ;;
    *) exit 8 ;;
esac
"#;

fn write_module(dir: &Path, name: &str, body: &str) {
    let path = dir.join(format!("{}.srpcf", name));
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn plugin_dir() -> (TempDir, PluginDirectory) {
    let temp = TempDir::new().unwrap();
    let plugins = PluginDirectory::new(temp.path(), ".srpcf");
    (temp, plugins)
}

fn parse(plugins: &PluginDirectory, name: &str, args: &[&str]) -> (bool, String) {
    let command = plugins.load(name).unwrap();
    let table = CommandTable::known();
    let catalog = CommandCatalog::new();
    let options: OptionList = args.iter().copied().collect();
    let mut out = Vec::new();

    let accepted = {
        let mut ctx = ParseContext {
            table: &table,
            catalog: &catalog,
            out: &mut out,
        };
        command.parse(&options, &mut ctx)
    };
    (accepted, String::from_utf8(out).unwrap())
}

// =============================================================================
// Loading Tests
// =============================================================================

#[test]
fn test_path_for() {
    let plugins = PluginDirectory::new("/opt/plugins", ".srpcf");
    assert_eq!(
        plugins.path_for("xrHelloWorld"),
        Path::new("/opt/plugins/xrHelloWorld.srpcf")
    );
}

#[test]
fn test_load_reads_help() {
    let (temp, plugins) = plugin_dir();
    write_module(temp.path(), "xrHello", HELLO_MODULE);

    let command = plugins.load("xrHello").unwrap();
    assert_eq!(command.name(), "xrHello");
    assert_eq!(command.help(), "SYNTAX:\n\txrHello\n");
}

#[test]
fn test_missing_module_is_no_device() {
    let (_temp, plugins) = plugin_dir();
    assert!(matches!(
        plugins.load("xrMissing"),
        Err(DispatchError::NoDevice(_))
    ));
}

#[test]
fn test_directory_is_no_device() {
    let (temp, plugins) = plugin_dir();
    fs::create_dir(temp.path().join("xrDir.srpcf")).unwrap();
    assert!(matches!(
        plugins.load("xrDir"),
        Err(DispatchError::NoDevice(_))
    ));
}

#[test]
fn test_non_executable_is_no_device() {
    let (temp, plugins) = plugin_dir();
    let path = temp.path().join("xrPlain.srpcf");
    fs::write(&path, HELLO_MODULE).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(matches!(
        plugins.load("xrPlain"),
        Err(DispatchError::NoDevice(_))
    ));
}

#[test]
fn test_failing_help_is_command_not_found() {
    let (temp, plugins) = plugin_dir();
    write_module(temp.path(), "xrBroken", "#!/bin/sh\nexit 1\n");

    assert!(matches!(
        plugins.load("xrBroken"),
        Err(DispatchError::CommandNotFound(_))
    ));
}

#[test]
fn test_names_cannot_leave_directory() {
    let (temp, plugins) = plugin_dir();
    let nested = temp.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_module(&nested, "xrHello", HELLO_MODULE);

    for name in ["nested/xrHello", "../xrHello", "..", "", "a\\b"] {
        assert!(
            matches!(plugins.load(name), Err(DispatchError::CommandNotFound(_))),
            "name {:?} should be rejected",
            name
        );
    }
}

// =============================================================================
// Contract Tests
// =============================================================================

#[test]
fn test_execute_returns_stdout() {
    let (temp, plugins) = plugin_dir();
    write_module(temp.path(), "xrHello", HELLO_MODULE);

    let result = plugins.load("xrHello").unwrap().execute(&OptionList::new());
    assert_eq!(result.error_code, ErrorCode::SUCCESSFUL);
    assert_eq!(result.data.as_deref(), Some(&b"Hello World\n"[..]));
}

#[test]
fn test_parse_uses_exit_status() {
    let (temp, plugins) = plugin_dir();
    write_module(temp.path(), "xrHello", HELLO_MODULE);

    let (accepted, out) = parse(&plugins, "xrHello", &[]);
    assert!(!accepted);
    assert_eq!(out, "checked 0\n");

    let (accepted, out) = parse(&plugins, "xrHello", &["a", "b"]);
    assert!(accepted);
    assert_eq!(out, "checked 2\n");
}

#[test]
fn test_exit_status_is_error_code() {
    let (temp, plugins) = plugin_dir();
    write_module(
        temp.path(),
        "xrBusy",
        "#!/bin/sh\n[ \"$1\" = help ] && exit 0\nexit 5\n",
    );

    let result = plugins.load("xrBusy").unwrap().execute(&OptionList::new());
    assert_eq!(result.error_code, ErrorCode::BUSY);
    assert!(result.data.is_none());
}

#[test]
fn test_options_become_arguments() {
    let (temp, plugins) = plugin_dir();
    write_module(
        temp.path(),
        "xrArgs",
        "#!/bin/sh\nshift\nfor a in \"$@\"; do printf '[%s]' \"$a\"; done\n",
    );

    let options: OptionList = ["alpha", "two words"].into_iter().collect();
    let result = plugins.load("xrArgs").unwrap().execute(&options);
    assert_eq!(result.data_str().unwrap(), "[alpha][two words]");
}

#[test]
fn test_nul_argument_is_invalid() {
    let (temp, plugins) = plugin_dir();
    write_module(temp.path(), "xrHello", HELLO_MODULE);

    let options: OptionList = ["a\0b"].into_iter().collect();
    let result = plugins.load("xrHello").unwrap().execute(&options);
    assert_eq!(result.error_code, ErrorCode::INVALID);
    assert!(result.data.is_none());
}

#[test]
fn test_sample_plugin() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("plugins");
    let plugins = PluginDirectory::new(dir, ".srpcf");

    let command = plugins.load("xrHelloWorld").unwrap();
    let result = command.execute(&OptionList::new());
    assert!(result.is_success());
    assert_eq!(result.data_str().unwrap(), "Hello World\n");
}
