//! Dispatcher Tests
//!
//! Tests for name resolution and request dispatch, using in-memory handlers
//! and plugin loaders.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use srpcf::command::{
    Command, CommandTable, Dispatcher, ParseContext, PluginLoader, Resolved, PLUGIN_COMMAND_ID,
};
use srpcf::protocol::{ErrorCode, ExecutionResult, OptionList, Request, Response};
use srpcf::{CommandCatalog, DispatchError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Handler that echoes its options and counts executions
struct Echo {
    name: String,
    calls: Mutex<usize>,
}

impl Echo {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl Command for Echo {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        "echo help"
    }

    fn parse(&self, _options: &OptionList, _ctx: &mut ParseContext<'_>) -> bool {
        true
    }

    fn execute(&self, options: &OptionList) -> ExecutionResult {
        *self.calls.lock() += 1;
        let joined: Vec<&str> = options.iter().collect();
        ExecutionResult::with_data(format!("{}:{}", self.name, joined.join(",")).into_bytes())
    }
}

/// Plugin loader backed by a map
#[derive(Default)]
struct MapLoader {
    plugins: HashMap<String, Arc<dyn Command>>,
}

impl MapLoader {
    fn with(mut self, command: Arc<dyn Command>) -> Self {
        self.plugins.insert(command.name().to_string(), command);
        self
    }
}

impl PluginLoader for MapLoader {
    fn load(&self, name: &str) -> Result<Arc<dyn Command>, DispatchError> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::NoDevice(name.to_string()))
    }
}

fn catalog_with(commands: &[Arc<Echo>]) -> Arc<CommandCatalog> {
    let mut catalog = CommandCatalog::new();
    for command in commands {
        catalog.register(command.clone());
    }
    Arc::new(catalog)
}

fn execute_result(response: Response) -> ExecutionResult {
    match response {
        Response::Execute(result) => result,
        other => panic!("Expected EXECUTE response, got {:?}", other),
    }
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_resolve_builtin() {
    let cpu = Echo::new("xrCpuInfo");
    let dispatcher = Dispatcher::server(catalog_with(&[cpu]), Arc::new(MapLoader::default()));

    let resolved = dispatcher.resolve("xrCpuInfo").unwrap();
    assert!(!resolved.is_plugin());
    assert_eq!(resolved.id(), 2);
}

#[test]
fn test_resolve_plugin() {
    let loader = MapLoader::default().with(Echo::new("xrHelloWorld"));
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(loader));

    let resolved = dispatcher.resolve("xrHelloWorld").unwrap();
    assert!(resolved.is_plugin());
    assert_eq!(resolved.id(), PLUGIN_COMMAND_ID);
}

#[test]
fn test_builtin_wins_over_plugin() {
    let builtin = Echo::new("xrCpuInfo");
    let plugin = Echo::new("xrCpuInfo");
    let loader = MapLoader::default().with(plugin.clone());
    let dispatcher = Dispatcher::server(catalog_with(&[builtin.clone()]), Arc::new(loader));

    let resolved = dispatcher.resolve("xrCpuInfo").unwrap();
    assert!(matches!(resolved, Resolved::Builtin { id: 2, .. }));

    resolved.command().execute(&OptionList::new());
    assert_eq!(builtin.calls(), 1);
    assert_eq!(plugin.calls(), 0);
}

#[test]
fn test_disabled_builtin_falls_back_to_plugin() {
    let builtin = Echo::new("xrCpuInfo");
    let loader = MapLoader::default().with(Echo::new("xrCpuInfo"));
    // Client-side table: nothing negotiated yet
    let dispatcher = Dispatcher::new(
        CommandTable::known(),
        catalog_with(&[builtin]),
        Arc::new(loader),
    );

    assert!(dispatcher.resolve("xrCpuInfo").unwrap().is_plugin());
}

#[test]
fn test_resolve_unknown() {
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(MapLoader::default()));
    assert_eq!(
        dispatcher.resolve("xrNothing").unwrap_err(),
        DispatchError::NoDevice("xrNothing".to_string())
    );
}

#[test]
fn test_resolved_request_shapes() {
    let cpu = Echo::new("xrCpuInfo");
    let loader = MapLoader::default().with(Echo::new("xrHelloWorld"));
    let dispatcher = Dispatcher::server(catalog_with(&[cpu]), Arc::new(loader));

    let options: OptionList = ["a"].into_iter().collect();

    let builtin = dispatcher.resolve("xrCpuInfo").unwrap();
    assert_eq!(
        builtin.request(options.clone()),
        Request::Execute {
            command_id: 2,
            options: options.clone(),
        }
    );

    let plugin = dispatcher.resolve("xrHelloWorld").unwrap();
    assert_eq!(
        plugin.request(options.clone()),
        Request::ExecutePlugin {
            command_id: PLUGIN_COMMAND_ID,
            name: "xrHelloWorld".to_string(),
            options,
        }
    );
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_dispatch_query_support() {
    let commands = [Echo::new("xrHelp"), Echo::new("xrPciList")];
    let dispatcher = Dispatcher::server(catalog_with(&commands), Arc::new(MapLoader::default()));

    assert_eq!(
        dispatcher.dispatch(&Request::QuerySupport),
        Response::QuerySupport { ids: vec![1, 3] }
    );
}

#[test]
fn test_dispatch_execute_passes_options() {
    let pci = Echo::new("xrPciList");
    let dispatcher = Dispatcher::server(catalog_with(&[pci.clone()]), Arc::new(MapLoader::default()));

    let result = execute_result(dispatcher.dispatch(&Request::Execute {
        command_id: 3,
        options: ["alpha", "beta"].into_iter().collect(),
    }));

    assert!(result.is_success());
    assert_eq!(result.data_str().unwrap(), "xrPciList:alpha,beta");
    assert_eq!(pci.calls(), 1);
}

#[test]
fn test_dispatch_unknown_id() {
    let loader = MapLoader::default().with(Echo::new("xrHelloWorld"));
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(loader));

    let result = execute_result(dispatcher.dispatch(&Request::Execute {
        command_id: 999,
        options: OptionList::new(),
    }));

    assert_eq!(result.error_code, ErrorCode::COMMAND_NOT_FOUND);
    assert!(result.data.is_none());
}

#[test]
fn test_dispatch_known_but_unoffered_id() {
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(MapLoader::default()));
    let result = dispatcher.execute(4, &OptionList::new());
    assert_eq!(result.error_code, ErrorCode::COMMAND_NOT_FOUND);
}

#[test]
fn test_dispatch_plugin() {
    let hello = Echo::new("xrHelloWorld");
    let loader = MapLoader::default().with(hello.clone());
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(loader));

    let result = execute_result(dispatcher.dispatch(&Request::ExecutePlugin {
        command_id: PLUGIN_COMMAND_ID,
        name: "xrHelloWorld".to_string(),
        options: ["x"].into_iter().collect(),
    }));

    assert_eq!(result.data_str().unwrap(), "xrHelloWorld:x");
    assert_eq!(hello.calls(), 1);
}

#[test]
fn test_dispatch_missing_plugin() {
    let dispatcher = Dispatcher::server(catalog_with(&[]), Arc::new(MapLoader::default()));
    let result = dispatcher.execute_plugin("xrMissing", &OptionList::new());

    assert_eq!(result.error_code, ErrorCode::NO_DEVICE);
    assert!(result.data.is_none());
}

#[test]
fn test_builtin_catalog_commands() {
    let catalog = CommandCatalog::builtin();
    assert_eq!(
        catalog.names(),
        vec!["xrCpuInfo", "xrHelp", "xrPciList", "xrRtcSet"]
    );

    let dispatcher = Dispatcher::server(Arc::new(catalog), Arc::new(MapLoader::default()));
    assert!(dispatcher.execute(1, &OptionList::new()).is_success());
    assert!(dispatcher.execute(6, &OptionList::new()).is_success());
}
