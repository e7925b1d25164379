//! The interpreter: module registry, import cache and call entry point.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;
use wasmtime::Engine;

use crate::builtins::{self, SysInfo};
use crate::exception::Exception;
use crate::ident;
use crate::loader::ModuleLoader;
use crate::module::{Args, Module};
use crate::object::Object;
use crate::wasm::WasmModule;

/// Settings for a new interpreter.
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// Directories searched for WASM modules. Relative entries are resolved
    /// against `working_dir` when one is set.
    pub search_paths: Vec<PathBuf>,

    /// The interpreter's working directory.
    pub working_dir: Option<PathBuf>,
}

/// An embedded interpreter instance.
///
/// The interpreter is not internally synchronized for calls: its owner
/// holds it behind a single lock so that one call runs at a time.
pub struct Interpreter {
    id: Uuid,
    engine: Engine,
    loader: ModuleLoader,

    /// Native modules that can be imported by name.
    registry: BTreeMap<String, Arc<dyn Module>>,

    /// Modules imported so far.
    imported: BTreeMap<String, Arc<dyn Module>>,

    /// Registry names, shared with the `sys` module.
    registered_names: Arc<RwLock<Vec<String>>>,
}

impl Interpreter {
    /// Create an interpreter with the built-in modules registered.
    pub fn new(config: InterpreterConfig) -> Self {
        let search_paths: Vec<PathBuf> = config
            .search_paths
            .into_iter()
            .map(|p| match &config.working_dir {
                Some(cwd) if p.is_relative() => cwd.join(p),
                _ => p,
            })
            .collect();

        let mut interpreter = Self {
            id: Uuid::new_v4(),
            engine: Engine::default(),
            loader: ModuleLoader::new(search_paths.clone()),
            registry: BTreeMap::new(),
            imported: BTreeMap::new(),
            registered_names: Arc::new(RwLock::new(Vec::new())),
        };

        let sys = builtins::sys(SysInfo {
            instance: interpreter.id,
            search_paths,
            working_dir: config.working_dir,
            modules: interpreter.registered_names.clone(),
        });
        interpreter.register(Arc::new(builtins::math_ops()));
        interpreter.register(Arc::new(sys));

        tracing::debug!(instance = %interpreter.id, "interpreter created");
        interpreter
    }

    /// Unique id of this instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        self.loader.search_paths()
    }

    /// Register a native module, replacing any module of the same name.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        let name = module.name().to_string();
        self.imported.remove(&name);
        self.registry.insert(name, module);

        let mut names = self.registered_names.write();
        *names = self.registry.keys().cloned().collect();
    }

    /// Names of registered native modules.
    pub fn registered(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    /// Names of modules imported so far.
    pub fn imported(&self) -> Vec<String> {
        self.imported.keys().cloned().collect()
    }

    /// Import a module: cache, then the native registry, then the search path.
    pub fn import(&mut self, name: &str) -> Result<Arc<dyn Module>, Exception> {
        if let Some(module) = self.imported.get(name) {
            return Ok(module.clone());
        }

        if !ident::is_module_name(name) {
            return Err(Exception::module_not_found(name));
        }

        let module = match self.registry.get(name) {
            Some(module) => module.clone(),
            None => {
                let path = self
                    .loader
                    .locate(name)
                    .ok_or_else(|| Exception::module_not_found(name))?;
                tracing::debug!(module = name, path = %path.display(), "loading wasm module");
                Arc::new(WasmModule::from_file(&self.engine, name, &path)?) as Arc<dyn Module>
            }
        };

        tracing::debug!(module = name, kind = %module.kind(), "imported module");
        self.imported.insert(name.to_string(), module.clone());
        Ok(module)
    }

    /// Call `module.function` with `args`.
    ///
    /// Panics inside the function are caught and raised as `Panic`
    /// exceptions. Every exception leaving a function records the frame.
    pub fn call(&mut self, module: &str, function: &str, args: Args) -> Result<Object, Exception> {
        let target = self.import(module)?;
        if !ident::is_identifier(function) || !target.has_function(function) {
            return Err(Exception::attribute(module, function));
        }

        let frame = format!("{}.{}", module, function);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.call(function, args)));
        match outcome {
            Ok(result) => result.map_err(|e| e.with_frame(frame)),
            Err(payload) => Err(Exception::panic(panic_message(payload.as_ref())).with_frame(frame)),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "native function panicked".to_string()
    }
}
