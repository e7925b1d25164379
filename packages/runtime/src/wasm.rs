//! WASM modules executed with Wasmtime.
//!
//! A WASM module is a core WebAssembly module (binary `.wasm` or text
//! `.wat`) with no imports. Every exported function becomes callable by
//! name. Arguments are positional only and are converted to the parameter
//! types the export declares.

use std::path::Path;

use parking_lot::Mutex;
use wasmtime::{Engine, ExternType, Instance, Store, Val, ValType};

use crate::exception::Exception;
use crate::module::{Args, Module, ModuleKind};
use crate::object::Object;

/// An instantiated WASM module.
pub struct WasmModule {
    name: String,
    store: Mutex<Store<()>>,
    instance: Instance,
    exports: Vec<String>,
}

impl WasmModule {
    /// Compile and instantiate a module from a `.wasm` or `.wat` file.
    pub fn from_file(engine: &Engine, name: &str, path: impl AsRef<Path>) -> Result<Self, Exception> {
        let path = path.as_ref();
        let module = wasmtime::Module::from_file(engine, path)
            .map_err(|e| Exception::import(name, format!("{}: {}", path.display(), e)))?;
        Self::instantiate(engine, name, &module)
    }

    /// Compile and instantiate a module from bytes (binary or text format).
    pub fn from_bytes(engine: &Engine, name: &str, bytes: impl AsRef<[u8]>) -> Result<Self, Exception> {
        let module =
            wasmtime::Module::new(engine, bytes).map_err(|e| Exception::import(name, e))?;
        Self::instantiate(engine, name, &module)
    }

    fn instantiate(
        engine: &Engine,
        name: &str,
        module: &wasmtime::Module,
    ) -> Result<Self, Exception> {
        let mut store = Store::new(engine, ());
        let instance =
            Instance::new(&mut store, module, &[]).map_err(|e| Exception::import(name, e))?;

        let mut exports: Vec<String> = module
            .exports()
            .filter(|export| matches!(export.ty(), ExternType::Func(_)))
            .map(|export| export.name().to_string())
            .collect();
        exports.sort();

        Ok(Self {
            name: name.to_string(),
            store: Mutex::new(store),
            instance,
            exports,
        })
    }
}

/// Convert an argument to the declared parameter type.
fn object_to_val(obj: &Object, ty: &ValType, function: &str, index: usize) -> Result<Val, Exception> {
    let mismatch = || {
        Exception::type_error(format!(
            "{}() argument {} must be {}, not '{}'",
            function,
            index + 1,
            ty,
            obj.type_name()
        ))
    };

    match ty {
        ValType::I32 => {
            let i = obj.as_int().ok_or_else(mismatch)?;
            let i = i32::try_from(i).map_err(|_| {
                Exception::overflow(format!(
                    "{}() argument {} does not fit in i32",
                    function,
                    index + 1
                ))
            })?;
            Ok(Val::I32(i))
        }
        ValType::I64 => obj.as_int().map(Val::I64).ok_or_else(mismatch),
        ValType::F32 => obj
            .as_float()
            .map(|f| Val::F32((f as f32).to_bits()))
            .ok_or_else(mismatch),
        ValType::F64 => obj
            .as_float()
            .map(|f| Val::F64(f.to_bits()))
            .ok_or_else(mismatch),
        _ => Err(Exception::type_error(format!(
            "{}() takes a {} parameter, which cannot be passed from the host",
            function, ty
        ))),
    }
}

fn val_to_object(val: &Val) -> Object {
    match val {
        Val::I32(i) => Object::Int(*i as i64),
        Val::I64(i) => Object::Int(*i),
        Val::F32(bits) => Object::Float(f32::from_bits(*bits) as f64),
        Val::F64(bits) => Object::Float(f64::from_bits(*bits)),
        Val::V128(_) => Object::opaque("v128"),
        _ => Object::opaque("reference"),
    }
}

impl Module for WasmModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Wasm
    }

    fn has_function(&self, function: &str) -> bool {
        self.exports.iter().any(|e| e == function)
    }

    fn functions(&self) -> Vec<String> {
        self.exports.clone()
    }

    fn call(&self, function: &str, args: Args) -> Result<Object, Exception> {
        args.allow_keywords(function, &[])?;

        let mut store = self.store.lock();
        let func = self
            .instance
            .get_func(&mut *store, function)
            .ok_or_else(|| Exception::attribute(&self.name, function))?;

        let ty = func.ty(&*store);
        let params: Vec<ValType> = ty.params().collect();
        args.expect_positional(function, params.len())?;

        let inputs = args
            .positional()
            .iter()
            .zip(&params)
            .enumerate()
            .map(|(i, (obj, ty))| object_to_val(obj, ty, function, i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = vec![Val::I32(0); ty.results().len()];
        func.call(&mut *store, &inputs, &mut outputs)
            .map_err(|e| Exception::trap(e.to_string(), format!("{:?}", e)))?;

        Ok(match outputs.as_slice() {
            [] => Object::None,
            [single] => val_to_object(single),
            many => Object::list(many.iter().map(val_to_object).collect()),
        })
    }
}
