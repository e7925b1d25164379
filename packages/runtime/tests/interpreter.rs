use std::sync::Arc;

use embedlink_runtime::{
    Args, ExceptionKind, Interpreter, InterpreterConfig, Module, ModuleKind, NativeModule, Object,
};

const COUNTER: &str = r#"
    (module
      (global $n (mut i64) (i64.const 0))
      (func (export "bump") (result i64)
        global.get $n
        i64.const 1
        i64.add
        global.set $n
        global.get $n)
      (func (export "div") (param i32 i32) (result i32)
        local.get 0
        local.get 1
        i32.div_s))
"#;

fn interpreter_with(dir: &tempfile::TempDir) -> Interpreter {
    Interpreter::new(InterpreterConfig {
        search_paths: vec![dir.path().to_path_buf()],
        working_dir: Some(dir.path().to_path_buf()),
    })
}

#[test]
fn test_wasm_module_keeps_state_between_calls() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("tools")).unwrap();
    std::fs::write(dir.path().join("tools").join("counter.wat"), COUNTER).unwrap();

    let mut interp = interpreter_with(&dir);
    for expected in 1..=3 {
        let n = interp.call("tools.counter", "bump", Args::default()).unwrap();
        assert_eq!(n.as_int(), Some(expected));
    }

    let module = interp.import("tools.counter").unwrap();
    assert_eq!(module.kind(), ModuleKind::Wasm);
    assert_eq!(module.functions(), vec!["bump", "div"]);
    assert_eq!(interp.imported(), vec!["tools.counter"]);
}

#[test]
fn test_wasm_trap_carries_traceback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("counter.wat"), COUNTER).unwrap();

    let mut interp = interpreter_with(&dir);
    let err = interp
        .call(
            "counter",
            "div",
            Args::new(vec![Object::Int(1), Object::Int(0)], vec![]),
        )
        .unwrap_err();

    assert_eq!(err.kind, ExceptionKind::Trap);
    assert_eq!(err.traceback, vec!["counter.div".to_string()]);
    let rendered = err.render_traceback().unwrap();
    assert!(rendered.starts_with("Traceback (most recent call last):"));
    assert!(rendered.contains("counter.div"));
}

#[test]
fn test_broken_module_is_import_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.wat"), "(module (func").unwrap();

    let mut interp = interpreter_with(&dir);
    let err = interp.import("broken").err().unwrap();
    assert_eq!(err.kind, ExceptionKind::Import);

    // A failed import is not cached.
    assert!(interp.imported().is_empty());
}

#[test]
fn test_native_module_shadows_search_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("counter.wat"), COUNTER).unwrap();

    let mut interp = interpreter_with(&dir);
    interp.register(Arc::new(
        NativeModule::builder("counter")
            .function("bump", |_| Ok(Object::str("native")))
            .build(),
    ));

    let result = interp.call("counter", "bump", Args::default()).unwrap();
    assert_eq!(result.as_str(), Some("native"));
}

#[test]
fn test_sys_reflects_interpreter() {
    let dir = tempfile::tempdir().unwrap();
    let mut interp = interpreter_with(&dir);
    interp.register(Arc::new(NativeModule::builder("extra").build()));

    let instance = interp.call("sys", "instance", Args::default()).unwrap();
    assert_eq!(instance.as_str(), Some(interp.id().to_string().as_str()));

    let cwd = interp.call("sys", "cwd", Args::default()).unwrap();
    assert_eq!(cwd.as_str(), Some(dir.path().display().to_string().as_str()));

    match interp.call("sys", "modules", Args::default()).unwrap() {
        Object::List(items) => {
            let names: Vec<String> = items
                .read()
                .iter()
                .filter_map(|o| o.as_str().map(str::to_string))
                .collect();
            assert_eq!(names, vec!["extra", "math_ops", "sys"]);
        }
        other => panic!("expected list, got {:?}", other),
    }
}
