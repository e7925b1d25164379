use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedlink::{
    BridgeConfig, BridgeError, CallRequest, ErrorKind, NativeModule, Object, RuntimeHandle,
    RuntimeState, Value,
};

fn handle() -> RuntimeHandle {
    RuntimeHandle::new(BridgeConfig::default().with_env(false))
}

fn nested_list(depth: usize) -> Value {
    (0..depth).fold(Value::Null, |inner, _| Value::List(vec![inner]))
}

#[test]
fn test_add_returns_five() {
    let result = handle()
        .call("math_ops", "add", vec![Value::Int(2), Value::Int(3)], BTreeMap::new())
        .unwrap();
    assert_eq!(result, Value::Int(5));
}

#[test]
fn test_missing_module() {
    let err = handle()
        .call("missing_module", "f", vec![], BTreeMap::new())
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::ModuleNotFound {
            module: "missing_module".into()
        }
    );
}

#[test]
fn test_missing_function() {
    let err = handle()
        .invoke(&CallRequest::new("math_ops", "frobnicate"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FunctionNotFound);
}

#[test]
fn test_lazy_init_reuses_instance() {
    let handle = handle();
    assert_eq!(handle.state(), RuntimeState::Uninitialized);

    let first = handle.invoke(&CallRequest::new("sys", "instance")).unwrap();
    assert_eq!(handle.state(), RuntimeState::Ready);
    let second = handle.invoke(&CallRequest::new("sys", "instance")).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.as_str().map(str::to_string),
        handle.instance_id().map(|id| id.to_string())
    );
}

#[test]
fn test_calls_never_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handle = Arc::new(handle());
    {
        let active = active.clone();
        let peak = peak.clone();
        handle
            .register_module(
                NativeModule::builder("probe")
                    .function("enter", move |_| {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(Object::Int(now as i64))
                    })
                    .build(),
            )
            .unwrap();
    }

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let value = handle.invoke(&CallRequest::new("probe", "enter")).unwrap();
                    assert_eq!(value, Value::Int(1));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_calls_start_once() {
    let handle = Arc::new(handle());
    let ids: Vec<Value> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || handle.invoke(&CallRequest::new("sys", "instance")).unwrap())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|t| t.join().unwrap())
        .collect();

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_shutdown_makes_runtime_unavailable() {
    let handle = handle();
    handle.ensure_ready().unwrap();
    handle.shutdown();
    handle.shutdown();

    let err = handle
        .call("math_ops", "add", vec![Value::Int(2), Value::Int(3)], BTreeMap::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    assert_eq!(handle.state(), RuntimeState::ShutDown);
}

#[test]
fn test_argument_too_deep() {
    let handle = RuntimeHandle::new(BridgeConfig::default().with_env(false).with_max_depth(8));
    let request = CallRequest::new("math_ops", "sum").with_arg(nested_list(9));

    let err = handle.invoke(&request).unwrap_err();
    assert_eq!(err, BridgeError::EncodingTooDeep { limit: 8 });

    // The handle is still usable.
    let ok = handle
        .invoke(&CallRequest::new("math_ops", "sum").with_arg(vec![1i64, 2]))
        .unwrap();
    assert_eq!(ok, Value::Int(3));
}

#[test]
fn test_unrepresentable_result_is_decoding_failure() {
    let handle = handle();
    handle
        .register_module(
            NativeModule::builder("odd")
                .function("cycle", |_| {
                    let list = Object::list(vec![]);
                    if let Object::List(items) = &list {
                        items.write().push(list.clone());
                    }
                    Ok(list)
                })
                .function("int_keys", |_| {
                    Ok(Object::dict(vec![(Object::Int(1), Object::None)]))
                })
                .build(),
        )
        .unwrap();

    for function in ["cycle", "int_keys"] {
        let err = handle.invoke(&CallRequest::new("odd", function)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodingFailed, "{}", function);
    }
}

#[test]
fn test_native_exception_keeps_name_and_trace() {
    let err = handle()
        .invoke(&CallRequest::new("math_ops", "div").with_args(vec![1i64, 0]))
        .unwrap_err();
    match &err {
        BridgeError::NativeException {
            exception, message, ..
        } => {
            assert_eq!(exception, "ZeroDivisionError");
            assert_eq!(message, "division by zero");
        }
        other => panic!("expected native exception, got {:?}", other),
    }
    assert!(err.trace().unwrap().contains("math_ops.div"));
}

#[test]
fn test_panicking_function_is_native_exception() {
    let handle = handle();
    handle
        .register_module(
            NativeModule::builder("fragile")
                .function("explode", |_| panic!("boom"))
                .build(),
        )
        .unwrap();

    let err = handle.invoke(&CallRequest::new("fragile", "explode")).unwrap_err();
    assert_eq!(err.to_string(), "Panic: boom");

    // Later calls still work.
    assert!(handle
        .invoke(&CallRequest::new("math_ops", "add").with_args(vec![1i64, 1]))
        .is_ok());
}

#[test]
fn test_keyword_arguments() {
    let mut kwargs = BTreeMap::new();
    kwargs.insert("start".to_string(), Value::Float(0.5));
    let result = handle()
        .call(
            "math_ops",
            "sum",
            vec![Value::from(vec![1i64, 2])],
            kwargs,
        )
        .unwrap();
    assert_eq!(result, Value::Float(3.5));
}
