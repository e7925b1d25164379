use std::sync::Arc;

use embedlink::{BridgeConfig, RuntimeHandle};
use embedlink_repl::io::{ExitReason, OutputStyle, TestHost};
use embedlink_repl::repl::ReplCore;

const SCALE: &str = r#"
    (module
      (func (export "double") (param i64) (result i64)
        local.get 0
        i64.const 2
        i64.mul))
"#;

#[test]
fn test_repl_calls_modules_on_search_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scale.wat"), SCALE).unwrap();

    let handle = Arc::new(RuntimeHandle::new(
        BridgeConfig::default()
            .with_env(false)
            .with_search_path(dir.path()),
    ));
    let mut host = TestHost::with_inputs([
        "n = scale.double(21)",
        "n",
        "scale.double('x')",
        "exit",
    ]);

    let reason = ReplCore::new(handle.clone()).run(&mut host).unwrap();
    assert_eq!(reason, ExitReason::UserExit);
    assert_eq!(host.texts(OutputStyle::Normal), vec!["42"]);

    let errors = host.texts(OutputStyle::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("TypeError:"), "{}", errors[0]);

    handle.shutdown();
}

#[test]
fn test_repl_reports_failed_startup() {
    let handle = Arc::new(RuntimeHandle::new(
        BridgeConfig::default()
            .with_env(false)
            .with_package("does_not_exist"),
    ));
    let mut host = TestHost::with_inputs(["math_ops.add(1, 2)", "exit"]);

    ReplCore::new(handle).run(&mut host).unwrap();

    let errors = host.texts(OutputStyle::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.starts_with("RuntimeUnavailable:")));
    assert_eq!(host.last_prompt().unwrap().runtime_state, "failed");
}
