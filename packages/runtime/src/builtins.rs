//! Modules every interpreter starts with: `math_ops` and `sys`.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::exception::Exception;
use crate::module::{Args, NativeModule};
use crate::object::Object;

/// A number pulled out of an argument list.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_arg(args: &Args, index: usize, function: &str) -> Result<Self, Exception> {
        let arg = args.get(index).ok_or_else(|| {
            Exception::type_error(format!("{}() missing argument {}", function, index + 1))
        })?;
        Self::from_object(arg, function)
    }

    fn from_object(obj: &Object, function: &str) -> Result<Self, Exception> {
        match obj {
            Object::Int(i) => Ok(Number::Int(*i)),
            Object::Bool(b) => Ok(Number::Int(*b as i64)),
            Object::Float(f) => Ok(Number::Float(*f)),
            other => Err(Exception::type_error(format!(
                "{}() expects a number, got '{}'",
                function,
                other.type_name()
            ))),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn into_object(self) -> Object {
        match self {
            Number::Int(i) => Object::Int(i),
            Number::Float(f) => Object::Float(f),
        }
    }
}

/// Apply an arithmetic operator: checked on two ints, float otherwise.
fn arith(
    a: Number,
    b: Number,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Number, Exception> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_op(x, y)
            .map(Number::Int)
            .ok_or_else(|| Exception::overflow(format!("integer {} overflowed", op))),
        _ => Ok(Number::Float(float_op(a.as_f64(), b.as_f64()))),
    }
}

fn binary(
    function: &'static str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> impl Fn(&Args) -> Result<Object, Exception> + Send + Sync + 'static {
    move |args| {
        args.expect_positional(function, 2)?;
        args.allow_keywords(function, &[])?;
        let a = Number::from_arg(args, 0, function)?;
        let b = Number::from_arg(args, 1, function)?;
        arith(a, b, function, int_op, float_op).map(Number::into_object)
    }
}

fn div(args: &Args) -> Result<Object, Exception> {
    args.expect_positional("div", 2)?;
    args.allow_keywords("div", &[])?;
    let a = Number::from_arg(args, 0, "div")?;
    let b = Number::from_arg(args, 1, "div")?;
    if b.as_f64() == 0.0 {
        return Err(Exception::zero_division("division by zero"));
    }
    Ok(Object::Float(a.as_f64() / b.as_f64()))
}

fn pow(args: &Args) -> Result<Object, Exception> {
    args.expect_positional("pow", 2)?;
    args.allow_keywords("pow", &[])?;
    let base = Number::from_arg(args, 0, "pow")?;
    let exp = Number::from_arg(args, 1, "pow")?;
    match (base, exp) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let e = u32::try_from(e)
                .map_err(|_| Exception::overflow("exponent too large"))?;
            b.checked_pow(e)
                .map(Object::Int)
                .ok_or_else(|| Exception::overflow("integer pow overflowed"))
        }
        _ => Ok(Object::Float(base.as_f64().powf(exp.as_f64()))),
    }
}

fn sqrt(args: &Args) -> Result<Object, Exception> {
    args.expect_positional("sqrt", 1)?;
    args.allow_keywords("sqrt", &[])?;
    let x = Number::from_arg(args, 0, "sqrt")?.as_f64();
    if x < 0.0 {
        return Err(Exception::value_error("math domain error"));
    }
    Ok(Object::Float(x.sqrt()))
}

fn sum(args: &Args) -> Result<Object, Exception> {
    args.expect_positional("sum", 1)?;
    args.allow_keywords("sum", &["start"])?;
    let start = match args.keyword("start") {
        Some(obj) => Number::from_object(obj, "sum")?,
        None => Number::Int(0),
    };

    let items = match args.get(0) {
        Some(Object::List(items)) => items.read_recursive().clone(),
        Some(other) => {
            return Err(Exception::type_error(format!(
                "sum() expects a list, got '{}'",
                other.type_name()
            )))
        }
        None => Vec::new(),
    };

    items
        .iter()
        .try_fold(start, |acc, item| {
            let n = Number::from_object(item, "sum")?;
            arith(acc, n, "sum", i64::checked_add, |x, y| x + y)
        })
        .map(Number::into_object)
}

/// The `math_ops` module.
pub fn math_ops() -> NativeModule {
    NativeModule::builder("math_ops")
        .function("add", binary("add", i64::checked_add, |x, y| x + y))
        .function("sub", binary("sub", i64::checked_sub, |x, y| x - y))
        .function("mul", binary("mul", i64::checked_mul, |x, y| x * y))
        .function("div", div)
        .function("pow", pow)
        .function("sqrt", sqrt)
        .function("sum", sum)
        .build()
}

/// Facts about the interpreter exposed through `sys`.
#[derive(Debug, Clone)]
pub struct SysInfo {
    pub instance: Uuid,
    pub search_paths: Vec<PathBuf>,
    pub working_dir: Option<PathBuf>,
    /// Names of registered native modules, kept current by the interpreter.
    pub modules: Arc<RwLock<Vec<String>>>,
}

/// The `sys` module.
pub fn sys(info: SysInfo) -> NativeModule {
    let instance = info.instance.to_string();
    let paths: Vec<String> = info
        .search_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let cwd = info.working_dir.map(|p| p.display().to_string());
    let modules = info.modules;

    NativeModule::builder("sys")
        .function("version", |args| {
            args.expect_positional("version", 0)?;
            Ok(Object::str(env!("CARGO_PKG_VERSION")))
        })
        .function("platform", |args| {
            args.expect_positional("platform", 0)?;
            Ok(Object::str(std::env::consts::OS))
        })
        .function("path", move |args| {
            args.expect_positional("path", 0)?;
            Ok(Object::list(paths.iter().map(Object::str).collect()))
        })
        .function("cwd", move |args| {
            args.expect_positional("cwd", 0)?;
            Ok(cwd.as_deref().map(Object::str).unwrap_or(Object::None))
        })
        .function("modules", move |args| {
            args.expect_positional("modules", 0)?;
            let names = modules.read();
            Ok(Object::list(names.iter().map(Object::str).collect()))
        })
        .function("instance", move |args| {
            args.expect_positional("instance", 0)?;
            Ok(Object::str(&instance))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionKind;
    use crate::module::Module;

    fn call(name: &str, args: Vec<Object>) -> Result<Object, Exception> {
        math_ops().call(name, Args::new(args, vec![]))
    }

    #[test]
    fn add_keeps_ints_and_promotes_mixed() {
        assert_eq!(
            call("add", vec![Object::Int(2), Object::Int(3)])
                .unwrap()
                .as_int(),
            Some(5)
        );
        let mixed = call("add", vec![Object::Int(2), Object::Float(0.5)]).unwrap();
        assert!(matches!(mixed, Object::Float(f) if f == 2.5));
    }

    #[test]
    fn int_overflow_raises() {
        let err = call("mul", vec![Object::Int(i64::MAX), Object::Int(2)]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Overflow);
    }

    #[test]
    fn div_by_zero_raises() {
        let err = call("div", vec![Object::Int(1), Object::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::ZeroDivision);
        let ok = call("div", vec![Object::Int(7), Object::Int(2)]).unwrap();
        assert!(matches!(ok, Object::Float(f) if f == 3.5));
    }

    #[test]
    fn pow_and_sqrt() {
        assert_eq!(
            call("pow", vec![Object::Int(2), Object::Int(10)])
                .unwrap()
                .as_int(),
            Some(1024)
        );
        let neg = call("pow", vec![Object::Int(2), Object::Int(-1)]).unwrap();
        assert!(matches!(neg, Object::Float(f) if f == 0.5));

        let err = call("sqrt", vec![Object::Int(-4)]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Value);
    }

    #[test]
    fn sum_with_start() {
        let list = Object::list(vec![Object::Int(1), Object::Int(2), Object::Int(3)]);
        let result = math_ops()
            .call(
                "sum",
                Args::new(vec![list], vec![("start".to_string(), Object::Int(10))]),
            )
            .unwrap();
        assert_eq!(result.as_int(), Some(16));
    }

    #[test]
    fn non_number_is_type_error() {
        let err = call("add", vec![Object::str("2"), Object::Int(3)]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Type);
        assert!(err.message.contains("'str'"));
    }

    #[test]
    fn sys_reports_instance_and_paths() {
        let id = Uuid::new_v4();
        let module = sys(SysInfo {
            instance: id,
            search_paths: vec![PathBuf::from("/opt/modules")],
            working_dir: None,
            modules: Arc::new(RwLock::new(vec!["math_ops".to_string()])),
        });

        let instance = module.call("instance", Args::default()).unwrap();
        assert_eq!(instance.as_str(), Some(id.to_string().as_str()));
        assert!(module.call("cwd", Args::default()).unwrap().is_none());

        match module.call("path", Args::default()).unwrap() {
            Object::List(items) => {
                let items = items.read();
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].as_str(), Some("/opt/modules"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }
}
