use std::sync::Arc;

use anyhow::Result;

use specforge::cache::CodeCache;
use specforge::codegen::{BinaryOp, CodegenError, Kernel};
use specforge::params::{EnumDescriptor, ParamDescriptor, RawValue};
use specforge::runtime::{ExecError, ExecutionAdapter, Slot, Value};
use specforge::specialize::{
    CodeVersion, OpDefinition, OpSpecializer, Signature, SpecializeError, ValueType,
};
use specforge::toolchain::PortableToolchain;

/// Scalar arithmetic switched over an enumerated operator, the canonical
/// enum-parametrized op: `ADD, SUB, MULTIPLY, DIVIDE` mapped to `0..4`.
struct ScalarArith {
    params: EnumDescriptor,
    version: u32,
}

impl ScalarArith {
    fn new() -> Self {
        Self::with_params(
            EnumDescriptor::sequence(["ADD", "SUB", "MULTIPLY", "DIVIDE"]).expect("descriptor"),
        )
    }

    fn with_params(params: EnumDescriptor) -> Self {
        Self { params, version: 1 }
    }
}

impl OpDefinition for ScalarArith {
    fn kind(&self) -> &str {
        "scalar_arith"
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![ValueType::I64, ValueType::I64], vec![ValueType::I64])
    }

    fn params(&self) -> ParamDescriptor {
        ParamDescriptor::Enum(self.params.clone())
    }

    fn code_version(&self) -> CodeVersion {
        CodeVersion::from(self.version)
    }

    fn kernel(&self, case: Option<&str>) -> Result<Kernel, CodegenError> {
        let op = match case {
            Some("ADD") => BinaryOp::Add,
            Some("SUB") => BinaryOp::Sub,
            Some("MULTIPLY") => BinaryOp::Mul,
            Some("DIVIDE") => BinaryOp::Div,
            Some(other) => {
                return Err(CodegenError::MissingKernel {
                    case: other.to_string(),
                });
            }
            None => return Err(CodegenError::MissingBody),
        };
        Ok(Kernel::Binary { op, lhs: 0, rhs: 1 })
    }
}

fn setup() -> (Arc<CodeCache>, OpSpecializer, ExecutionAdapter) {
    let cache = Arc::new(CodeCache::new());
    let specializer = OpSpecializer::new(Arc::clone(&cache), Arc::new(PortableToolchain::new()));
    (cache, specializer, ExecutionAdapter::new())
}

fn run(
    adapter: &ExecutionAdapter,
    artifact: &specforge::cache::CompiledArtifact,
    selector: i64,
    a: i64,
    b: i64,
) -> Result<i64, ExecError> {
    let mut outs = [Slot::new()];
    adapter.invoke(
        artifact,
        Some(selector),
        &[Value::I64(a), Value::I64(b)],
        &mut outs,
    )?;
    match outs[0].value() {
        Some(Value::I64(result)) => Ok(*result),
        other => panic!("expected an i64 result, found {other:?}"),
    }
}

#[test]
fn dispatch_matches_reference_arithmetic() -> Result<()> {
    let (_, specializer, adapter) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;

    let results = (0..4)
        .map(|selector| run(&adapter, &artifact, selector, 12, 15))
        .collect::<Result<Vec<_>, _>>()?;

    // integer division truncates: 12 / 15 == 0
    assert_eq!(results, [27, -3, 180, 0]);
    Ok(())
}

#[test]
fn one_compilation_serves_every_case() -> Result<()> {
    let (cache, specializer, adapter) = setup();
    let op = ScalarArith::new();

    for selector in 0..4 {
        let artifact = specializer.specialize(&op)?;
        run(&adapter, &artifact, selector, 12, 15)?;
    }

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.total_artifacts, 1);
    Ok(())
}

#[test]
fn unknown_selector_fails_without_corrupting_cache() -> Result<()> {
    let (cache, specializer, adapter) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;

    let err = run(&adapter, &artifact, 42, 12, 15).expect_err("selector outside the domain");
    assert!(matches!(
        err,
        ExecError::UnknownParamValue { value: 42, ref op } if op == "scalar_arith"
    ));

    // the cached artifact is untouched and still dispatches
    assert_eq!(cache.len(), 1);
    assert_eq!(run(&adapter, &artifact, 0, 12, 15)?, 27);
    Ok(())
}

#[test]
fn missing_selector_is_rejected() -> Result<()> {
    let (_, specializer, adapter) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;

    let mut outs = [Slot::new()];
    let err = adapter
        .invoke(&artifact, None, &[Value::I64(1), Value::I64(2)], &mut outs)
        .expect_err("dispatch artifact needs a selector");
    assert!(matches!(err, ExecError::MissingSelector { .. }));
    Ok(())
}

#[test]
fn buffer_mismatches_fail_before_dispatch() -> Result<()> {
    let (_, specializer, adapter) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;
    let mut outs = [Slot::new()];

    let err = adapter
        .invoke(&artifact, Some(0), &[Value::I64(1)], &mut outs)
        .expect_err("arity mismatch");
    assert!(matches!(err, ExecError::SignatureMismatch { .. }));

    let err = adapter
        .invoke(
            &artifact,
            Some(0),
            &[Value::I64(1), Value::F64(2.0)],
            &mut outs,
        )
        .expect_err("type mismatch");
    assert!(matches!(err, ExecError::SignatureMismatch { .. }));

    let err = adapter
        .invoke(
            &artifact,
            Some(0),
            &[Value::I64(1), Value::I64(2)],
            &mut [],
        )
        .expect_err("missing output slot");
    assert!(matches!(err, ExecError::SignatureMismatch { .. }));
    Ok(())
}

#[test]
fn division_by_zero_is_reported() -> Result<()> {
    let (_, specializer, adapter) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;

    let err = run(&adapter, &artifact, 3, 12, 0).expect_err("divide by zero");
    assert!(matches!(err, ExecError::DivisionByZero { .. }));
    Ok(())
}

#[test]
fn rendered_source_lists_each_case() -> Result<()> {
    let (_, specializer, _) = setup();
    let artifact = specializer.specialize(&ScalarArith::new())?;
    let source = artifact.source();

    for define in ["#define ADD 0", "#define SUB 1", "#define MULTIPLY 2", "#define DIVIDE 3"] {
        assert!(source.contains(define), "missing `{define}` in:\n{source}");
    }
    for case in ["case ADD:", "case SUB:", "case MULTIPLY:", "case DIVIDE:"] {
        assert!(source.contains(case), "missing `{case}` in:\n{source}");
    }
    assert!(source.contains("default:"));
    assert!(source.contains("SPECFORGE_UNKNOWN_PARAM"));
    Ok(())
}

#[test]
fn numerically_equal_descriptors_share_one_entry() -> Result<()> {
    let (cache, specializer, _) = setup();

    let canonical = ScalarArith::new();
    let coerced = ScalarArith::with_params(
        EnumDescriptor::new([
            ("ADD", RawValue::Bool(false)),
            ("SUB", RawValue::Bool(true)),
            ("MULTIPLY", RawValue::Real(2.0)),
            ("DIVIDE", RawValue::Int(3)),
        ])
        .expect("descriptor"),
    );

    let first = specializer.specialize(&canonical)?;
    let second = specializer.specialize(&coerced)?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats().misses, 1);
    Ok(())
}

#[test]
fn duplicate_case_values_fail_compilation() {
    let (cache, specializer, _) = setup();
    let op = ScalarArith::with_params(
        EnumDescriptor::new([("ADD", 0i64), ("SUB", 0i64)]).expect("descriptor"),
    );

    let err = specializer.specialize(&op).expect_err("duplicate case labels");
    assert!(matches!(err, SpecializeError::Compilation { .. }));
    assert_eq!(cache.len(), 0);
}

#[test]
fn new_code_version_supersedes_without_evicting() -> Result<()> {
    let (cache, specializer, adapter) = setup();

    let mut op = ScalarArith::new();
    let old = specializer.specialize(&op)?;

    op.version = 2;
    let new = specializer.specialize(&op)?;

    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(cache.len(), 2);
    assert_eq!(run(&adapter, &new, 2, 12, 15)?, 180);
    Ok(())
}
