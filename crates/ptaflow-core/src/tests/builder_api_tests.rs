use crate::builder::ModuleBuilder;
use crate::instructions::{InstKind, OpcodeClass};
use crate::types::Type;
use crate::values::{InstId, Value};
use crate::IrError;

#[test]
fn test_builder_numbers_instructions_in_order() {
    let mut builder = ModuleBuilder::new("numbering");
    let mut f = builder.function("main", Type::Void);
    let p = f.alloca("p", Type::Int(32));
    let one = f.const_int(1, Type::Int(32));
    f.store(one, p);
    let r = f.load("r", p);
    f.ret(None);
    let function = f.build().unwrap();

    assert_eq!(p, Value::Inst(InstId(0)));
    assert_eq!(r, Value::Inst(InstId(2)));
    let classes: Vec<_> = function.instructions.iter().map(|i| i.class()).collect();
    assert_eq!(
        classes,
        vec![
            OpcodeClass::Allocation,
            OpcodeClass::Store,
            OpcodeClass::Load,
            OpcodeClass::Other
        ]
    );
    assert!(builder.module().get_function("main").is_some());
}

#[test]
fn test_load_infers_pointee_type() {
    let mut builder = ModuleBuilder::new("types");
    let mut f = builder.function("main", Type::Void);
    let q = f.alloca("q", Type::ptr_to(Type::Int(8)));
    let r = f.load("r", q);

    let function = f.current_function();
    assert_eq!(function.type_of(r), Some(Type::ptr_to(Type::Int(8))));
    assert_eq!(function.type_of(q).map(|t| t.pointer_depth()), Some(2));
}

#[test]
fn test_load_from_non_pointer_is_rejected() {
    let mut builder = ModuleBuilder::new("bad");
    let mut f = builder.function("main", Type::Void);
    let n = f.param("n", Type::Int(32));
    f.load("r", n);

    match f.build() {
        Err(IrError::BuilderError(message)) => {
            assert!(message.contains("load from non-pointer"));
            assert!(message.contains("@main"));
        }
        other => panic!("expected builder error, got {:?}", other.map(|f| f.name)),
    }
    assert!(builder.module().get_function("main").is_none());
}

#[test]
fn test_foreign_operand_is_rejected() {
    let mut builder = ModuleBuilder::new("bad");
    let mut f = builder.function("main", Type::Void);
    f.alloca("p", Type::Int(32));
    f.store(Value::Inst(InstId(7)), Value::Inst(InstId(0)));

    assert!(matches!(f.build(), Err(IrError::BuilderError(_))));
}

#[test]
fn test_calls_and_generic_ops_keep_operands() {
    let mut builder = ModuleBuilder::new("ops");
    builder.declare("sink", Type::Void, vec![Type::ptr_to(Type::Int(32))]);
    let mut f = builder.function("main", Type::Int(32));
    let p = f.alloca("p", Type::Int(32));
    let call = f.call(None, "sink", Type::Void, vec![p]);
    let one = f.const_int(1, Type::Int(32));
    let sum = f.op(Some("sum"), "add", Type::Int(32), vec![one, one]);
    f.ret(Some(sum));
    let function = f.build().unwrap();

    let call_inst = function.inst(call.as_inst().unwrap()).unwrap();
    assert_eq!(call_inst.callee(), Some("sink"));
    assert_eq!(call_inst.operands(), vec![p]);
    assert_eq!(function.users(p), vec![call_inst.id]);
    match &function.instructions.last().unwrap().kind {
        InstKind::Other { opcode, ty, operands } => {
            assert_eq!(opcode, "ret");
            assert_eq!(ty, &Type::Int(32));
            assert_eq!(operands, &vec![sum]);
        }
        other => panic!("expected ret, got {:?}", other),
    }
}

#[test]
fn test_declarations_are_bodyless() {
    let mut builder = ModuleBuilder::new("decls");
    builder.declare("puts", Type::Int(32), vec![Type::ptr_to(Type::Int(8))]);
    let module = builder.build();

    let puts = module.get_function("puts").unwrap();
    assert!(puts.is_declaration);
    assert!(puts.instructions.is_empty());
    assert_eq!(puts.params[0].name, "arg0");
    assert_eq!(module.definitions().count(), 0);
}
