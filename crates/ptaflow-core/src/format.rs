use crate::{
    function::Function,
    instructions::{InstKind, Instruction},
    module::Module,
    values::Value,
};
use std::fmt::Write;

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();

    let _ = writeln!(&mut output, "; module: {}", module.name);
    let _ = writeln!(
        &mut output,
        "layout pointer_size={}",
        module.layout.pointer_size
    );

    for function in module.functions.values() {
        let _ = writeln!(&mut output);
        output.push_str(&format_function(function));
    }

    output
}

pub fn format_function(function: &Function) -> String {
    let mut output = format_signature(function);

    if function.is_declaration {
        output.push('\n');
        return output;
    }

    output.push_str(" {\n");
    for inst in &function.instructions {
        let _ = writeln!(&mut output, "  {}", format_instruction(function, inst));
    }
    output.push_str("}\n");

    output
}

/// `define <ret> @name(<params>)` or, for declarations, `declare <ret> @name(<types>)`.
pub fn format_signature(function: &Function) -> String {
    let mut output = String::new();

    let keyword = if function.is_declaration {
        "declare"
    } else {
        "define"
    };
    let _ = write!(&mut output, "{} {} @{}(", keyword, function.ret, function.name);
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            output.push_str(", ");
        }
        if function.is_declaration {
            let _ = write!(&mut output, "{}", param.param_type);
        } else {
            let _ = write!(&mut output, "{} %{}", param.param_type, param.name);
        }
    }
    output.push(')');
    output
}

pub fn format_instruction(function: &Function, inst: &Instruction) -> String {
    let mut output = String::new();

    let named_result = match &inst.kind {
        InstKind::Alloca { .. } | InstKind::Load { .. } => true,
        InstKind::Store { .. } => false,
        InstKind::Call { .. } | InstKind::Other { .. } => inst.name.is_some(),
    };
    if named_result {
        let _ = write!(
            &mut output,
            "{} = ",
            function.value_name(Value::Inst(inst.id))
        );
    }

    match &inst.kind {
        InstKind::Alloca { allocated } => {
            let _ = write!(&mut output, "alloca {}", allocated);
        }
        InstKind::Load { ty, ptr } => {
            let _ = write!(&mut output, "load {}, {}", ty, format_typed(function, *ptr));
        }
        InstKind::Store { value, ptr } => {
            let _ = write!(
                &mut output,
                "store {}, {}",
                format_typed(function, *value),
                format_typed(function, *ptr)
            );
        }
        InstKind::Call { callee, ret, args } => {
            let _ = write!(&mut output, "call {} @{}(", ret, callee);
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    output.push_str(", ");
                }
                output.push_str(&format_typed(function, *arg));
            }
            output.push(')');
        }
        InstKind::Other {
            opcode,
            ty,
            operands,
        } => {
            let _ = write!(&mut output, "{} {}", opcode, ty);
            for (i, operand) in operands.iter().enumerate() {
                output.push_str(if i == 0 { " " } else { ", " });
                output.push_str(&function.value_name(*operand));
            }
        }
    }

    output
}

/// `<type> <value>`, as operands of loads, stores and calls are written.
pub fn format_typed(function: &Function, value: Value) -> String {
    match function.type_of(value) {
        Some(ty) => format!("{} {}", ty, function.value_name(value)),
        None => function.value_name(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;
    use crate::values::Constant;

    #[test]
    fn test_format_function() {
        let mut function = Function::new("main", Type::Int(32));
        let p = function.push(
            InstKind::Alloca {
                allocated: Type::Int(32),
            },
            Some("p".to_string()),
        );
        let five = function.intern_constant(Constant::Int(5), Type::Int(32));
        function.push(
            InstKind::Store {
                value: five,
                ptr: Value::Inst(p),
            },
            None,
        );
        let r = function.push(
            InstKind::Load {
                ty: Type::Int(32),
                ptr: Value::Inst(p),
            },
            None,
        );
        function.push(
            InstKind::Other {
                opcode: "ret".to_string(),
                ty: Type::Int(32),
                operands: vec![Value::Inst(r)],
            },
            None,
        );

        let text = format_function(&function);
        assert_eq!(
            text,
            "define i32 @main() {\n  %p = alloca i32\n  store i32 5, i32* %p\n  %2 = load i32, i32* %p\n  ret i32 %2\n}\n"
        );
    }
}
