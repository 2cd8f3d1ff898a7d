use crate::{
    function::Function,
    instructions::InstKind,
    module::Module,
    types::Type,
    values::{Constant, Value},
    IrError, Result,
};

pub struct FunctionBuilder<'a> {
    function: Function,
    module: &'a mut Module,
    errors: Vec<String>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(name: &str, ret: Type, module: &'a mut Module) -> Self {
        Self {
            function: Function::new(name, ret),
            module,
            errors: Vec::new(),
        }
    }

    pub fn param(&mut self, name: &str, ty: Type) -> Value {
        self.function.add_param(name, ty)
    }

    pub fn const_int(&mut self, value: i64, ty: Type) -> Value {
        self.function.intern_constant(Constant::Int(value), ty)
    }

    pub fn null(&mut self, ty: Type) -> Value {
        self.function.intern_constant(Constant::Null, ty)
    }

    pub fn alloca(&mut self, name: &str, allocated: Type) -> Value {
        let id = self
            .function
            .push(InstKind::Alloca { allocated }, Some(name.to_string()));
        Value::Inst(id)
    }

    /// Loads through `ptr`; the result type is the pointer's pointee.
    pub fn load(&mut self, name: &str, ptr: Value) -> Value {
        self.check_operand(ptr);
        let ty = match self.function.type_of(ptr) {
            Some(Type::Ptr(pointee)) => *pointee,
            Some(other) => {
                self.errors
                    .push(format!("load from non-pointer {} of type {}", ptr, other));
                Type::Void
            }
            None => Type::Void,
        };
        let id = self
            .function
            .push(InstKind::Load { ty, ptr }, Some(name.to_string()));
        Value::Inst(id)
    }

    pub fn store(&mut self, value: Value, ptr: Value) -> &mut Self {
        self.check_operand(value);
        self.check_operand(ptr);
        if let Some(ty) = self.function.type_of(ptr) {
            if !ty.is_pointer() {
                self.errors
                    .push(format!("store through non-pointer {} of type {}", ptr, ty));
            }
        }
        self.function.push(InstKind::Store { value, ptr }, None);
        self
    }

    pub fn call(&mut self, name: Option<&str>, callee: &str, ret: Type, args: Vec<Value>) -> Value {
        for arg in &args {
            self.check_operand(*arg);
        }
        let id = self.function.push(
            InstKind::Call {
                callee: callee.to_string(),
                ret,
                args,
            },
            name.map(str::to_string),
        );
        Value::Inst(id)
    }

    pub fn op(&mut self, name: Option<&str>, opcode: &str, ty: Type, operands: Vec<Value>) -> Value {
        for operand in &operands {
            self.check_operand(*operand);
        }
        let id = self.function.push(
            InstKind::Other {
                opcode: opcode.to_string(),
                ty,
                operands,
            },
            name.map(str::to_string),
        );
        Value::Inst(id)
    }

    pub fn ret(&mut self, value: Option<Value>) -> &mut Self {
        let ty = match value {
            Some(v) => {
                self.check_operand(v);
                self.function.type_of(v).unwrap_or(Type::Void)
            }
            None => Type::Void,
        };
        self.function.push(
            InstKind::Other {
                opcode: "ret".to_string(),
                ty,
                operands: value.into_iter().collect(),
            },
            None,
        );
        self
    }

    pub fn current_function(&self) -> &Function {
        &self.function
    }

    pub fn build(self) -> Result<Function> {
        if !self.errors.is_empty() {
            return Err(IrError::BuilderError(format!(
                "function @{}: {}",
                self.function.name,
                self.errors.join("; ")
            )));
        }
        self.module.add_function(self.function.clone());
        Ok(self.function)
    }

    fn check_operand(&mut self, value: Value) {
        if !self.function.contains(value) {
            self.errors
                .push(format!("operand {} is not defined in this function", value));
        }
    }
}
