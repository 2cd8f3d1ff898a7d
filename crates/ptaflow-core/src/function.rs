use crate::instructions::{InstKind, Instruction};
use crate::types::Type;
use crate::values::{ConstId, Constant, InstId, ParamId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: Type,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<ConstantData>,
    pub is_declaration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantData {
    pub value: Constant,
    pub ty: Type,
}

impl Function {
    pub fn new(name: impl Into<String>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret,
            instructions: Vec::new(),
            constants: Vec::new(),
            is_declaration: false,
        }
    }

    pub fn declaration(name: impl Into<String>, ret: Type, params: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            instructions: Vec::new(),
            constants: Vec::new(),
            is_declaration: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: Type) -> Value {
        let id = ParamId(self.params.len() as u32);
        self.params.push(Parameter::new(name, ty));
        Value::Param(id)
    }

    /// Appends an instruction and returns its handle. Handles are dense and follow program order.
    pub fn push(&mut self, kind: InstKind, name: Option<String>) -> InstId {
        let id = InstId(self.instructions.len() as u32);
        self.instructions.push(Instruction { id, name, kind });
        id
    }

    /// Returns the existing handle when an identical constant was interned before.
    pub fn intern_constant(&mut self, value: Constant, ty: Type) -> Value {
        let data = ConstantData { value, ty };
        if let Some(pos) = self.constants.iter().position(|c| *c == data) {
            return Value::Const(ConstId(pos as u32));
        }
        self.constants.push(data);
        Value::Const(ConstId(self.constants.len() as u32 - 1))
    }

    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.instructions.get(id.index())
    }

    pub fn constant(&self, id: ConstId) -> Option<&ConstantData> {
        self.constants.get(id.0 as usize)
    }

    pub fn param(&self, id: ParamId) -> Option<&Parameter> {
        self.params.get(id.0 as usize)
    }

    /// Instruction producing `value`, if it is an instruction result of this function.
    pub fn defining_inst(&self, value: Value) -> Option<&Instruction> {
        value.as_inst().and_then(|id| self.inst(id))
    }

    pub fn allocations(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|inst| inst.is_allocation())
    }

    pub fn contains(&self, value: Value) -> bool {
        match value {
            Value::Inst(id) => self.inst(id).is_some(),
            Value::Param(id) => self.param(id).is_some(),
            Value::Const(id) => self.constant(id).is_some(),
        }
    }

    pub fn type_of(&self, value: Value) -> Option<Type> {
        match value {
            Value::Inst(id) => self.inst(id).map(|inst| inst.result_type()),
            Value::Param(id) => self.param(id).map(|p| p.param_type.clone()),
            Value::Const(id) => self.constant(id).map(|c| c.ty.clone()),
        }
    }

    /// Instructions that take `value` as an operand, in program order.
    pub fn users(&self, value: Value) -> Vec<InstId> {
        self.instructions
            .iter()
            .filter(|inst| inst.operands().contains(&value))
            .map(|inst| inst.id)
            .collect()
    }

    pub fn user_map(&self) -> UserMap {
        UserMap::build(self)
    }

    /// Printable name of a value: `%name` for named results and params, the literal for constants.
    pub fn value_name(&self, value: Value) -> String {
        match value {
            Value::Inst(id) => match self.inst(id).and_then(|inst| inst.name.as_deref()) {
                Some(name) => format!("%{}", name),
                None => format!("%{}", id.0),
            },
            Value::Param(id) => match self.param(id) {
                Some(param) => format!("%{}", param.name),
                None => format!("%{}", id),
            },
            Value::Const(id) => match self.constant(id) {
                Some(data) => data.value.to_string(),
                None => id.to_string(),
            },
        }
    }

    /// Looks up a named instruction result or parameter.
    pub fn find_value(&self, name: &str) -> Option<Value> {
        let name = name.strip_prefix('%').unwrap_or(name);
        self.instructions
            .iter()
            .find(|inst| inst.name.as_deref() == Some(name))
            .map(|inst| Value::Inst(inst.id))
            .or_else(|| {
                self.params
                    .iter()
                    .position(|p| p.name == name)
                    .map(|pos| Value::Param(ParamId(pos as u32)))
            })
    }
}

/// Consumer lists for every value of a function, computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct UserMap {
    users: IndexMap<Value, Vec<InstId>>,
}

impl UserMap {
    pub fn build(function: &Function) -> Self {
        let mut users: IndexMap<Value, Vec<InstId>> = IndexMap::new();
        for inst in &function.instructions {
            for operand in inst.operands() {
                let entry = users.entry(operand).or_default();
                if entry.last() != Some(&inst.id) {
                    entry.push(inst.id);
                }
            }
        }
        Self { users }
    }

    pub fn users(&self, value: Value) -> &[InstId] {
        self.users.get(&value).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
