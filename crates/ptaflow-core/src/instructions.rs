use crate::types::Type;
use crate::values::{InstId, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub name: Option<String>,
    pub kind: InstKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstKind {
    Alloca {
        allocated: Type,
    },
    Load {
        ty: Type,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Call {
        callee: String,
        ret: Type,
        args: Vec<Value>,
    },
    Other {
        opcode: String,
        ty: Type,
        operands: Vec<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpcodeClass {
    Allocation,
    Load,
    Store,
    Call,
    Other,
}

impl Instruction {
    pub fn new(id: InstId, kind: InstKind) -> Self {
        Self {
            id,
            name: None,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class(&self) -> OpcodeClass {
        match &self.kind {
            InstKind::Alloca { .. } => OpcodeClass::Allocation,
            InstKind::Load { .. } => OpcodeClass::Load,
            InstKind::Store { .. } => OpcodeClass::Store,
            InstKind::Call { .. } => OpcodeClass::Call,
            InstKind::Other { .. } => OpcodeClass::Other,
        }
    }

    pub fn opcode(&self) -> &str {
        match &self.kind {
            InstKind::Alloca { .. } => "alloca",
            InstKind::Load { .. } => "load",
            InstKind::Store { .. } => "store",
            InstKind::Call { .. } => "call",
            InstKind::Other { opcode, .. } => opcode,
        }
    }

    pub fn is_allocation(&self) -> bool {
        matches!(self.kind, InstKind::Alloca { .. })
    }

    pub fn result_type(&self) -> Type {
        match &self.kind {
            InstKind::Alloca { allocated } => Type::ptr_to(allocated.clone()),
            InstKind::Load { ty, .. } => ty.clone(),
            InstKind::Store { .. } => Type::Void,
            InstKind::Call { ret, .. } => ret.clone(),
            InstKind::Other { ty, .. } => ty.clone(),
        }
    }

    pub fn has_result(&self) -> bool {
        !self.result_type().is_void()
    }

    pub fn operands(&self) -> Vec<Value> {
        match &self.kind {
            InstKind::Alloca { .. } => Vec::new(),
            InstKind::Load { ptr, .. } => vec![*ptr],
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Other { operands, .. } => operands.clone(),
        }
    }

    /// Address operand of a load or store.
    pub fn pointer_operand(&self) -> Option<Value> {
        match &self.kind {
            InstKind::Load { ptr, .. } | InstKind::Store { ptr, .. } => Some(*ptr),
            _ => None,
        }
    }

    /// Stored operand of a store.
    pub fn value_operand(&self) -> Option<Value> {
        match &self.kind {
            InstKind::Store { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn callee(&self) -> Option<&str> {
        match &self.kind {
            InstKind::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }
}
