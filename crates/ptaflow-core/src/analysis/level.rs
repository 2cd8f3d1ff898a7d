use crate::{instructions::Instruction, types::Type};

/// Indirection level of a pointer type, never below 1.
pub fn pointer_level(ty: &Type) -> usize {
    ty.pointer_depth().max(1)
}

/// Level of an allocation: the pointer depth of the address it yields, so `alloca i32` is 1 and
/// `alloca i32*` is 2. Returns `None` for anything that is not an allocation.
pub fn classify(inst: &Instruction) -> Option<usize> {
    if inst.is_allocation() {
        Some(pointer_level(&inst.result_type()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::InstKind;
    use crate::values::{InstId, Value};

    fn alloca(allocated: Type) -> Instruction {
        Instruction::new(InstId(0), InstKind::Alloca { allocated })
    }

    #[test]
    fn test_levels_follow_nesting() {
        assert_eq!(classify(&alloca(Type::Int(32))), Some(1));
        assert_eq!(classify(&alloca(Type::ptr_to(Type::Int(32)))), Some(2));
        assert_eq!(
            classify(&alloca(Type::ptr_to(Type::ptr_to(Type::Int(8))))),
            Some(3)
        );
    }

    #[test]
    fn test_aggregates_count_as_one_level() {
        assert_eq!(
            classify(&alloca(Type::array_of(Type::ptr_to(Type::Int(8)), 4))),
            Some(1)
        );
        assert_eq!(classify(&alloca(Type::Struct(vec![]))), Some(1));
    }

    #[test]
    fn test_non_allocations_have_no_level() {
        let load = Instruction::new(
            InstId(1),
            InstKind::Load {
                ty: Type::Int(32),
                ptr: Value::Inst(InstId(0)),
            },
        );
        assert_eq!(classify(&load), None);
        assert_eq!(pointer_level(&Type::Int(32)), 1);
    }
}
