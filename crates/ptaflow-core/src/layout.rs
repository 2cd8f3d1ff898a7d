use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Storage size and alignment rules for the target the module was lowered for. Sizes saturate
/// at `u64::MAX` rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    pub pointer_size: u64,
    pub pointer_align: u64,
}

impl DataLayout {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            pointer_size,
            pointer_align: pointer_size,
        }
    }

    pub fn type_store_size(&self, ty: &Type) -> u64 {
        match ty {
            Type::Void => 0,
            Type::Int(bits) | Type::Float(bits) => (*bits as u64).div_ceil(8),
            Type::Ptr(_) => self.pointer_size,
            Type::Array(elem, len) => self.type_alloc_size(elem).saturating_mul(*len),
            Type::Struct(fields) => {
                let mut offset = 0;
                for field in fields {
                    offset = align_to(offset, self.abi_align(field))
                        .saturating_add(self.type_alloc_size(field));
                }
                offset
            }
        }
    }

    /// Size in bytes an allocation of `ty` occupies, including tail padding.
    pub fn type_alloc_size(&self, ty: &Type) -> u64 {
        align_to(self.type_store_size(ty), self.abi_align(ty))
    }

    pub fn abi_align(&self, ty: &Type) -> u64 {
        match ty {
            Type::Void => 1,
            Type::Int(bits) | Type::Float(bits) => {
                let bytes = (*bits as u64).div_ceil(8).max(1);
                bytes.next_power_of_two().min(16)
            }
            Type::Ptr(_) => self.pointer_align,
            Type::Array(elem, _) => self.abi_align(elem),
            Type::Struct(fields) => fields
                .iter()
                .map(|field| self.abi_align(field))
                .max()
                .unwrap_or(1),
        }
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(8)
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    if align <= 1 {
        offset
    } else {
        offset.div_ceil(align).saturating_mul(align)
    }
}
