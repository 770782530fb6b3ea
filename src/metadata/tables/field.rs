//! `Field` rows: fields owned by the types of an assembly.

use std::sync::Arc;

use crate::metadata::token::Token;

/// Reference to a `FieldDef`
pub type FieldDefRc = Arc<FieldDef>;

#[allow(non_snake_case)]
/// All possible flags for `FieldAttributes`
pub mod FieldAttributes {
    /// These 3 bits contain one of the access values
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEMBLY: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope field contract attributes
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
    /// Field is special
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// Field has RVA
    pub const HAS_FIELD_RVA: u32 = 0x0100;
    /// CLI provides 'special' behavior, depending upon the name of the field
    pub const RTSPECIAL_NAME: u32 = 0x0400;
    /// Field has default
    pub const HAS_DEFAULT: u32 = 0x8000;
}

/// A field defined in an assembly
#[derive(Debug)]
pub struct FieldDef {
    /// Token, assigned by the owning assembly when the row is populated
    pub token: Token,
    /// Field name
    pub name: String,
    /// a 2-byte bitmask of type `FieldAttributes`
    pub flags: u32,
}

impl FieldDef {
    /// Create a new field
    pub fn new(name: impl Into<String>, flags: u32) -> Self {
        FieldDef {
            token: Token::new(0),
            name: name.into(),
            flags,
        }
    }

    /// Whether this field is defined on the type rather than per instance
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }

    /// Whether this field is a compile time constant
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.flags & FieldAttributes::LITERAL != 0
    }

    /// The access bits of this field
    #[must_use]
    pub fn access(&self) -> u32 {
        self.flags & FieldAttributes::FIELD_ACCESS_MASK
    }
}
