//! `MethodDef` rows: methods owned by the types of an assembly.

use std::sync::Arc;

use bitflags::bitflags;

use crate::metadata::token::Token;

/// Reference to a `MethodDef`
pub type MethodDefRc = Arc<MethodDef>;

/// Mask for the member access bits of the method flags
pub const METHOD_ACCESS_MASK: u32 = 0x0007;
/// Mask for the vtable layout bits of the method flags
pub const METHOD_VTABLE_LAYOUT_MASK: u32 = 0x0100;

bitflags! {
    #[derive(PartialEq, Debug, Clone, Copy)]
    /// Method member access
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract the access bits from raw method flags
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & METHOD_ACCESS_MASK)
    }
}

bitflags! {
    #[derive(PartialEq, Debug, Clone, Copy)]
    /// Method contract and implementation modifiers
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method may not be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Runtime should check name encoding
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
    }
}

impl MethodModifiers {
    /// Extract the modifier bits from raw method flags
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & !METHOD_ACCESS_MASK & !METHOD_VTABLE_LAYOUT_MASK)
    }
}

/// A method defined in an assembly
#[derive(Debug)]
pub struct MethodDef {
    /// Token, assigned by the owning assembly when the row is populated
    pub token: Token,
    /// Method name
    pub name: String,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: u32,
}

impl MethodDef {
    /// Create a new method
    pub fn new(name: impl Into<String>, flags: u32) -> Self {
        MethodDef {
            token: Token::new(0),
            name: name.into(),
            flags,
        }
    }

    /// Member access of this method
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags)
    }

    /// Contract and implementation modifiers of this method
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }

    /// Whether this method is defined on the type rather than per instance
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Whether this is a constructor (`.ctor` / `.cctor`)
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.modifiers().contains(MethodModifiers::RTSPECIAL_NAME)
            && (self.name == ".ctor" || self.name == ".cctor")
    }
}
