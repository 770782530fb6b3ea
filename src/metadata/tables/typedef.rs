//! `TypeDef` rows: types owned by an assembly.
//!
//! A type refers to its members by index range into the assembly's flat method and field
//! tables, the same layout the binary metadata format uses. Nested types carry the index
//! of their enclosing type; the reverse links are filled in when the assembly is published.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::metadata::token::Token;

/// A vector that holds a list of `TypeDef`
pub type TypeDefList = Arc<boxcar::Vec<TypeDefRc>>;
/// Reference to a `TypeDef`
pub type TypeDefRc = Arc<TypeDef>;

#[allow(non_snake_case)]
/// All possible flags for `TypeAttributes`
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Initialize the class before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}

/// A type defined in an assembly
pub struct TypeDef {
    /// Token, assigned by the owning assembly when the row is populated
    pub token: Token,
    /// `TypeNamespace` (can be empty, e.g. for the artificial `<Module>` type or nested types)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// a 4-byte bitmask of type `TypeAttributes`
    pub flags: u32,
    /// Index range of the methods this type owns
    pub methods: Range<u32>,
    /// Index range of the fields this type owns
    pub fields: Range<u32>,
    /// Index of the enclosing type, for nested types
    pub enclosing: Option<u32>,
    /// Types nested in this one, linked when the assembly is published
    pub(crate) nested_types: TypeDefList,
}

impl TypeDef {
    /// Create a new type without members
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, flags: u32) -> Self {
        TypeDef {
            token: Token::new(0),
            namespace: namespace.into(),
            name: name.into(),
            flags,
            methods: 0..0,
            fields: 0..0,
            enclosing: None,
            nested_types: Arc::new(boxcar::Vec::new()),
        }
    }

    /// Set the index range of owned methods
    #[must_use]
    pub fn with_methods(mut self, methods: Range<u32>) -> Self {
        self.methods = methods;
        self
    }

    /// Set the index range of owned fields
    #[must_use]
    pub fn with_fields(mut self, fields: Range<u32>) -> Self {
        self.fields = fields;
        self
    }

    /// Mark this type as nested in the type at `enclosing`
    #[must_use]
    pub fn nested_in(mut self, enclosing: u32) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Whether this type is nested in another type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Whether this type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// Whether this type is visible outside its assembly
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(
            self.flags & TypeAttributes::VISIBILITY_MASK,
            TypeAttributes::PUBLIC | TypeAttributes::NESTED_PUBLIC
        )
    }

    /// Types directly nested in this one, in table order
    pub fn nested_types(&self) -> impl Iterator<Item = &TypeDefRc> + '_ {
        self.nested_types.iter().map(|(_, nested)| nested)
    }

    /// Look up a directly nested type by name
    #[must_use]
    pub fn nested_type(&self, name: &str) -> Option<TypeDefRc> {
        self.nested_types
            .iter()
            .find(|(_, nested)| nested.name == name)
            .map(|(_, nested)| nested.clone())
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("token", &self.token)
            .field("name", &self.fullname())
            .field("flags", &format_args!("0x{:08x}", self.flags))
            .field("methods", &self.methods)
            .field("fields", &self.fields)
            .field("enclosing", &self.enclosing)
            .field("nested_types", &self.nested_types.count())
            .finish()
    }
}

/// Join a namespace and a name the way the runtime displays them
pub(crate) fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}
