//! Metadata tokens and table identifiers.
//!
//! Every slot of an [`crate::Assembly`] table is addressed by a metadata token. The upper
//! 8 bits carry the [`TableId`], the lower 24 bits carry the 1-based row. The container's
//! API uses 0-based indices, [`Token::from_index`] performs the translation.
//!
//! # Examples
//!
//! ```rust
//! use assemblymeta::metadata::token::{TableId, Token};
//!
//! let token = Token::from_index(TableId::TypeDef, 0);
//! assert_eq!(token.value(), 0x0200_0001);
//! assert_eq!(token.table(), 0x02);
//! assert_eq!(token.index(), Some(0));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use strum::{Display, EnumCount, EnumIter};

/// Identifiers of the metadata tables held by an assembly.
///
/// The discriminants match the table numbers of the binary metadata format, so tokens
/// produced here are identical to the ones a loader reads from disk.
#[derive(Clone, Copy, PartialEq, Debug, Display, EnumIter, EnumCount, Eq, Hash)]
pub enum TableId {
    /// References to types defined in other assemblies or nested in referenced types
    TypeRef = 0x01,
    /// Types defined in this assembly
    TypeDef = 0x02,
    /// Fields defined in this assembly
    Field = 0x04,
    /// Methods defined in this assembly
    MethodDef = 0x06,
    /// Other assemblies this assembly depends on
    AssemblyRef = 0x23,
    /// Types this assembly forwards to one of its dependencies
    ExportedType = 0x27,
}

/// A metadata token, `table << 24 | row`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Largest row number a token can carry.
    pub const MAX_ROW: u32 = 0x00FF_FFFF;

    /// Create a new token from its raw value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create the token of the slot at the 0-based `index` of `table`
    ///
    /// `index` is expected to be below [`Token::MAX_ROW`]; table sizes are checked against
    /// that limit when an assembly is constructed.
    #[must_use]
    pub fn from_index(table: TableId, index: u32) -> Self {
        Token(((table as u32) << 24) | ((index + 1) & Self::MAX_ROW))
    }

    /// The raw value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table number (upper 8 bits)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The 1-based row (lower 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & Self::MAX_ROW
    }

    /// The 0-based table index, `None` for a null row
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.row().checked_sub(1)
    }

    /// Whether this is the null token
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
