//! Configuration for the checks performed when an assembly is published.
//!
//! Assembly dependency acyclicity is enforced regardless of configuration; everything
//! else can be tuned for the trust placed in the loader.

/// Publication checks and resolution limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationConfig {
    /// Require every reserved table slot to be populated before publication
    pub require_complete_tables: bool,

    /// Require every method and field to be owned by exactly one type
    ///
    /// Out of range and overlapping member ranges are always rejected, this only adds
    /// the coverage requirement.
    pub enable_ownership_validation: bool,

    /// Reject nesting cycles and duplicate nested type names
    pub enable_nesting_validation: bool,

    /// Require the entry point to be a static method
    pub enable_entry_point_validation: bool,

    /// Maximum length of a chain of enclosing types or nested type references
    pub max_nesting_depth: usize,

    /// Maximum number of type forwarders followed for a single lookup
    pub max_forwarding_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_complete_tables: true,
            enable_ownership_validation: true,
            enable_nesting_validation: true,
            enable_entry_point_validation: true,
            max_nesting_depth: 64,
            max_forwarding_depth: 16,
        }
    }
}

impl ValidationConfig {
    /// No optional checks, only what publication structurally needs
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            require_complete_tables: false,
            enable_ownership_validation: false,
            enable_nesting_validation: false,
            enable_entry_point_validation: false,
            max_nesting_depth: 64,
            max_forwarding_depth: 16,
        }
    }

    /// Completeness only, for loaders which already validated the binary
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            require_complete_tables: true,
            ..Self::disabled()
        }
    }

    /// Every check enabled
    #[must_use]
    pub fn comprehensive() -> Self {
        Self::default()
    }

    /// Every check enabled with tight nesting and forwarding limits
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_nesting_depth: 16,
            max_forwarding_depth: 4,
            ..Self::default()
        }
    }
}
