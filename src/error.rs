use thiserror::Error;

use crate::metadata::token::{TableId, Token};

macro_rules! invalid_metadata {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidMetadata {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidMetadata {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Population Errors
/// Raised while the loader fills an [`crate::Assembly`]. They abort loading of that assembly.
/// - [`Error::InvalidMetadata`] - Malformed table sizes, identity or cross-table structure
/// - [`Error::DuplicateDefinition`] - A set-once slot was populated twice
/// - [`Error::IndexOutOfRange`] - An index outside the reserved table range
///
/// ## Resolution Errors
/// Returned to the caller that requested a resolution. Other references and other
/// assemblies are unaffected.
/// - [`Error::UnresolvedTypeReference`] - The named type does not exist in the target
/// - [`Error::CircularReference`] - Resolution of a reference loops back to itself
/// - [`Error::Unpopulated`] - A slot was read before the loader populated it
///
/// ## Load Context Errors
/// - [`Error::CircularDependency`] - Publishing would make an assembly depend on itself
/// - [`Error::AssemblyNotLoaded`] - A referenced assembly is not part of the context
/// - [`Error::DuplicateAssembly`] - An assembly with the same identity is already loaded
///
/// # Examples
///
/// ```rust
/// use assemblymeta::{Assembly, Error, TableCounts};
/// use assemblymeta::metadata::identity::AssemblyIdentity;
///
/// let identity = AssemblyIdentity::parse("Empty, Version=1.0.0.0")?;
/// let assembly = Assembly::new(identity, TableCounts::default())?.publish()?;
///
/// match assembly.resolve_type_ref(0) {
///     Err(Error::IndexOutOfRange { index, count, .. }) => {
///         assert_eq!((index, count), (0, 0));
///     }
///     other => panic!("unexpected: {:?}", other.is_ok()),
/// }
/// # Ok::<(), assemblymeta::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata handed to the container is damaged.
    ///
    /// Covers malformed table sizes, malformed identities and structural problems found
    /// while publishing (member ranges, nesting, entry point). The error includes the
    /// source location where the problem was detected.
    #[error("Invalid metadata - {file}:{line}: {message}")]
    InvalidMetadata {
        /// Description of what was malformed
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A set-once table slot was populated a second time.
    ///
    /// The original value is left untouched.
    #[error("Slot {0} is already populated")]
    DuplicateDefinition(Token),

    /// An index outside the reserved range of a table was used.
    #[error("Index {index} is out of range for table {table} with {count} rows")]
    IndexOutOfRange {
        /// The table that was accessed
        table: TableId,
        /// The offending 0-based index
        index: u32,
        /// Number of rows reserved for the table
        count: u32,
    },

    /// A slot was read before the loader populated it.
    #[error("Slot {0} has not been populated")]
    Unpopulated(Token),

    /// The named type does not exist in the assembly the reference points to.
    #[error("Unable to resolve type '{reference}' in '{scope}'")]
    UnresolvedTypeReference {
        /// Full name of the referenced type
        reference: String,
        /// Display name of the scope that was searched
        scope: String,
    },

    /// Resolution of a reference loops back to resolving itself.
    ///
    /// The associated [`Token`] identifies the reference at which the loop was detected.
    #[error("Circular type reference detected at {0}")]
    CircularReference(Token),

    /// Publishing an assembly would make it (transitively) depend on itself.
    #[error("Circular assembly dependency - {0}")]
    CircularDependency(String),

    /// An assembly reference names an assembly that is not loaded in the context.
    #[error("Assembly '{0}' is not loaded")]
    AssemblyNotLoaded(String),

    /// An assembly with the same identity has already been published to the context.
    #[error("Assembly '{0}' is already loaded")]
    DuplicateAssembly(String),

    /// Failed to lock target.
    ///
    /// A resolution slot lock was poisoned by a panicking thread.
    #[error("Failed to lock target")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_metadata_macro_captures_location() {
        let err = invalid_metadata!("bad count {}", 7);
        match err {
            Error::InvalidMetadata {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "bad count 7");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("Expected InvalidMetadata"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::IndexOutOfRange {
            table: TableId::TypeRef,
            index: 4,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Index 4 is out of range for table TypeRef with 2 rows"
        );

        let err = Error::DuplicateDefinition(Token::new(0x0200_0001));
        assert_eq!(err.to_string(), "Slot 0x02000001 is already populated");
    }
}
