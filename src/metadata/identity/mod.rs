//! Assembly identity and strong-name handling.
//!
//! # Module Structure
//!
//! - [`assembly`] - Name, version and culture of an assembly, display-name parsing
//! - [`cryptographic`] - Public keys and public key tokens
//!
//! # Examples
//!
//! ```rust
//! use assemblymeta::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//!
//! let identity = AssemblyIdentity::new("MyLibrary", AssemblyVersion::new(1, 0, 0, 0), None, None);
//! assert_eq!(
//!     identity.display_name(),
//!     "MyLibrary, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
//! );
//! ```

pub mod assembly;
pub mod cryptographic;

pub use assembly::{AssemblyIdentity, AssemblyVersion};
pub use cryptographic::{AssemblyHashAlgorithm, Identity};
