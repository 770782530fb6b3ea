//! Assembly identity: name, version, culture and strong name.
//!
//! [`AssemblyIdentity`] is the key under which a loaded assembly is registered in a
//! [`crate::LoadContext`] and the node type of the
//! [`crate::metadata::dependencies::AssemblyDependencyGraph`].
//!
//! # Display Name Format
//!
//! ```text
//! AssemblyName[, Version=Major.Minor.Build.Revision][, Culture=culture][, PublicKeyToken=token]
//! ```

use std::fmt::{self, Write};
use std::str::FromStr;

use crate::{
    metadata::identity::cryptographic::{AssemblyHashAlgorithm, Identity},
    Result,
};

/// Characters which may not appear in an assembly name
const RESERVED_NAME_CHARS: &[char] = &[',', '=', '"', '/', '\\', ':', '\0'];

/// Complete identity of an assembly.
///
/// # Equality and Hashing
///
/// The strong name is excluded from both `PartialEq` and `Hash`, so an identity carrying a
/// full public key and one carrying only the derived token compare equal. Name, version
/// and culture provide sufficient uniqueness for resolution.
#[derive(Debug, Clone)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g., "System.Private.CoreLib")
    pub name: String,
    /// Four-part version number
    pub version: AssemblyVersion,
    /// Culture of a satellite assembly, `None` for culture-neutral assemblies
    pub culture: Option<String>,
    /// Cryptographic strong name, if the assembly is signed
    pub strong_name: Option<Identity>,
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version && self.culture == other.culture
    }
}

impl Eq for AssemblyIdentity {}

impl std::hash::Hash for AssemblyIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.culture.hash(state);
    }
}

/// Four-part version numbering for assemblies.
///
/// Versions are compared component-wise in order: major, minor, build, revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version component
    pub major: u16,
    /// Minor version component
    pub minor: u16,
    /// Build version component
    pub build: u16,
    /// Revision version component
    pub revision: u16,
}

impl AssemblyIdentity {
    /// Create a new assembly identity with the specified components.
    ///
    /// No validation happens here, see [`AssemblyIdentity::validate`].
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: Option<String>,
        strong_name: Option<Identity>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            culture,
            strong_name,
        }
    }

    /// Parse an identity from its display name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use assemblymeta::metadata::identity::{AssemblyIdentity, AssemblyVersion};
    ///
    /// let core = AssemblyIdentity::parse(
    ///     "System.Private.CoreLib, Version=8.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e"
    /// )?;
    /// assert_eq!(core.name, "System.Private.CoreLib");
    /// assert_eq!(core.version, AssemblyVersion::new(8, 0, 0, 0));
    /// assert!(core.is_culture_neutral());
    /// assert!(core.is_strong_named());
    /// # Ok::<(), assemblymeta::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns an error if the display name cannot be parsed or names an invalid assembly.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default().to_string();
        let mut version = AssemblyVersion::UNKNOWN;
        let mut culture = None;
        let mut strong_name = None;

        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                version = AssemblyVersion::parse(value)?;
            } else if let Some(value) = part.strip_prefix("Culture=") {
                if value != "neutral" {
                    culture = Some(value.to_string());
                }
            } else if let Some(value) = part.strip_prefix("PublicKeyToken=") {
                if value != "null" && !value.is_empty() {
                    strong_name = Some(Identity::Token(parse_public_key_token(value)?));
                }
            } else if !part.is_empty() {
                return Err(invalid_metadata!(
                    "Unknown assembly name component '{}'",
                    part
                ));
            }
        }

        let identity = Self {
            name,
            version,
            culture,
            strong_name,
        };
        identity.validate()?;

        Ok(identity)
    }

    /// Check that this identity names a loadable assembly.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidMetadata`] if the name is empty, carries surrounding
    /// whitespace or contains a reserved character, or if the culture is empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid_metadata!("Assembly name cannot be empty"));
        }

        if self.name.trim() != self.name {
            return Err(invalid_metadata!(
                "Assembly name '{}' has surrounding whitespace",
                self.name
            ));
        }

        if let Some(reserved) = self.name.chars().find(|c| RESERVED_NAME_CHARS.contains(c)) {
            return Err(invalid_metadata!(
                "Assembly name '{}' contains reserved character {:?}",
                self.name,
                reserved
            ));
        }

        if self.culture.as_deref().is_some_and(str::is_empty) {
            return Err(invalid_metadata!(
                "Assembly '{}' has an empty culture",
                self.name
            ));
        }

        Ok(())
    }

    /// Generate the display name string for this identity.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 80);

        result.push_str(&self.name);

        let _ = write!(result, ", Version={}", self.version);

        let culture_str = self.culture.as_deref().unwrap_or("neutral");
        let _ = write!(result, ", Culture={}", culture_str);

        match self.public_key_token() {
            Some(token) => {
                result.push_str(", PublicKeyToken=");
                for byte in token.to_le_bytes() {
                    let _ = write!(result, "{:02x}", byte);
                }
            }
            None => result.push_str(", PublicKeyToken=null"),
        }

        result
    }

    /// The public key token of a strong-named assembly.
    ///
    /// Full public keys are hashed with SHA1, the algorithm the runtime uses for tokens.
    #[must_use]
    pub fn public_key_token(&self) -> Option<u64> {
        self.strong_name
            .as_ref()
            .and_then(|identity| identity.to_token(AssemblyHashAlgorithm::SHA1).ok())
    }

    /// Whether this assembly carries a strong name
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.strong_name.is_some()
    }

    /// Whether this assembly is culture-neutral
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }

    /// Check whether this (loaded) identity can satisfy a reference to `required`.
    ///
    /// Names compare case-insensitively, cultures must match exactly and the version
    /// must be compatible (see [`AssemblyVersion::is_compatible_with`]).
    #[must_use]
    pub fn satisfies(&self, required: &AssemblyIdentity) -> bool {
        if !self.name.eq_ignore_ascii_case(&required.name) {
            return false;
        }

        if self.culture != required.culture {
            return false;
        }

        self.version.is_compatible_with(&required.version)
    }
}

impl AssemblyVersion {
    /// The all-zero version, used when no version was specified
    pub const UNKNOWN: Self = Self {
        major: 0,
        minor: 0,
        build: 0,
        revision: 0,
    };

    /// Create a new version
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Whether this is the all-zero version
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.build == 0 && self.revision == 0
    }

    /// Whether this version can be bound to a reference requiring `required`.
    ///
    /// The major version must match and this version must be at least the required one.
    /// An unknown requirement accepts any version.
    #[must_use]
    pub fn is_compatible_with(&self, required: &AssemblyVersion) -> bool {
        if required.is_unknown() {
            return true;
        }

        self.major == required.major && *self >= *required
    }

    /// Parse a version of one to four dot-separated components
    ///
    /// # Errors
    /// Returns an error if the string is empty, has more than four components, or a
    /// component is not a valid `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.len() > 4 {
            return Err(invalid_metadata!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];

        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| invalid_metadata!("Invalid version component: '{}'", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

fn parse_public_key_token(value: &str) -> Result<u64> {
    if value.len() != 16 || !value.is_ascii() {
        return Err(invalid_metadata!(
            "PublicKeyToken must be exactly 16 hex characters, got '{}'",
            value
        ));
    }

    let mut bytes = [0u8; 8];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let pair = &value[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|_| invalid_metadata!("Invalid hex in PublicKeyToken '{}'", value))?;
    }

    Ok(u64::from_le_bytes(bytes))
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_assembly_version_parse_partial() {
        assert_eq!(
            AssemblyVersion::parse("1.2.3").unwrap(),
            AssemblyVersion::new(1, 2, 3, 0)
        );
        assert_eq!(
            AssemblyVersion::parse("1").unwrap(),
            AssemblyVersion::new(1, 0, 0, 0)
        );
    }

    #[test]
    fn test_assembly_version_parse_invalid() {
        assert!(AssemblyVersion::parse("").is_err());
        assert!(AssemblyVersion::parse("1.2.3.4.5").is_err());
        assert!(AssemblyVersion::parse("1.2.abc.4").is_err());
        assert!(AssemblyVersion::parse("1.2.99999.4").is_err());
    }

    #[test]
    fn test_assembly_version_compatibility() {
        let required = AssemblyVersion::new(4, 1, 0, 0);

        assert!(AssemblyVersion::new(4, 1, 0, 0).is_compatible_with(&required));
        assert!(AssemblyVersion::new(4, 2, 0, 0).is_compatible_with(&required));
        assert!(!AssemblyVersion::new(4, 0, 9, 9).is_compatible_with(&required));
        assert!(!AssemblyVersion::new(5, 0, 0, 0).is_compatible_with(&required));
        assert!(AssemblyVersion::new(9, 9, 9, 9).is_compatible_with(&AssemblyVersion::UNKNOWN));
    }

    #[test]
    fn test_identity_parse_simple() {
        let identity = AssemblyIdentity::parse("Core").unwrap();
        assert_eq!(identity.name, "Core");
        assert!(identity.version.is_unknown());
        assert!(identity.is_culture_neutral());
        assert!(!identity.is_strong_named());
    }

    #[test]
    fn test_identity_parse_full_roundtrip() {
        let text = "Core, Version=1.2.3.4, Culture=de-DE, PublicKeyToken=b77a5c561934e089";
        let identity = AssemblyIdentity::parse(text).unwrap();

        assert_eq!(identity.version, AssemblyVersion::new(1, 2, 3, 4));
        assert_eq!(identity.culture.as_deref(), Some("de-DE"));
        assert_eq!(identity.display_name(), text);
    }

    #[test]
    fn test_identity_parse_rejects_malformed() {
        assert!(AssemblyIdentity::parse("").is_err());
        assert!(AssemblyIdentity::parse(", Version=1.0.0.0").is_err());
        assert!(AssemblyIdentity::parse("Core, Version=x").is_err());
        assert!(AssemblyIdentity::parse("Core, PublicKeyToken=1234").is_err());
        assert!(AssemblyIdentity::parse("Core, Flavor=spicy").is_err());
    }

    #[test]
    fn test_identity_validate() {
        let valid = AssemblyIdentity::new("My.Library", AssemblyVersion::UNKNOWN, None, None);
        assert!(valid.validate().is_ok());

        for name in [" Padded", "Bad/Name", "Bad:Name", "Bad\0Name", "Quo\"te"] {
            let identity = AssemblyIdentity::new(name, AssemblyVersion::UNKNOWN, None, None);
            assert!(identity.validate().is_err(), "{name:?} should be rejected");
        }

        let empty_culture = AssemblyIdentity::new(
            "Core",
            AssemblyVersion::UNKNOWN,
            Some(String::new()),
            None,
        );
        assert!(empty_culture.validate().is_err());
    }

    #[test]
    fn test_identity_equality_ignores_strong_name() {
        let plain = AssemblyIdentity::parse("Core, Version=1.0.0.0").unwrap();
        let signed =
            AssemblyIdentity::parse("Core, Version=1.0.0.0, PublicKeyToken=b77a5c561934e089")
                .unwrap();

        assert_eq!(plain, signed);

        let mut set = HashSet::new();
        set.insert(plain);
        assert!(set.contains(&signed));
    }

    #[test]
    fn test_identity_satisfies() {
        let loaded = AssemblyIdentity::parse("Core, Version=2.3.0.0").unwrap();

        assert!(loaded.satisfies(&AssemblyIdentity::parse("core, Version=2.1.0.0").unwrap()));
        assert!(!loaded.satisfies(&AssemblyIdentity::parse("Core, Version=3.0.0.0").unwrap()));
        assert!(!loaded.satisfies(&AssemblyIdentity::parse("Core, Culture=fr-FR").unwrap()));
        assert!(!loaded.satisfies(&AssemblyIdentity::parse("Other").unwrap()));
    }
}
