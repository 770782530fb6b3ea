//! Validation of the method and field ranges owned by types.
//!
//! Types refer to their members by index range into the flat `MethodDef` and `Field`
//! tables. A range must lie inside its table and no two types may claim the same member.
//! When ownership validation is enabled every member must also have an owner.

use std::ops::Range;

use crate::{
    metadata::tables::{MetadataTable, TypeDef},
    Result,
};

/// Owning type index of every method and field
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct MemberOwnership {
    pub methods: Vec<Option<u32>>,
    pub fields: Vec<Option<u32>>,
}

/// Member range validator
pub(crate) struct MemberValidator;

impl MemberValidator {
    /// Check all member ranges and compute the owner of every member.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidMetadata`] if a range is inverted, exceeds its
    /// table or overlaps another type's range, or if `require_coverage` is set and a
    /// member has no owner.
    pub fn validate_member_ranges(
        types: &MetadataTable<TypeDef>,
        method_count: u32,
        field_count: u32,
        require_coverage: bool,
    ) -> Result<MemberOwnership> {
        let methods = Self::assign_owners(
            types.iter().map(|(index, def)| (index, &def.methods)),
            method_count,
            "method",
            require_coverage,
        )?;
        let fields = Self::assign_owners(
            types.iter().map(|(index, def)| (index, &def.fields)),
            field_count,
            "field",
            require_coverage,
        )?;

        Ok(MemberOwnership { methods, fields })
    }

    fn assign_owners<'a>(
        ranges: impl Iterator<Item = (u32, &'a Range<u32>)>,
        count: u32,
        kind: &str,
        require_coverage: bool,
    ) -> Result<Vec<Option<u32>>> {
        let mut owners: Vec<Option<u32>> = vec![None; count as usize];

        for (owner, range) in ranges {
            if range.start > range.end {
                return Err(invalid_metadata!(
                    "Type {} has an inverted {} range {}..{}",
                    owner,
                    kind,
                    range.start,
                    range.end
                ));
            }

            if range.end > count {
                return Err(invalid_metadata!(
                    "Type {} claims {} range {}..{} but only {} exist",
                    owner,
                    kind,
                    range.start,
                    range.end,
                    count
                ));
            }

            for member in range.clone() {
                let slot = &mut owners[member as usize];
                if let Some(previous) = slot {
                    return Err(invalid_metadata!(
                        "The {} at index {} is claimed by types {} and {}",
                        kind,
                        member,
                        previous,
                        owner
                    ));
                }
                *slot = Some(owner);
            }
        }

        if require_coverage {
            if let Some(orphan) = owners.iter().position(Option::is_none) {
                return Err(invalid_metadata!(
                    "The {} at index {} is not owned by any type",
                    kind,
                    orphan
                ));
            }
        }

        Ok(owners)
    }
}
