//! Fixed-size, set-once metadata tables.
//!
//! A [`MetadataTable`] reserves its rows when the assembly is constructed, mirroring how the
//! binary format declares row counts before any row content is read. Each row can be
//! populated exactly once; afterwards its identity never changes.

use std::sync::Arc;

use crate::{
    metadata::token::{TableId, Token},
    Error, Result,
};

/// An index-addressable table of set-once rows
pub struct MetadataTable<T> {
    table: TableId,
    rows: Vec<Option<Arc<T>>>,
}

impl<T> MetadataTable<T> {
    /// Reserve `count` empty rows for `table`
    #[must_use]
    pub fn new(table: TableId, count: u32) -> Self {
        MetadataTable {
            table,
            rows: (0..count).map(|_| None).collect(),
        }
    }

    /// The table this instance represents
    #[must_use]
    pub fn id(&self) -> TableId {
        self.table
    }

    /// Number of reserved rows
    #[must_use]
    pub fn len(&self) -> u32 {
        // Row counts are bounded by `Token::MAX_ROW` at construction
        self.rows.len() as u32
    }

    /// Whether the table has no reserved rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Token of the row at `index`
    #[must_use]
    pub fn token(&self, index: u32) -> Token {
        Token::from_index(self.table, index)
    }

    /// Check that the row at `index` is reserved and still empty, returning its token
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if `index` is not reserved, and
    /// [`Error::DuplicateDefinition`] if the row was already populated.
    pub fn check_vacant(&self, index: u32) -> Result<Token> {
        match self.rows.get(index as usize) {
            None => Err(Error::IndexOutOfRange {
                table: self.table,
                index,
                count: self.len(),
            }),
            Some(Some(_)) => Err(Error::DuplicateDefinition(self.token(index))),
            Some(None) => Ok(self.token(index)),
        }
    }

    /// Populate the row at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if `index` is not reserved, and
    /// [`Error::DuplicateDefinition`] if the row was already populated. The existing
    /// value is left untouched in both cases.
    pub fn set(&mut self, index: u32, value: T) -> Result<&Arc<T>> {
        self.set_shared(index, Arc::new(value))
    }

    /// Populate the row at `index` with an already shared value
    ///
    /// # Errors
    /// Same as [`MetadataTable::set`].
    pub fn set_shared(&mut self, index: u32, value: Arc<T>) -> Result<&Arc<T>> {
        let table = self.table;
        let count = self.len();
        match self.rows.get_mut(index as usize) {
            None => Err(Error::IndexOutOfRange {
                table,
                index,
                count,
            }),
            Some(Some(_)) => Err(Error::DuplicateDefinition(Token::from_index(table, index))),
            Some(slot) => {
                let row: &Arc<T> = slot.insert(value);
                Ok(row)
            }
        }
    }

    /// Access the row at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if `index` is not reserved, and
    /// [`Error::Unpopulated`] if the loader has not filled the row.
    pub fn get(&self, index: u32) -> Result<&Arc<T>> {
        self.rows
            .get(index as usize)
            .ok_or(Error::IndexOutOfRange {
                table: self.table,
                index,
                count: self.len(),
            })?
            .as_ref()
            .ok_or_else(|| Error::Unpopulated(self.token(index)))
    }

    /// Whether the row at `index` is populated, `false` for out of range indices
    #[must_use]
    pub fn is_populated(&self, index: u32) -> bool {
        self.rows
            .get(index as usize)
            .is_some_and(Option::is_some)
    }

    /// Index of the first row which is still empty
    #[must_use]
    pub fn first_unpopulated(&self) -> Option<u32> {
        self.rows
            .iter()
            .position(Option::is_none)
            .map(|index| index as u32)
    }

    /// Iterate over all populated rows together with their index
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<T>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_ref().map(|value| (index as u32, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_reserves_empty_rows() {
        let table: MetadataTable<String> = MetadataTable::new(TableId::TypeDef, 3);

        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.first_unpopulated(), Some(0));
        assert!(matches!(
            table.get(1),
            Err(Error::Unpopulated(token)) if token.value() == 0x0200_0002
        ));
    }

    #[test]
    fn test_table_set_once() {
        let mut table = MetadataTable::new(TableId::Field, 2);

        table.set(0, "first".to_string()).unwrap();
        let err = table.set(0, "second".to_string()).unwrap_err();

        assert!(matches!(err, Error::DuplicateDefinition(token) if token.value() == 0x0400_0001));
        assert_eq!(table.get(0).unwrap().as_str(), "first");
    }

    #[test]
    fn test_table_out_of_range() {
        let mut table = MetadataTable::new(TableId::MethodDef, 1);

        assert!(matches!(
            table.set(1, 10u32),
            Err(Error::IndexOutOfRange {
                table: TableId::MethodDef,
                index: 1,
                count: 1
            })
        ));
        assert!(matches!(table.get(7), Err(Error::IndexOutOfRange { .. })));
        assert!(!table.is_populated(7));
    }

    #[test]
    fn test_table_iter_skips_empty_rows() {
        let mut table = MetadataTable::new(TableId::TypeRef, 4);
        table.set(1, 'b').unwrap();
        table.set(3, 'd').unwrap();

        let rows: Vec<(u32, char)> = table.iter().map(|(i, v)| (i, **v)).collect();
        assert_eq!(rows, vec![(1, 'b'), (3, 'd')]);
        assert_eq!(table.first_unpopulated(), Some(0));
    }
}
