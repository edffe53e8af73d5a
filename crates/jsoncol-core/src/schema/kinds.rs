//! The closed set of JSON value kinds a schema node accepts

use bitflags::bitflags;

use crate::{Error, Result};

bitflags! {
    /// Allowed JSON value kinds for one schema node.
    ///
    /// `DECIMAL` covers numbers with a fraction or exponent; `INT` covers
    /// numbers without either. Allowing `DECIMAL` implies allowing `INT`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Kinds: u8 {
        const OBJECT = 1 << 0;
        const ARRAY = 1 << 1;
        const STRING = 1 << 2;
        const INT = 1 << 3;
        const DECIMAL = 1 << 4;
        const BOOL = 1 << 5;
        const NULL = 1 << 6;
    }
}

impl Kinds {
    /// Whether `null` values are accepted.
    pub fn allows_null(self) -> bool {
        self.contains(Self::NULL)
    }

    /// Validates the general kind-set invariants, then that the set stays
    /// within `mask` (the kinds `type_name` can accept at all).
    pub(crate) fn validate(self, type_name: &str, mask: Kinds) -> Result<()> {
        if self.is_empty() {
            return Err(Error::schema(format!(
                "{type_name}: allowed kinds must not be empty"
            )));
        }
        if self == Self::NULL {
            return Err(Error::schema(format!(
                "{type_name}: allowed kinds must not be null alone"
            )));
        }
        if self.contains(Self::DECIMAL) && !self.contains(Self::INT) {
            return Err(Error::schema(format!(
                "{type_name}: allowing decimal requires allowing int"
            )));
        }
        if !mask.contains(self) {
            return Err(Error::schema(format!(
                "{type_name}: allowed kinds {:?} outside the supported set {:?}",
                self, mask
            )));
        }
        Ok(())
    }
}
