// Fast hash sets using AHash instead of the default SipHash.
// Import with `use crate::types::{HashSet, HashSetExt}` when you need `::new()`.
pub(crate) type HashMap<K, V> = ahash::HashMap<K, V>;
pub(crate) type HashSet<K> = ahash::HashSet<K>;
pub(crate) use ahash::HashMapExt;
pub(crate) use ahash::HashSetExt;

/// Which input store a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    First,
    Second,
}

impl Source {
    /// 1-based input number, as written to the origin tag and to diagnostics.
    pub fn number(self) -> u8 {
        match self {
            Source::First => 1,
            Source::Second => 2,
        }
    }
}

/// Value of the origin tag: which input(s) contributed a kept record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    First,
    Second,
    Both,
}

impl Origin {
    pub fn value(self) -> i32 {
        match self {
            Origin::First => 1,
            Origin::Second => 2,
            Origin::Both => 12,
        }
    }
}

impl From<Source> for Origin {
    fn from(source: Source) -> Self {
        match source {
            Source::First => Origin::First,
            Source::Second => Origin::Second,
        }
    }
}
