//! Versioned on-disk codec: one version byte followed by a postcard payload.

use crate::store::Row;
use crate::types::DocId;
use redb::TypeName;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub enum VersionedRow {
    V1(Row),
}

impl VersionedRow {
    const VERSION_V1: u8 = 1;

    pub fn into_latest(self) -> Row {
        match self {
            Self::V1(row) => row,
        }
    }
}

impl redb::Value for VersionedRow {
    type SelfType<'a> = VersionedRow;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (version, data) = data.split_first().expect("empty row");
        match *version {
            Self::VERSION_V1 => VersionedRow::V1(postcard::from_bytes(data).expect("invalid row")),
            version => panic!("unsupported row version: {}", version),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        match value {
            VersionedRow::V1(row) => postcard::to_extend(row, vec![Self::VERSION_V1]).unwrap(),
        }
    }

    fn type_name() -> TypeName {
        TypeName::new("sift::Row")
    }
}

/// Id set of one keyword row.
#[derive(Debug, Clone)]
pub enum VersionedPostings {
    V1(BTreeSet<DocId>),
}

impl VersionedPostings {
    const VERSION_V1: u8 = 1;

    pub fn into_latest(self) -> BTreeSet<DocId> {
        match self {
            Self::V1(ids) => ids,
        }
    }
}

impl redb::Value for VersionedPostings {
    type SelfType<'a> = VersionedPostings;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (version, data) = data.split_first().expect("empty posting set");
        match *version {
            Self::VERSION_V1 => VersionedPostings::V1(postcard::from_bytes(data).expect("invalid posting set")),
            version => panic!("unsupported posting set version: {}", version),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        match value {
            VersionedPostings::V1(ids) => postcard::to_extend(ids, vec![Self::VERSION_V1]).unwrap(),
        }
    }

    fn type_name() -> TypeName {
        TypeName::new("sift::Postings")
    }
}
