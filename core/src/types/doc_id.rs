use nutype::nutype;
use redb::TypeName;
use std::cmp::Ordering;
use std::str;

pub const MAX_DOC_ID_LENGTH: usize = 512;

/// Value of a schema's UUID field, used as the primary key of every row and as
/// the member type of keyword posting sets.
///
/// Not trimmed: identifiers are matched exactly.
#[nutype(
    validate(not_empty, len_char_max = MAX_DOC_ID_LENGTH),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Borrow,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct DocId(String);

impl redb::Key for DocId {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        data1.cmp(data2)
    }
}

impl redb::Value for DocId {
    type SelfType<'a> = Self;
    type AsBytes<'a> = &'a [u8];

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let s = str::from_utf8(data).expect("invalid UTF-8 in doc id");
        Self::try_from(s).unwrap()
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        value.as_bytes()
    }

    fn type_name() -> TypeName {
        TypeName::new("sift::DocId")
    }
}
