pub(crate) mod config;
pub use config::Config;

pub(crate) mod doc_id;
pub use doc_id::{DocId, DocIdError, MAX_DOC_ID_LENGTH};

pub(crate) mod document;
pub use document::Document;

pub(crate) mod field_type;
pub use field_type::{FieldType, StorageKind};

pub(crate) mod value;
pub use value::Value;
