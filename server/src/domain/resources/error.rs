use thiserror::Error;

use super::kind::ResourceKind;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResourceError {
    #[error("{kind} requires {field}")]
    MissingField {
        kind: ResourceKind,
        field: &'static str,
    },

    #[error("Invalid {field}: must match ^[a-zA-Z0-9-_.]+$ and be at most 256 characters")]
    InvalidId { field: &'static str },

    #[error("{0} does not support lookup by id, omit id to list")]
    ItemLookupUnsupported(ResourceKind),

    #[error("No resource parameters passed in")]
    NothingRequested,
}
