//! Gateway resource catalogue behind `get_resource`

mod error;
mod filter;
mod kind;

pub use error::ResourceError;
pub use filter::ResourceFilter;
pub use kind::ResourceKind;
