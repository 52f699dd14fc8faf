mod error;
mod link;
mod resolver;
mod validate;

pub use error::{ReferenceField, ResolveError, SchemaError};
pub use link::{LinkResolver, ThreadPosition};
pub use resolver::{Resolver, StandardResolver};
pub use validate::{lock, validate_references};
