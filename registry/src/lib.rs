//! Arbor Registry
//!
//! Resolves the type declared for a scalar node into a validator.
//! A declaration is either a built-in type tag (`"number"`, `"string"`, ...),
//! a custom tag registered on the `ResolverBuilder`, or an inline predicate.
//! The resolver is immutable after construction.

mod builder;
mod range;
mod resolver;
mod types;

pub use builder::{RegistryError, RegistryResult, ResolverBuilder};
pub use range::RangeSpec;
pub use resolver::{pass, Resolver};
pub use types::*;
