//! Search query compiler.
//!
//! A query string such as `status=APPROVED,user.name:~smith` is
//! tokenized by [`parser`] into [`Criterion`] values, each criterion
//! is compiled against an entity [`Descriptor`] by [`compiler`], and
//! [`builder`] folds the results into one [`Compiled`] predicate that
//! the record stores evaluate.

pub mod builder;
pub mod compiler;
pub mod criterion;
pub mod descriptor;
pub mod engine;
pub mod entities;
pub mod error;
pub mod operators;
pub mod parser;
pub mod predicate;
pub mod schema;
pub mod value;

pub use criterion::Criterion;
pub use descriptor::{Descriptor, DescriptorFactory};
pub use entities::EntityKind;
pub use error::{SearchError, INVALID_SEARCH_EXPRESSION};
pub use operators::{OperatorOverrides, OperatorRegistry, SearchOperator};
pub use predicate::{Compiled, Predicate};
pub use schema::{Field, FieldType, Root};
pub use value::Value;
