//! Idempotent mutation primitives over script trees.
//!
//! Every upsert returns the existing node when a structurally equal one is
//! already there. Operations that may or may not touch the tree report
//! whether they did, which makes re-run checks cheap in tests and logs.

pub mod array;
pub mod comments;
pub mod exports;
pub mod function;
pub mod imports;
pub mod object;
pub mod variables;

pub use crate::domain::equality::equal;

pub use array::{ArrayItem, append, prepend};
pub use exports::{default_export, named_export};
pub use function::{arrow_return_object, create_call, get_argument};
pub use object::{PropValue, override_properties, property, property_mut, remove_property};
pub use variables::{Declaration, declaration, find_declaration, insert_before_exports};
