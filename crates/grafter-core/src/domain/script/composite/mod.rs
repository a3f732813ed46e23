//! Higher-level merges built from the script primitives.

pub mod ambient;
pub mod hooks;
pub mod plugins;

pub use ambient::{GlobalMember, ensure_global_member};
pub use hooks::{HandlerChain, TypeRef, splice_handler};
pub use plugins::{PluginList, add_plugin};
