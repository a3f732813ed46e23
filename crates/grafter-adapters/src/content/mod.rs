//! Content adapters: where file text comes from and goes to.

mod local;
mod memory;

pub use local::LocalContent;
pub use memory::MemoryContent;
