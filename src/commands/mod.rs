//! Command implementations

pub mod collect;
pub mod prompt;

pub use collect::*;
pub use prompt::*;
