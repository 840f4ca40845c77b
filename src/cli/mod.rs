//! CLI commands

pub mod context;
mod inspect;
mod replay;
mod serve;

pub use inspect::run_inspect;
pub use replay::run_replay;
pub use serve::run_serve;
