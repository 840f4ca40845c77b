//! stackbot: stacked pull requests for GitHub
//!
//! A PR declares its dependency with a `/stack #N` line in its description.
//! stackbot then retargets the PR onto a shadow branch that mirrors #N's
//! head, reports a check run and label while #N is open, and unwinds the
//! stack when #N closes or the directive is removed.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod platform;
pub mod server;
pub mod stack;
pub mod types;
pub mod webhook;
