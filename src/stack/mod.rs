//! Stacking engine
//!
//! Each operation acts on one PR within one event, talking to the platform
//! only through the [`EventContext`](crate::context::EventContext):
//! 1. `directive` - parse `/stack #N` (pure)
//! 2. `shadow` - create, move, protect and delete shadow branches
//! 3. `attach` - retarget a PR onto its dependency's shadow branch
//! 4. `status` - publish the dependency check run and label
//! 5. `cascade` - re-parent dependents when a dependency closes
//! 6. `unstack` - revert a PR whose directive was removed

mod attach;
mod cascade;
mod directive;
mod shadow;
mod status;
mod unstack;

pub use attach::attach_to_dependency;
pub use cascade::{CascadeReport, cascade_reparent};
pub use directive::{Directive, parse_directive};
pub use shadow::{ShadowBranches, branch_name_for, dependency_of};
pub use status::{DependencyStatus, publish_dependency_status};
pub use unstack::unstack_if_directive_removed;
