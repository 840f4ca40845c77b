//! GitHub webhook handling: payload parsing, signature checks and routing

pub mod events;
pub mod router;
pub mod signature;

pub use events::{PrAction, PullRequestEvent, parse_webhook};
pub use router::{Router, Step, handle_event};
pub use signature::{sign_payload, verify_signature};
