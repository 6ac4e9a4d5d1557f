//! Middleware modules

pub mod consistency;
pub mod replay;

pub use consistency::{is_mutation, transactional_consistency};
pub use replay::{REPLAY_HEADER, ReplayRendering, replay_response};
