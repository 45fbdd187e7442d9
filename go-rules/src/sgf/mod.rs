//! SGF reading and writing.
//!
//! The reader turns text into a header plus an ordered list of
//! [`SgfAction`]s; [`Engine::from_sgf`](crate::Engine::from_sgf) replays
//! them through the engine so every node gets a real board snapshot. The
//! writer walks a [`MoveTree`](crate::move_tree::MoveTree) directly.

mod convert;
mod error;
mod parser;
mod serialize;

pub use convert::SgfLoad;
pub use error::SgfError;
pub use parser::{MarkKind, SgfAction, SgfHeader, SgfRecord, parse};
pub use serialize::serialize;
