pub use self::{board::*, piece::*};

pub mod board;
pub mod piece;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("piece colliding when spawning onto the board")]
pub struct SpawnError;
