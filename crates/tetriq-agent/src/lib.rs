pub use self::{
    action::*, heuristic::*, policy::*, replay::*, state::*, table::*, trainer::*,
};

pub mod action;
pub mod heuristic;
pub mod policy;
pub mod replay;
pub mod state;
pub mod table;
pub mod trainer;
