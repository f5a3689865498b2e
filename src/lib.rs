pub mod arena;
pub mod board;
pub mod bot;
pub mod engine;
pub mod game;
pub mod rules;
pub mod ruleset;
pub mod web;

pub use arena::*;
pub use board::*;
pub use bot::*;
pub use game::*;
pub use rules::*;
pub use ruleset::*;
