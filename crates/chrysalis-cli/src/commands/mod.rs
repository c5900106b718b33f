// crates/chrysalis-cli/src/commands/mod.rs

pub mod evolve;
pub mod select;
pub mod verify;
