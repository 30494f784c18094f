pub mod canvas;
pub mod checks;
pub mod cli;
pub mod load_config;
pub mod logging;
pub mod roster;

pub use cli::{run, Cli, Commands};
