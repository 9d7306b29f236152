pub mod catalog;
pub mod cli;
pub mod fabric;
pub mod load_config;

pub use cli::{run, Cli, Commands};
