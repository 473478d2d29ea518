pub mod config;
pub mod evaluate;
pub mod events;
pub mod window;

/// Result of a subcommand: the process exit code on success.
pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;
