pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DetectArgs, GenerateArgs};
pub use handlers::{handle_detect, handle_generate};
pub use output::{OutputFormat, OutputFormatter};
