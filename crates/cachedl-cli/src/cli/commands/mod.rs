//! CLI command handlers. Each command is in its own file.

mod clear;
mod completions;
mod get;
mod inspect;
mod path;

pub use clear::run_clear;
pub use completions::{run_completions, run_manpage};
pub use get::{run_get, GetRequest};
pub use inspect::run_inspect;
pub use path::run_path;
