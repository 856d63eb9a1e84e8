//! CLI command handlers, one per file.

mod completions;
mod digest;
mod inspect;
mod verify;

pub use completions::{run_completions, run_man};
pub use digest::run_digest;
pub use inspect::run_inspect;
pub use verify::{run_verify, VerifyArgs};
