pub mod config;
pub mod logging;

pub mod chunklist;
pub mod digest;
pub mod error;
pub mod image;
mod read;
pub mod signature;
pub mod verdict;
pub mod verify;

pub use error::{FailureKind, FormatError, SignatureError, VerifyError};
pub use verdict::{NoProgress, Verdict, VerifySink};
pub use verify::{verify_image, TrustedChunklist, Verifier};
