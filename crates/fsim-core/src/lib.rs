pub mod error;
pub mod exec;
pub mod flutter;
pub mod simctl;
pub mod workflow;

pub use error::{Error, Result};
pub use exec::{CommandRunner, ExecOutput, SystemRunner};
