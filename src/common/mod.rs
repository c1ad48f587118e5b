#![forbid(unsafe_code)]
pub use command::CommandSpec;
pub use error::Error;

pub mod command;
pub mod error;
