pub mod error;
pub mod foreign_runtime;
pub mod operation;
