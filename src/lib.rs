pub mod cli;
pub mod common;
pub mod downloader;
pub mod error;
pub mod parser;
pub mod post_process;

pub use error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
