//! Utility functions

pub mod logger;
pub mod text;

pub use logger::init_logging;
pub use text::contains_ignore_case;
