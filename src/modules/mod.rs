pub mod config;
pub mod logger;

// Re-export commonly used functions
pub use config::*;
pub use logger::init_logger;
