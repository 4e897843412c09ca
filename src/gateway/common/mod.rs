pub mod common_utils;
pub mod error_classifier;
