// Provider mappers
// Normalized request → provider body, provider response → normalized result

pub mod models;
pub mod request;
pub mod response;

pub use request::build_request_body;
pub use response::{normalize_response, transform_response, unwrap_response};
