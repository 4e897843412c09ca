// Gateway module
//
// One normalized entry point (`GroundedRequestGateway::execute`) over four
// provider operations, plus the local HTTP surface that exposes it.

pub mod common;
pub mod error;
pub mod handlers;
pub mod mappers;
pub mod server;
pub mod service;
pub mod upstream;

pub use error::GatewayError;
pub use server::GatewayServer;
pub use service::GroundedRequestGateway;
pub use upstream::{UpstreamClient, UpstreamTransport};
