pub mod config;
pub mod image;
pub mod operation;

pub use config::{
    GatewayConfig, LoggingConfig, ModelRoutes, ServerConfig, UpstreamConfig, UpstreamProxyConfig,
};
pub use image::{ImageDecodeError, InlineImage};
pub use operation::{
    Citation, GeoPoint, OperationKind, OperationRequest, OperationResult, ResolutionTier,
    SourceKind,
};
