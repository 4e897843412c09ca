pub mod gateway;
pub mod models;
pub mod modules;

pub use gateway::{GatewayError, GatewayServer, GroundedRequestGateway};
pub use models::{
    Citation, GeoPoint, InlineImage, OperationKind, OperationRequest, OperationResult,
    ResolutionTier, SourceKind,
};

use tracing::{info, warn};

/// Parse `--port <n>` / `--lan` overrides from process arguments
pub fn apply_cli_overrides(config: &mut models::GatewayConfig, args: &[String]) {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--port" => match iter.next().map(|p| p.parse::<u16>()) {
                Some(Ok(port)) => config.server.port = port,
                _ => eprintln!("--port expects a number, keeping {}", config.server.port),
            },
            "--lan" => config.server.allow_lan_access = true,
            _ => {}
        }
    }
}

/// Run the gateway HTTP surface until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    let data_dir = modules::get_data_dir()?;
    let mut config = modules::load_gateway_config()?;
    let args: Vec<String> = std::env::args().collect();
    apply_cli_overrides(&mut config, &args);

    modules::init_logger(&config.logging, Some(&data_dir))?;
    info!("Data directory: {}", data_dir.display());

    let gateway = GroundedRequestGateway::new(&config)?;
    if !gateway.has_api_key() {
        warn!("No API key configured; every operation will fail with auth_error");
    }

    let (server, handle) = GatewayServer::start(&config.server, gateway).await?;
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    server.stop().await;
    handle.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = models::GatewayConfig::new();
        apply_cli_overrides(&mut config, &args(&["grounded-gateway", "--port", "9000", "--lan"]));
        assert_eq!(config.server.port, 9000);
        assert!(config.server.allow_lan_access);
    }

    #[test]
    fn test_cli_bad_port_keeps_default() {
        let mut config = models::GatewayConfig::new();
        apply_cli_overrides(&mut config, &args(&["grounded-gateway", "--port", "abc"]));
        assert_eq!(config.server.port, 8046);
        assert!(!config.server.allow_lan_access);
    }
}
