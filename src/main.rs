#[tokio::main]
async fn main() -> anyhow::Result<()> {
    grounded_gateway_lib::run().await
}
