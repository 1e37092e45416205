use duskhunt::DuskhuntServerBuilder;
use duskhunt_persist::NoopPersistence;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let server = DuskhuntServerBuilder::new()
        .bind(&addr)
        .build(NoopPersistence)
        .await?;

    tracing::info!(%addr, "duskhunt listening");
    server.run().await?;
    Ok(())
}
