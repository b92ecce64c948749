use drivedrop_api::setup;
use drivedrop_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under bursty
// multipart buffering, especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, drive client, routes)
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router, state.shutdown.clone()).await?;

    Ok(())
}
