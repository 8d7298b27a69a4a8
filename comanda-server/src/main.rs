use comanda_server::{Config, Server, ServerState, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();

    tracing::info!("Comanda server starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config)?;

    let server = Server::with_state(config, state);
    server.run().await
}
