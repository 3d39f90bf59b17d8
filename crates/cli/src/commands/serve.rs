//! `foundry serve` — Start the HTTP gateway.

use anyhow::anyhow;

pub async fn run(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = super::load_config()?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(host) = host {
        config.gateway.host = host;
    }

    println!("Agent foundry gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Checkpoint: {}", config.checkpoint.backend);

    foundry_gateway::start(config).await.map_err(|e| anyhow!("Gateway failed: {e}"))
}
