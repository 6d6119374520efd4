//! `vidscout gateway`: start the HTTP/SSE server.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    println!("vidscout gateway");
    println!(
        "   Listening: {}:{}",
        config.gateway.host,
        port.unwrap_or(config.gateway.port)
    );
    println!("   Model:     {}", config.default_model);
    println!("   Stream:    POST /v1/tasks/stream");

    vidscout_gateway::start(config, port).await?;

    Ok(())
}
