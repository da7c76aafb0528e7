use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use env_logger::Env;
use findelix::{
    configuration::get_configuration,
    services::{GeminiClient, ProfileBuilder, SerperClient},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let missing = configuration.api_keys.missing();
    if !missing.is_empty() {
        log::warn!(
            "Missing API keys: {}. Affected stages will degrade to empty results.",
            missing.join(", ")
        );
    }

    let search = SerperClient::new(&configuration.search, configuration.api_keys.serper.clone())
        .context("Failed to build search client.")?;
    let model = GeminiClient::new(
        &configuration.summarizer,
        configuration.api_keys.gemini.clone(),
    )
    .context("Failed to build summarizer client.")?;
    let builder = ProfileBuilder::new(&configuration, Arc::new(search), Arc::new(model))
        .context("Failed to build crawl client.")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on http://{}", address);

    run(listener, builder, configuration.application)?.await?;
    Ok(())
}
