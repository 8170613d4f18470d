//! main.rs

use anyhow::Context;
use tokenauth::configuration::get_configuration;
use tokenauth::error::AuthResult;
use tokenauth::startup::Application;
use tokenauth::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> AuthResult<()> {
    let subscriber = get_subscriber("tokenauth".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Panic if we can't read configuration
    let configuration = get_configuration().expect("Failed to read configuration.");
    let application = Application::build(configuration).await?;
    application
        .run_until_stopped()
        .await
        .context("API server terminated with an error")?;

    Ok(())
}
