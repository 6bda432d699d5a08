use portfolio_contact::{
    configuration::get_configuration,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("portfolio-contact".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;

    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Server running");

    application.run_until_stopped().await
}
