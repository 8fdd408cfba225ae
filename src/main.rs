use apex_sensors::status_poller::read_json_file;
use apex_sensors::{
    setup_entry, AppSettings, ConfigEntry, Coordinator, EntityRegistry, StatusPayload, StatusPoller,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Apex sensor bridge");
    let settings = AppSettings::from_env()?;

    let entry: ConfigEntry = read_json_file(&settings.config_entry_path).await?;
    // Start from whatever status is on disk, an unreadable one just means empty sensors
    let initial: StatusPayload = match read_json_file(&settings.status_path).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("No initial status: {e:#}");
            StatusPayload::default()
        }
    };
    let coordinator = Coordinator::new(initial);

    let mut registry = EntityRegistry::default();
    setup_entry(coordinator.clone(), settings.platform, &entry, &mut registry)?;

    let poller = StatusPoller::new(
        settings.status_path,
        coordinator,
        registry.into_entities(),
        settings.poll_interval,
    );
    poller.spawn().await?;

    Ok(())
}
