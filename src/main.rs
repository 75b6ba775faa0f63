use app_settings::{Settings, telemetry};

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let settings = Settings::load();
    tracing::info!(
        app_name = %settings.app_name,
        debug = settings.debug,
        "settings loaded"
    );
    if settings.debug {
        tracing::warn!("debug mode is enabled");
    }
    tracing::debug!(summary = %serde_json::to_string(&settings)?, "resolved settings");

    settings.validate()?;
    tracing::info!(
        host = settings.mysql_host.as_deref().unwrap_or_default(),
        port = %settings.mysql_port,
        db = settings.mysql_db.as_deref().unwrap_or_default(),
        "database settings complete"
    );

    Ok(())
}
