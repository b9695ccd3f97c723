use anyhow::Context;
use chrono::Local;
use farehound_cli::run_search;
use farehound_store::{Config, HttpFareSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "farehound_cli=info,farehound_catalog=info,farehound_store=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().context("Failed to load config")?;
    let plan = config
        .search
        .validate()
        .context("Invalid [search] settings")?;
    let baseline = config
        .search
        .baseline
        .unwrap_or_else(|| Local::now().date_naive());

    tracing::info!(
        origin = %config.search.origin,
        destination = %config.search.destination,
        endpoint = %config.source.endpoint,
        "Starting weekend search"
    );

    let source = HttpFareSource::new(&config.source).context("Failed to build HTTP client")?;
    let report = run_search(source, &plan, baseline)?;

    println!("{}", report.summary());
    if config.report.json {
        println!("{}", serde_json::to_string_pretty(&report.trips)?);
    }

    tracing::info!(session_id = %report.session_id, offers = report.offers, "Search finished");
    Ok(())
}
