use anyhow::Context;
use dotenv::dotenv;
use log::{LevelFilter, error, info};
use odds_hunter::{
    Ledger, ScrapingContext, SiteCollector,
    config::{HuntEnv, LoadFromEnv},
    hunt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let hunt_env = HuntEnv::load_from_env()?;
    let params = hunt_env.params()?;
    let ctx = ScrapingContext::new().context("failed to load scraping config")?;

    let mut ledger = Ledger::connect(&hunt_env.database_url, hunt_env.commit_everything).await?;
    info!(
        "Writing odds to {} ({})",
        hunt_env.database_url,
        if ledger.commit_everything() {
            "committing every write"
        } else {
            "committing once at the end"
        }
    );
    let collector = match SiteCollector::open(ctx).await {
        Ok(collector) => collector,
        Err(e) => {
            ledger.close().await?;
            return Err(e);
        }
    };

    info!(
        "Hunting {} {} odds from {} to {}",
        params.sport, params.market, params.start, params.end
    );
    let outcome = hunt(&collector, &mut ledger, &params).await;

    // Release the browser and the database whether or not the hunt finished.
    if let Err(e) = collector.close().await {
        error!("{:#}", e);
    }
    ledger.close().await?;

    let summary = outcome?;
    info!(
        "Done: {} days, {} events, {} odds rows, {} without odds",
        summary.days, summary.urls, summary.odds_rows, summary.no_data_rows
    );
    Ok(())
}
