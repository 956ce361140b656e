use std::path::PathBuf;

use clap::Parser;
use esg_link_harvester::{ChromeDriver, HarvestConfig, Harvester, LinkSink, PageDriver};
use tracing::{error, info};
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "esg-link-harvester",
    about = "Collect company detail links from a paginated ESG ratings directory"
)]
struct Args {
    /// Listing URL to traverse
    #[arg(long)]
    url: Option<String>,

    /// File the harvested links are appended to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Stop after this many pages even if the listing reports more
    #[arg(long)]
    max_pages: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = HarvestConfig::default();
    if let Some(url) = args.url {
        Url::parse(&url)?;
        config.listing_url = url;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    config.page_cap = args.max_pages;
    config.browser.headless = !args.headed;

    info!(
        url = %config.listing_url,
        output = %config.output_path.display(),
        "starting harvest"
    );

    let mut driver = ChromeDriver::launch(&config.browser)?;
    let mut sink = LinkSink::open(&config.output_path)?;
    let harvester = Harvester::new(config);

    let outcome = harvester.run(&mut driver, &mut sink).await;
    driver.close().await?;

    match outcome {
        Ok(report) => {
            info!(
                pages = report.pages_visited,
                links = report.links_collected,
                clicks = report.advance_clicks,
                "harvest finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "harvest aborted");
            Err(e.into())
        }
    }
}
