use anyhow::Result;
use tracing::info;

use lensprobe::browser::BrowserType;
use lensprobe::config::Config;
use lensprobe::session::SearchRunner;
use lensprobe::types::{OutputFormat, SearchCategory, SearchRequest};

pub async fn handle_search(
    image_url: String,
    category: SearchCategory,
    browser: String,
    webdriver_url: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<i32> {
    info!("Searching for {}", image_url);

    let mut config = Config::from_env()?;
    if let Some(url) = webdriver_url {
        config.webdriver_url = url;
    }
    config.headless = !no_headless;

    let browser_type: BrowserType = browser.parse()?;
    let runner = SearchRunner::new(config, browser_type);

    let request = SearchRequest { image_url, category };
    let outcome = runner.search(&request).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Simple => {
            println!("status: {} ({})", outcome.status, outcome.status_code.code());
            println!("{}", outcome.message);
            for (tab, items) in &outcome.result {
                println!("{} ({} items):", tab, items.len());
                for item in items {
                    println!("  {}", item.url());
                }
            }
            println!("total: {}", outcome.total_results);
        }
    }

    Ok(outcome.status_code.exit_code())
}
