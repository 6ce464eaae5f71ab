//! Compare a saved product page against the marketplace.
//!
//! Usage: `honey_barrel <page.html> <page-url>`
//!
//! Settings come from the file named by `HONEY_BARREL_CONFIG` (optional)
//! and `HONEY_BARREL_*` environment variables. Prints the match outcome as
//! JSON, or `null` when the page shows no detectable item.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use honey_barrel::logging::init_logging;
use honey_barrel::{Session, Settings};

const CONFIG_ENV: &str = "HONEY_BARREL_CONFIG";

async fn run(html_path: PathBuf, page_url: String) -> honey_barrel::Result<()> {
    let config_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings.logging)?;

    let html = fs::read_to_string(&html_path)?;
    let session = Session::new(&settings)?;

    let outcome = session.compare_page(&html, &page_url).await;
    if outcome.is_none() {
        tracing::info!(url = %page_url, "No item detected on page");
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let (Some(html_path), Some(page_url), None) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: honey_barrel <page.html> <page-url>");
        return ExitCode::from(2);
    };

    match run(PathBuf::from(html_path), page_url).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
