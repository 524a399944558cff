use anyhow::Result;
use sesame::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments and initialize logging before anything else
    let action = start()?;

    action.execute().await
}
