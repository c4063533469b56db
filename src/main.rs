use anyhow::Result;
use salon::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
