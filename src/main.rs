use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    carttotal_cli::cli::run().await
}
