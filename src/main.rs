//! daqlog CLI entry point.

use daqlog_lib::cli::{self, Cli};
use daqlog_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
