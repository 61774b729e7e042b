use anyhow::Result;
use clap::Parser;

use snaplink::cli::{Cli, generate_config};
use snaplink::config::init_config;
use snaplink::runtime::modes::run_server;
use snaplink::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.generate_config {
        generate_config(cli.output.as_deref())?;
        return Ok(());
    }

    let config = init_config(cli.config.as_deref());

    // 必须持有 guard，否则日志会丢失
    let _log_guard = init_logging(&config.logging)?;

    run_server().await
}
