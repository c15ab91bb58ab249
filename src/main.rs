use anyhow::Context;
use clap::Parser;

use devicematcher::cli::{Cli, Commands};
use devicematcher::config::{StaticConfig, init_config};
use devicematcher::runtime::modes::{run_parse, run_server};
use devicematcher::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command() {
        Commands::ConfigGen { output_path } => {
            let sample = StaticConfig::generate_sample_config();
            match output_path {
                Some(path) => {
                    std::fs::write(&path, sample)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Sample configuration written to {}", path.display());
                }
                None => print!("{}", sample),
            }
            Ok(())
        }
        Commands::Parse {
            user_agent,
            strategy,
        } => {
            let config = init_config(cli.config.as_deref())?;
            run_parse(&user_agent, strategy.unwrap_or(config.parser.strategy))
        }
        Commands::Serve => {
            let config = init_config(cli.config.as_deref())?;
            // guard 必须存活到进程结束，保证日志落盘
            let _guard = init_logging(&config.logging)?;
            run_server().await
        }
    }
}
