use clap::Parser;
use ricedb::cli::{self, Cli};
use ricedb::config::Config;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may be set directly.
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = cli::run(cli, &config).await {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
