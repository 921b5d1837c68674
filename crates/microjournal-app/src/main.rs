use clap::Parser;
use microjournal_infrastructure::logging;
use microjournal_lib::presentation::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    };

    if let Err(e) = logging::init_logger(config.log_dir.clone()) {
        eprintln!("Failed to initialize logger: {e}");
    }

    if let Err(e) = cli::run(cli, config).await {
        tracing::error!("❌ {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
