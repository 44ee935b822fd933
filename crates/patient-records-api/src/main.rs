use anyhow::Result;
use clap::Parser;
use patient_records_api::{commands, logging, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    logging::init(&config.log_filter)?;
    tracing::debug!(config = %serde_json::to_string(&config)?, "configuration loaded");

    match cli.command() {
        Command::Serve { bind } => commands::serve(&config, bind).await?,
        Command::Import {
            file,
            skip_existing,
        } => {
            let report = commands::import(&config, &file, skip_existing)?;
            println!(
                "Imported {} patients ({} skipped)",
                report.imported, report.skipped
            );
        }
        Command::Export { file } => {
            let count = commands::export(&config, &file)?;
            println!("Exported {} patients to {}", count, file.display());
        }
    }

    Ok(())
}
