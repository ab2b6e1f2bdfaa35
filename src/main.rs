use anyhow::Context;
use clap::{Parser, Subcommand};
use customer_demography::config::AppConfig;
use customer_demography::dashboard::Dashboard;
use customer_demography::processing::JoinPolicy;
use customer_demography::{data, render, sample, server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render the dashboard with default filters to a standalone HTML file
    Snapshot {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,

        #[arg(short, long, value_name = "FILE", default_value = "dashboard.html")]
        output: PathBuf,
    },
    /// Write a dummy customer table and province coordinate table
    Sample {
        #[arg(short, long, value_name = "DIR", default_value = "data")]
        output_dir: PathBuf,

        #[arg(short, long, default_value_t = 1000)]
        rows: usize,

        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
}

fn build_dashboard(config: &AppConfig) -> anyhow::Result<Dashboard> {
    let dataset = data::load_data(&config.input).context("Failed to load input data")?;
    let policy = if config.input.strict_join {
        JoinPolicy::Strict
    } else {
        JoinPolicy::Lenient
    };
    let dashboard = Dashboard::new(dataset, config.dashboard.clone(), policy)?;
    Ok(dashboard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!(config = ?config, "Serving dashboard");
            let app_config = AppConfig::load_from_file(config)?;
            let dashboard = build_dashboard(&app_config)?;

            server::start_server(app_config, dashboard).await?;
        }
        Commands::Snapshot { config, output } => {
            info!(config = ?config, "Rendering snapshot");
            let app_config = AppConfig::load_from_file(config)?;
            let dashboard = build_dashboard(&app_config)?;

            let view = dashboard.render(&dashboard.new_session().snapshot());
            render::write_page(output, &view)?;
        }
        Commands::Sample {
            output_dir,
            rows,
            seed,
        } => {
            let (customers, coordinates) = sample::write_sample(output_dir, *rows, *seed)?;
            info!(customers = ?customers, coordinates = ?coordinates, "Sample data ready");
        }
    }

    Ok(())
}
