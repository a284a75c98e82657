mod import;
mod runs;
mod settings;

use clap::{Parser, Subcommand};

use crate::{runs::RunsCommands, settings::SettingsCommands};

#[derive(Debug, Parser)]
#[command(name = "bottomline-cli")]
#[command(about = "Yotpo bottomline ratings importer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one import in the foreground
    Import {
        /// Page to start from (1-based)
        #[arg(long, default_value = "1")]
        start_page: u32,
    },
    /// Show or change the stored Yotpo settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Inspect the import run ledger
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("bottomline-cli: no command given; see --help");
        return Ok(());
    };

    let config = bottomline_core::load_app_config()?;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = bottomline_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Import { start_page } => import::run_import(&pool, &config, start_page).await?,
        Commands::Settings { command } => match command {
            SettingsCommands::Show => settings::run_settings_show(&pool).await?,
            SettingsCommands::Set {
                api_key,
                api_secret,
                frequency,
            } => {
                settings::run_settings_set(
                    &pool,
                    api_key.as_deref(),
                    api_secret.as_deref(),
                    frequency,
                )
                .await?;
            }
        },
        Commands::Runs { command } => match command {
            RunsCommands::List { limit } => runs::run_runs_list(&pool, i64::from(limit)).await?,
        },
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                bottomline_db::ping(&pool).await?;
                println!("database reachable");
            }
            DbCommands::Migrate => {
                let applied = bottomline_db::run_migrations(&pool).await?;
                println!("migrations applied ({applied} total)");
            }
        },
    }

    Ok(())
}
