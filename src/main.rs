use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use coachplan::cli::{review::Confirmation, OutputFormat};

/// coachplan - Dietary conflict review for coaching plans
#[derive(Parser)]
#[command(name = "coachplan")]
#[command(about = "Review a meal plan against dietary restrictions", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every recipe of a plan and report the conflicts left to resolve
    Review {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Choose a substitute for a pending ingredient. Recipe and ingredient
        /// ids cannot contain ':'; the food id may
        #[arg(long, value_name = "RECIPE:INGREDIENT:FOOD")]
        confirm: Vec<Confirmation>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Classify one food of the plan's catalog against the client's profile
    Classify {
        /// Plan file (JSON)
        plan: PathBuf,

        #[arg(long)]
        food: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = coachplan::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize observability (tracing + logging)
    coachplan::observability::init_observability(
        "coachplan",
        env!("CARGO_PKG_VERSION"),
        &config.logging.level,
        config.logging.is_json(),
    )?;

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Review {
            plan,
            confirm,
            format,
        } => {
            coachplan::cli::review::review(&config, &plan, &confirm, format, &mut stdout)?;
        }
        Commands::Classify { plan, food, format } => {
            coachplan::cli::classify::classify(&plan, &food, format, &mut stdout)?
        }
    }

    Ok(())
}
