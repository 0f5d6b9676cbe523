use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal nutrition assistant", long_about = None)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Recipe catalog CSV (overrides NUTRI_RECIPES_PATH)
    #[arg(long, global = true)]
    pub recipes: Option<PathBuf>,

    /// User profiles CSV (overrides NUTRI_USERS_PATH)
    #[arg(long, global = true)]
    pub users: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Search the recipe catalog
    Filter {
        /// Ingredients to favor, space or comma separated
        #[arg(short, long, default_value = "")]
        include: String,
        /// Ingredients or keywords to avoid
        #[arg(short, long, default_value = "")]
        exclude: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Generate a one-day meal plan for a user
    MealPlan {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        include: Option<String>,
        #[arg(short, long)]
        exclude: Option<String>,
    },
    /// Rewrite a catalog recipe for a user
    Personalize {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        recipe: String,
    },
}

impl Cli {
    /// Applies path overrides given on the command line.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.recipes {
            config.recipes_path = path.clone();
        }
        if let Some(path) = &self.users {
            config.users_path = path.clone();
        }
        if let Command::Serve { bind: Some(addr) } = &self.command {
            config.bind_addr = *addr;
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
