pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::{ExpenseClient, ExpenseState, FileTokenStore};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "expense")]
#[command(about = "Expense CLI - track personal expenses against the Expense Tracker API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (defaults to EXPENSE_API_URL or http://localhost:3000)")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List your expenses")]
    List,

    #[command(about = "Show a single expense")]
    Get {
        #[arg(help = "Expense ID")]
        id: String,
    },

    #[command(about = "Add an expense")]
    Add {
        #[arg(long, help = "Title")]
        title: String,
        #[arg(long, help = "Category: Food, Travel, Work or Other")]
        category: String,
        #[arg(long, help = "Amount")]
        value: String,
    },

    #[command(about = "Edit an expense; omitted fields keep their current value")]
    Update {
        #[arg(help = "Expense ID")]
        id: String,
        #[arg(long, help = "Title")]
        title: Option<String>,
        #[arg(long, help = "Category: Food, Travel, Work or Other")]
        category: Option<String>,
        #[arg(long, help = "Amount")]
        value: Option<String>,
    },

    #[command(about = "Delete an expense")]
    Delete {
        #[arg(help = "Expense ID")]
        id: String,
    },

    #[command(about = "Check server health via the /health endpoint")]
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs to talk to the API
pub struct Session {
    pub client: ExpenseClient,
    pub state: ExpenseState,
    pub output: OutputFormat,
}

impl Session {
    pub fn open(server: Option<String>, output: OutputFormat) -> anyhow::Result<Self> {
        let url = server
            .or_else(|| std::env::var("EXPENSE_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let tokens = FileTokenStore::in_config_dir()?;
        let client = ExpenseClient::new(&url, Arc::new(tokens))?;

        Ok(Self {
            client,
            state: ExpenseState::new(),
            output,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, cli.server, output_format).await,
        Commands::Health => commands::expenses::health(Session::open(cli.server, output_format)?).await,
        Commands::List => commands::expenses::list(Session::open(cli.server, output_format)?).await,
        Commands::Get { id } => commands::expenses::get(Session::open(cli.server, output_format)?, &id).await,
        Commands::Add { title, category, value } => {
            let session = Session::open(cli.server, output_format)?;
            commands::expenses::add(session, title, category, value).await
        }
        Commands::Update { id, title, category, value } => {
            let session = Session::open(cli.server, output_format)?;
            commands::expenses::update(session, &id, title, category, value).await
        }
        Commands::Delete { id } => commands::expenses::delete(Session::open(cli.server, output_format)?, &id).await,
    }
}
