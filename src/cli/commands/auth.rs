use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::{output_error, output_success};
use crate::cli::{OutputFormat, Session};
use crate::client::{FileTokenStore, TokenProvider};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Store a bearer token for subsequent commands")]
    Login {
        #[arg(help = "JWT issued for your account")]
        token: String,
    },

    #[command(about = "Forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Sign a token locally with SECURITY_JWT_SECRET (development)")]
    Mint {
        #[arg(long, help = "User ID for the `sub` claim (random if omitted)")]
        user: Option<Uuid>,
        #[arg(long, help = "Store the minted token as the current login")]
        save: bool,
    },
}

pub async fn handle(cmd: AuthCommands, server: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = FileTokenStore::in_config_dir()?;

    match cmd {
        AuthCommands::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                output_error(&output_format, "Token must not be empty", Some("EMPTY_TOKEN"))?;
                anyhow::bail!("Token must not be empty");
            }
            store.save(token)?;
            output_success(
                &output_format,
                &format!("Token saved to {}", store.path().display()),
                None,
            )
        }
        AuthCommands::Logout => {
            store.clear()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => status(store, server, output_format).await,
        AuthCommands::Mint { user, save } => {
            let settings = &crate::config::config().security;
            let user_id = user.unwrap_or_else(Uuid::new_v4);
            let claims = Claims::new(user_id, settings.jwt_expiry_hours)?;
            let token = generate_jwt(&claims, &settings.jwt_secret)?;

            if save {
                store.save(&token)?;
            }

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token minted",
                    Some(json!({ "token": token, "user_id": user_id, "expires_at": claims.exp, "saved": save })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    if save {
                        eprintln!("✓ Saved for user {}", user_id);
                    }
                    Ok(())
                }
            }
        }
    }
}

/// Report whether a token is stored and what the server makes of it
async fn status(store: FileTokenStore, server: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let has_token = store.token()?.is_some();

    let mut session = Session::open(server, output_format.clone())?;
    session.state.refresh(&session.client).await;

    let connection = session.state.status();
    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            connection.message(),
            Some(json!({
                "server": session.client.base_url().as_str(),
                "token_stored": has_token,
                "status": connection,
            })),
        ),
        OutputFormat::Text => {
            println!("Server: {}", session.client.base_url());
            println!("Token:  {}", if has_token { "stored" } else { "none" });
            println!("Status: {}", connection.message());
            Ok(())
        }
    }
}
