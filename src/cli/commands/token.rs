use anyhow::Context;
use clap::Subcommand;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{sign_claims, Claims};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token for a user id")]
    Issue {
        #[arg(long, help = "User id the token is issued for")]
        user: Uuid,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { user, hours } => {
            let config = AppConfig::from_env()?;
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = Claims::new(user, hours)?;
            let token = sign_claims(&config.security, &claims).context("failed to sign token")?;

            match output_format {
                OutputFormat::Text => output_value(&output_format, "token", &token),
                OutputFormat::Json => {
                    let expires_at = Utc.timestamp_opt(claims.exp, 0).single();
                    output_success(
                        &output_format,
                        "Token issued",
                        Some(json!({
                            "token": token,
                            "user": user,
                            "expires_at": expires_at,
                        })),
                    )
                }
            }
        }
    }
}
