use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the configuration the server would start with (secret redacted)")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = AppConfig::from_env()?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                OutputFormat::Text => {
                    println!("Environment:     {:?}", config.environment);
                    println!("Port:            {}", config.api.port);
                    println!("Max body bytes:  {}", config.api.max_request_size_bytes);
                    println!(
                        "Store:           {}",
                        if config.database.url.is_some() { "postgres" } else { "memory" }
                    );
                    println!("Max connections: {}", config.database.max_connections);
                    println!("Token expiry:    {}h", config.security.jwt_expiry_hours);
                    println!("CORS:            {}", config.security.enable_cors);
                    println!("JWT secret:      <redacted>");
                }
            }

            Ok(())
        }
    }
}
