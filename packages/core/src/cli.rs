use clap::Parser;

/// MQ warning center CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "mq-warn-center",
    version,
    about = "Per-user warning records for the message-queue console"
)]
pub struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// HTTP port to listen on (overrides API_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Apply command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut crate::config::Config) {
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(port) = self.port {
            config.api_port = port;
        }
    }
}
