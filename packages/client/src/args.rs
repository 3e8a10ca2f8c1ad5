//! Command-line arguments.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "maeum-client", version, about = "Terminal client for the Maeum chat relay")]
pub struct ClientArgs {
    /// Server base URL
    #[arg(long, env = "MAEUM_URL", default_value = "http://127.0.0.1:3001")]
    pub url: String,

    /// Reuse an existing anonymous identity instead of requesting a new one
    #[arg(long)]
    pub user_id: Option<String>,

    /// Session room to join. Without it the client asks the server for a match.
    #[arg(long)]
    pub room: Option<String>,

    /// Display name shown to the partner
    #[arg(long)]
    pub name: Option<String>,
}
