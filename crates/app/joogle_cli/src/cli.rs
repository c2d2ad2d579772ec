use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "joogle", version, about = "Joogle search console")]
pub struct Cli {
    /// Base URL of the indexing/analytics API.
    #[arg(long, global = true, env = "JOOGLE_API_URL")]
    pub api_url: Option<String>,

    /// Access token of the signed-in user; omit to run signed out.
    #[arg(long, global = true, env = "JOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print version
    Version,

    /// Sample the indexing status and print queue tendency
    Status {
        /// Stop after this many samples; 0 runs until interrupted.
        #[arg(long, default_value_t = 1)]
        ticks: u64,
    },

    /// List the domains owned by the signed-in user
    Domains,

    /// Request the TXT record that proves ownership of a domain
    Claim { domain: String },

    /// Check the TXT record of a domain and register it when verified
    Verify { domain: String },

    /// Show indexing analytics for an owned domain
    Analytics { domain: String },

    /// Queue URLs for crawling
    Index {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}
