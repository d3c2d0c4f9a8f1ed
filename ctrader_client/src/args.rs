//! Command-line arguments for the spot client.
//!
//! Every credential can also come from the environment (or a `.env` file), so
//! the usual invocation needs no flags at all. See `config` for validation.
use clap::Parser;
use ctrader_common::net::Environment;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// OAuth application client id.
    #[clap(long, env = "CTRADER_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth application client secret.
    #[clap(long, env = "CTRADER_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth access token; must belong to the selected environment.
    #[clap(long, env = "CTRADER_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Environment the token and accounts belong to.
    #[clap(long = "env", env = "CTRADER_ENV", value_enum, ignore_case = true, default_value_t = Environment::Live)]
    pub environment: Environment,

    /// Instrument to stream, matched against symbol names and display names.
    #[clap(long, env = "CTRADER_SYMBOL", default_value = "EURUSD")]
    pub symbol: String,

    /// Include archived symbols in the symbols list request.
    #[clap(long)]
    pub include_archived: bool,

    /// Skip decoding and logging the access token claims.
    #[clap(long)]
    pub no_token_inspection: bool,
}
