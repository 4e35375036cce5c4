//! `choir config init` and `choir config show`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use choir_core::{config, AccountId, ChoirConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write ~/.choir/config.yaml.
    Init(InitArgs),
    /// Print the active configuration.
    Show,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Base URL of the CHOIR API (e.g. https://choir.example.org/api).
    #[arg(long)]
    pub server_url: String,

    /// CHOIR site the participant is enrolled in.
    #[arg(long)]
    pub site: String,

    /// Participant account id.
    #[arg(long)]
    pub account: String,

    /// Environment variable holding the bearer token.
    #[arg(long, default_value = config::DEFAULT_TOKEN_ENV)]
    pub token_env: String,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    match cmd {
        ConfigCommand::Init(args) => {
            let mut cfg = ChoirConfig::new(args.server_url, args.site, AccountId::from(args.account));
            cfg.token_env = args.token_env;
            let path = config::save_at(&home, &cfg).context("failed to write config")?;
            println!("✓ Wrote {}", path.display());
        }
        ConfigCommand::Show => {
            let cfg = config::load_at(&home)
                .context("failed to load config — run `choir config init` first")?;
            println!("server_url:      {}", cfg.server_url);
            println!("site:            {}", cfg.site_id);
            println!("account:         {}", cfg.account_id);
            println!("token_env:       {}", cfg.token_env);
            println!("participant_url: {}", cfg.participant_url());
        }
    }
    Ok(())
}
