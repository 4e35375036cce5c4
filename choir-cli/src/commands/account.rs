//! `choir account` — cached participant details and account lifecycle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tokio::sync::broadcast::{self, error::RecvError};

use choir_client::{EnvToken, HttpParticipantClient, MockParticipantService};
use choir_core::{
    config, AccountDetails, AccountId, AccountKey, AccountModifications, ChoirConfig, Participant,
    ParticipantClient, PersonName,
};
use choir_sync::{
    AccountStorageProvider, BroadcastNotifier, ChoirStorageProvider, DetailsChanged, FileCache,
};

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Print cached details, then the result of a background refresh.
    Show(ShowArgs),
    /// Push changed attributes to the participant record.
    Update(UpdateArgs),
    /// Forget local details for the account. The remote record is kept.
    SignOut,
    /// Forget local details and unenroll the participant.
    Unenroll,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Print cached details only; do not wait for the refresh.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub given_name: Option<String>,

    #[arg(long)]
    pub family_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, conflicts_with = "clear_phone")]
    pub phone: Option<String>,

    /// Remove the phone number from the record.
    #[arg(long)]
    pub clear_phone: bool,
}

pub fn run(cmd: AccountCommand, mock: bool) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let cfg = config::load_at(&home)
        .context("failed to load config — run `choir config init` first")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(async {
        let session = Session::open(&home, &cfg, mock)?;
        match cmd {
            AccountCommand::Show(args) => session.show(args).await,
            AccountCommand::Update(args) => session.update(args).await,
            AccountCommand::SignOut => session.sign_out().await,
            AccountCommand::Unenroll => session.unenroll().await,
        }
    });
    // Do not block exit on a refresh that is still waiting for the network.
    runtime.shutdown_background();
    result
}

/// Provider wiring for one invocation.
struct Session {
    account_id: AccountId,
    provider: ChoirStorageProvider,
    cache: Arc<FileCache>,
    notifier: Arc<BroadcastNotifier>,
    refresh_wait: Duration,
}

impl Session {
    fn open(home: &Path, cfg: &ChoirConfig, mock: bool) -> Result<Self> {
        let cache_dir = config::cache_dir_at(home);
        let cache = Arc::new(FileCache::open(&cache_dir).with_context(|| {
            format!("failed to open attribute cache at {}", cache_dir.display())
        })?);
        let notifier = Arc::new(BroadcastNotifier::default().with_write_through(cache.clone()));

        let client: Arc<dyn ParticipantClient> = if mock {
            tracing::info!(account_id = %cfg.account_id, "using in-memory participant service");
            Arc::new(mock_service(&cfg.account_id, &cache))
        } else {
            let tokens = Arc::new(EnvToken::new(cfg.token_env.clone()));
            Arc::new(HttpParticipantClient::new(cfg, tokens))
        };

        let provider =
            ChoirStorageProvider::new(client, cache.clone(), notifier.clone(), cache.clone());
        Ok(Self {
            account_id: cfg.account_id.clone(),
            provider,
            cache,
            notifier,
            refresh_wait: cfg.refresh_wait(),
        })
    }

    async fn show(&self, args: ShowArgs) -> Result<()> {
        // Subscribe before loading so the refresh event cannot be missed.
        let mut changes = self.notifier.subscribe();
        let cached = self.provider.load(&self.account_id, &AccountKey::ALL).await;

        if args.no_wait {
            return print_details(&self.account_id, "cached", cached.as_ref(), args.json);
        }
        if !args.json {
            print_details(&self.account_id, "cached", cached.as_ref(), false)?;
        }

        match wait_for_refresh(&mut changes, &self.account_id, self.refresh_wait).await {
            Some(details) => {
                if details == AccountDetails::degraded(&self.account_id) {
                    eprintln!(
                        "{}",
                        "warning: could not reload account details; local copy was reset"
                            .yellow()
                    );
                }
                if !args.json {
                    println!();
                }
                print_details(&self.account_id, "refreshed", Some(&details), args.json)
            }
            None => {
                eprintln!(
                    "{}",
                    format!(
                        "refresh did not finish within {}ms; showing cached details",
                        self.refresh_wait.as_millis()
                    )
                    .yellow()
                );
                if args.json {
                    print_details(&self.account_id, "cached", cached.as_ref(), true)?;
                }
                Ok(())
            }
        }
    }

    async fn update(&self, args: UpdateArgs) -> Result<()> {
        let current = self.cache.get(&self.account_id).unwrap_or_default();
        let mut modified = AccountDetails::new();

        if args.given_name.is_some() || args.family_name.is_some() {
            let existing = current.name().cloned().unwrap_or_default();
            modified = modified.with_name(PersonName::new(
                args.given_name.or(existing.given_name),
                args.family_name.or(existing.family_name),
            ));
        }
        if let Some(email) = args.email {
            modified = modified.with_email(email);
        }
        if let Some(phone) = args.phone {
            modified = modified.with_phone_number(phone);
        }

        let mut modifications = AccountModifications::new(modified);
        if args.clear_phone {
            modifications = modifications.removing(AccountKey::PhoneNumber);
        }
        if modifications.is_empty() {
            bail!("nothing to update; pass --given-name, --family-name, --email, --phone or --clear-phone");
        }

        self.provider
            .store_modifications(&self.account_id, modifications)
            .await
            .context("failed to update participant record")?;
        println!("✓ Updated account {}", self.account_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.provider.disassociate(&self.account_id).await;
        println!("✓ Signed out; local details for {} removed", self.account_id);
        Ok(())
    }

    async fn unenroll(&self) -> Result<()> {
        self.provider
            .delete(&self.account_id)
            .await
            .context("failed to unenroll participant (local details were already removed)")?;
        println!("✓ Unenrolled {}", self.account_id);
        Ok(())
    }
}

/// The mock keeps nothing between runs, so it is seeded from the last cached
/// bag. Without one it serves the demo participant.
fn mock_service(account_id: &AccountId, cache: &FileCache) -> MockParticipantService {
    let participant = cache
        .get(account_id)
        .filter(|details| *details != AccountDetails::degraded(account_id))
        .map(|details| Participant::from_account_details(&details))
        .unwrap_or_else(MockParticipantService::demo_participant);
    MockParticipantService::new().with_participant(account_id.clone(), participant)
}

async fn wait_for_refresh(
    changes: &mut broadcast::Receiver<DetailsChanged>,
    account_id: &AccountId,
    wait: Duration,
) -> Option<AccountDetails> {
    let next = async {
        loop {
            match changes.recv().await {
                Ok(event) if event.account_id == *account_id => return Some(event.details),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(wait, next).await.ok().flatten()
}

fn print_details(
    account_id: &AccountId,
    label: &str,
    details: Option<&AccountDetails>,
    json: bool,
) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&details).context("failed to render account JSON")?
        );
        return Ok(());
    }

    println!("{} ({label})", account_id.to_string().bold());
    let Some(details) = details else {
        println!("  {}", "no cached details".dimmed());
        return Ok(());
    };
    for key in AccountKey::ALL {
        if let Some(value) = display_value(details, key) {
            println!("  {:<24} {}", key.as_str(), value);
        }
    }
    Ok(())
}

fn display_value(details: &AccountDetails, key: AccountKey) -> Option<String> {
    match key {
        AccountKey::UserId => details.user_id().map(str::to_owned),
        AccountKey::Name => details.name().map(PersonName::formatted),
        AccountKey::Email => details.email().map(str::to_owned),
        AccountKey::PhoneNumber => details.phone_number().map(str::to_owned),
        AccountKey::Organization => details.organization().map(str::to_owned),
        AccountKey::AddressStreet => details.address_street().map(str::to_owned),
        AccountKey::AddressCity => details.address_city().map(str::to_owned),
        AccountKey::AddressState => details.address_state().map(str::to_owned),
        AccountKey::AddressPostalCode => details.address_postal_code().map(str::to_owned),
        AccountKey::PreferredCommunication => {
            details.preferred_communication().map(|p| p.to_string())
        }
    }
}
