//! `bidreg` - local driver for the dataset bid registry
//!
//! Keeps keypairs and registry state in a sled directory so the
//! register / offer / finalize cycle can be exercised from a shell.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bidregistry::claim::{ClaimBuildError, ClaimBuilder, ClaimCodec, ClaimEnvelope, CodecError};
use bidregistry::identity::{Identity, IdentityError, Keypair, Signer};
use bidregistry::multihash::{ContentAddresser, MultihashError, MultihashId};
use bidregistry::registry::{
    BidRegistry, InMemoryBalances, RegistryConfig, RegistryError, SystemClock,
};
use bidregistry::storage::{RegistryStore, StoreError};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

type Registry = BidRegistry<InMemoryBalances, SystemClock>;

#[derive(Parser, Debug)]
#[command(name = "bidreg", version, about = "Dataset bid registry")]
struct Cli {
    /// Directory holding keypairs and registry state
    #[arg(long, default_value = "bidreg-data")]
    data_dir: PathBuf,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a registry owned by a (new or existing) keypair label
    Init {
        #[arg(long)]
        owner: String,
    },
    /// Generate and store a keypair under a label
    Keygen { label: String },
    /// List stored keypairs with their identities and balances
    Accounts,
    /// Print the multihash of a file
    Address { file: PathBuf },
    /// Sign a dataset specification and print the claim id and audit envelope
    Claim {
        #[arg(long)]
        key: String,
        spec: PathBuf,
    },
    /// Audit a claim id against a specification and envelope
    Verify {
        spec: PathBuf,
        envelope: String,
        claim_id: String,
    },
    /// Credit an account (owner only)
    Deposit {
        #[arg(long = "as")]
        caller: String,
        account: String,
        amount: u64,
    },
    /// Register a bid
    Register {
        #[arg(long = "as")]
        caller: String,
        /// ISO-8601 expiry; defaults to now + --days
        #[arg(long)]
        expiry: Option<String>,
        #[arg(long, default_value_t = 60)]
        days: i64,
        #[arg(long)]
        claim: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        tag: String,
    },
    /// Place an offer against a bid
    Offer {
        #[arg(long = "as")]
        caller: String,
        offerer: String,
        bidder: String,
        bid_number: u64,
        value: u64,
    },
    /// Settle an offer on one of your bids, attaching the payment
    Finalize {
        #[arg(long = "as")]
        caller: String,
        offerer: String,
        bid_number: u64,
        offer_number: u64,
        #[arg(long)]
        pay: u64,
    },
    /// Show a bid
    Bidinfo { bidder: String, position: u64 },
    /// Show an account balance
    Balance { account: String },
    /// Show the registry owner
    Owner,
    /// Stop register/offer/finalize (owner only)
    Pause {
        #[arg(long = "as")]
        caller: String,
    },
    /// Resume after a pause (owner only)
    Unpause {
        #[arg(long = "as")]
        caller: String,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Build(#[from] ClaimBuildError),

    #[error(transparent)]
    Multihash(#[from] MultihashError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown account '{0}': not a stored label or a did")]
    UnknownAccount(String),

    #[error("Registry not initialized, run `bidreg init` first")]
    NotInitialized,

    #[error("Registry already initialized")]
    AlreadyInitialized,

    #[error("Claim audit failed: {0}")]
    AuditFailed(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let store = RegistryStore::open(&cli.data_dir)?;

    match cli.command {
        Command::Init { owner } => {
            if store.load_registry(SystemClock)?.is_some() {
                return Err(CliError::AlreadyInitialized);
            }
            let owner = load_or_create_keypair(&store, &owner)?.identity();
            let registry = Registry::new(
                owner.clone(),
                RegistryConfig::default(),
                InMemoryBalances::new(),
                SystemClock,
            )?;
            store.save_registry(&registry)?;
            println!("registry initialized, owner {}", owner);
        }
        Command::Keygen { label } => {
            let keypair = load_or_create_keypair(&store, &label)?;
            println!("{} {}", label, keypair.identity());
        }
        Command::Accounts => {
            let registry = store.load_registry(SystemClock)?;
            for label in store.keypair_labels()? {
                let identity = resolve(&store, &label)?;
                let balance = registry.as_ref().map(|r| r.balance_of(&identity)).unwrap_or(0);
                println!("{:<16} {} {}", label, identity, balance);
            }
        }
        Command::Address { file } => {
            let content = read_file(&file)?;
            println!("{}", ContentAddresser::address_of(&content));
        }
        Command::Claim { key, spec } => {
            let keypair = store
                .load_keypair(&key)?
                .ok_or_else(|| CliError::UnknownAccount(key.clone()))?;
            let specification = read_file(&spec)?;
            let claim = ClaimBuilder::new()
                .specification(&specification)
                .signer(&keypair)
                .build()?;
            let envelope = ClaimEnvelope::new(claim.clone(), keypair.public_key());
            println!("claim id: {}", claim.id());
            println!("envelope: {}", ClaimCodec::encode_hex(&envelope)?);
        }
        Command::Verify {
            spec,
            envelope,
            claim_id,
        } => {
            let specification = read_file(&spec)?;
            let envelope = ClaimCodec::decode_hex(&envelope)?;
            let claim_id: MultihashId = claim_id.parse()?;
            envelope
                .audit(&specification, &claim_id)
                .map_err(|e| CliError::AuditFailed(e.to_string()))?;
            println!("claim {} verified", claim_id);
        }
        Command::Deposit {
            caller,
            account,
            amount,
        } => {
            let caller = resolve(&store, &caller)?;
            let account = resolve(&store, &account)?;
            with_registry(&store, |registry| {
                registry.deposit(&caller, &account, amount)?;
                println!("{} balance {}", account, registry.balance_of(&account));
                Ok(())
            })?;
        }
        Command::Register {
            caller,
            expiry,
            days,
            claim,
            amount,
            tag,
        } => {
            let caller = resolve(&store, &caller)?;
            let expiry =
                expiry.unwrap_or_else(|| (Utc::now() + Duration::days(days)).to_rfc3339());
            with_registry(&store, |registry| {
                let event = registry.register(&caller, &expiry, &claim, amount, &tag)?;
                println!(
                    "bid registered: who={} position={}",
                    event.who, event.position
                );
                Ok(())
            })?;
        }
        Command::Offer {
            caller,
            offerer,
            bidder,
            bid_number,
            value,
        } => {
            let caller = resolve(&store, &caller)?;
            let offerer = resolve(&store, &offerer)?;
            let bidder = resolve(&store, &bidder)?;
            with_registry(&store, |registry| {
                let placed = registry.offer(&caller, &offerer, &bidder, bid_number, value)?;
                println!(
                    "offer placed: offerer={} bidder={} bid={} offer={} value={}",
                    placed.offerer,
                    placed.bidder,
                    placed.bid_number,
                    placed.offer_number,
                    placed.value
                );
                Ok(())
            })?;
        }
        Command::Finalize {
            caller,
            offerer,
            bid_number,
            offer_number,
            pay,
        } => {
            let caller = resolve(&store, &caller)?;
            let offerer = resolve(&store, &offerer)?;
            with_registry(&store, |registry| {
                let settled = registry.finalize(&caller, &offerer, bid_number, offer_number, pay)?;
                println!(
                    "bid {} finalized: paid {} to {}",
                    settled.bid_number, settled.value, settled.offerer
                );
                Ok(())
            })?;
        }
        Command::Bidinfo { bidder, position } => {
            let bidder = resolve(&store, &bidder)?;
            let registry = load_registry(&store)?;
            let info = registry.bidinfo(&bidder, position)?;
            let status = registry.bid_status(&bidder, position)?;
            println!("expiry:   {}", info.expiry_date);
            println!("claim id: {}", info.claim_id);
            println!("amount:   {}", info.amount);
            println!("tag:      {}", info.tag);
            println!("status:   {:?}", status);
        }
        Command::Balance { account } => {
            let account = resolve(&store, &account)?;
            let registry = load_registry(&store)?;
            println!("{}", registry.balance_of(&account));
        }
        Command::Owner => {
            let registry = load_registry(&store)?;
            println!("{}", registry.owner());
        }
        Command::Pause { caller } => {
            let caller = resolve(&store, &caller)?;
            with_registry(&store, |registry| Ok(registry.pause(&caller)?))?;
            println!("registry paused");
        }
        Command::Unpause { caller } => {
            let caller = resolve(&store, &caller)?;
            with_registry(&store, |registry| Ok(registry.unpause(&caller)?))?;
            println!("registry unpaused");
        }
    }

    store.flush()?;
    Ok(())
}

fn load_registry(store: &RegistryStore) -> Result<Registry, CliError> {
    store
        .load_registry(SystemClock)?
        .ok_or(CliError::NotInitialized)
}

/// Load, mutate, and save back; nothing is saved if `f` fails
fn with_registry<F>(store: &RegistryStore, f: F) -> Result<(), CliError>
where
    F: FnOnce(&mut Registry) -> Result<(), CliError>,
{
    let mut registry = load_registry(store)?;
    f(&mut registry)?;
    store.save_registry(&registry)?;
    Ok(())
}

fn load_or_create_keypair(store: &RegistryStore, label: &str) -> Result<Keypair, CliError> {
    if let Some(keypair) = store.load_keypair(label)? {
        return Ok(keypair);
    }
    let keypair = Keypair::generate();
    store.save_keypair(label, &keypair)?;
    tracing::info!(label, identity = %keypair.identity(), "keypair created");
    Ok(keypair)
}

/// A stored label or a literal did
fn resolve(store: &RegistryStore, account: &str) -> Result<Identity, CliError> {
    if account.starts_with("did:") {
        return Ok(Identity::parse(account)?);
    }
    store
        .load_keypair(account)?
        .map(|kp| kp.identity())
        .ok_or_else(|| CliError::UnknownAccount(account.to_string()))
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
