//! daoscope CLI: fetch, balance, proposal, members.

use clap::{Parser, Subcommand};
use daoscope::{
    DaoConfig, GovernanceViews, LogQuery, MirrorClient, MirrorConfig, ResponseCache,
};
use std::path::PathBuf;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Fetch(args) => run_fetch(args),
        Command::Balance(args) => run_balance(args),
        Command::Proposal(args) => run_proposal(args),
        Command::Members(args) => run_members(args),
    }
}

#[derive(Parser)]
#[command(name = "daoscope")]
#[command(about = "DAO governance read-state from mirror-node contract event logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a contract's event logs into the response cache.
    Fetch(FetchArgs),
    /// Current locked governance-token balance for an account.
    Balance(BalanceArgs),
    /// Lifecycle status of a proposal.
    Proposal(ProposalArgs),
    /// Current multisig owner set and signing threshold.
    Members(MembersArgs),
}

#[derive(Parser)]
struct FetchArgs {
    #[arg(long)]
    contract: String,
    /// Inclusive consensus-timestamp lower bound (seconds.nanoseconds).
    #[arg(long)]
    from: Option<String>,
    /// Inclusive consensus-timestamp upper bound.
    #[arg(long)]
    to: Option<String>,
    /// Drop cached responses older than this many days before fetching.
    #[arg(long)]
    purge_older_than_days: Option<u64>,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    #[arg(long)]
    mirror_url: Option<String>,
}

#[derive(Parser)]
struct BalanceArgs {
    /// Account id (`shard.realm.num`) or EVM address.
    #[arg(long)]
    account: String,
    /// Override the configured gov-token holder contract.
    #[arg(long)]
    contract: Option<String>,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    #[arg(long)]
    mirror_url: Option<String>,
}

#[derive(Parser)]
struct ProposalArgs {
    #[arg(long)]
    id: u128,
    /// Override the configured governor contract.
    #[arg(long)]
    contract: Option<String>,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    #[arg(long)]
    mirror_url: Option<String>,
}

#[derive(Parser)]
struct MembersArgs {
    /// Override the configured safe contract.
    #[arg(long)]
    contract: Option<String>,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    #[arg(long)]
    mirror_url: Option<String>,
}

fn cache_path(cache_dir: &std::path::Path) -> PathBuf {
    cache_dir.join("cache.sqlite")
}

fn mirror_client(
    cache_dir: &std::path::Path,
    offline: bool,
    mirror_url: Option<String>,
    config: &DaoConfig,
) -> Result<MirrorClient, Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(cache_dir))?;
    let mut mirror = MirrorConfig {
        offline,
        ..Default::default()
    };
    if let Some(url) = mirror_url.or_else(|| config.mirror_base_url.clone()) {
        mirror.base_url = url;
    }
    Ok(MirrorClient::new(mirror, Some(cache))?)
}

fn report_diagnostics(diagnostics: &daoscope::Diagnostics) {
    for entry in diagnostics.entries() {
        warn!(?entry, "skipped during decode");
    }
}

fn run_fetch(args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(&args.cache_dir))?;
    if let Some(days) = args.purge_older_than_days {
        let cutoff = time::OffsetDateTime::now_utc().unix_timestamp() - (days * 86_400) as i64;
        let dropped = cache.purge_older_than(cutoff)?;
        info!(dropped, "purged stale cache entries");
    }
    let config = DaoConfig::load();
    let mut mirror = MirrorConfig {
        offline: args.offline,
        ..Default::default()
    };
    if let Some(url) = args.mirror_url.or_else(|| config.mirror_base_url.clone()) {
        mirror.base_url = url;
    }
    let client = MirrorClient::new(mirror, Some(cache))?;
    let query = LogQuery {
        contract: args.contract,
        from: args.from,
        to: args.to,
        ..Default::default()
    };
    let rt = tokio::runtime::Runtime::new()?;
    let logs = rt.block_on(client.contract_logs(&query))?;
    info!(
        count = logs.len(),
        requests = client.request_count(),
        "fetch complete"
    );
    Ok(())
}

fn run_balance(args: BalanceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DaoConfig::load();
    if let Some(contract) = args.contract {
        config.gov_token_holder_contract = contract;
    }
    let client = mirror_client(&args.cache_dir, args.offline, args.mirror_url, &config)?;
    let views = GovernanceViews::new(client, config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let (balance, diagnostics) = rt.block_on(views.locked_token_balance(&args.account))?;
    report_diagnostics(&diagnostics);
    println!("{balance}");
    Ok(())
}

fn run_proposal(args: ProposalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DaoConfig::load();
    if let Some(contract) = args.contract {
        config.governor_contract = contract;
    }
    let client = mirror_client(&args.cache_dir, args.offline, args.mirror_url, &config)?;
    let views = GovernanceViews::new(client, config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let (status, diagnostics) = rt.block_on(views.proposal_state(args.id))?;
    report_diagnostics(&diagnostics);
    println!("{status}");
    Ok(())
}

fn run_members(args: MembersArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DaoConfig::load();
    if let Some(contract) = args.contract {
        config.safe_contract = contract;
    }
    let client = mirror_client(&args.cache_dir, args.offline, args.mirror_url, &config)?;
    let views = GovernanceViews::new(client, config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let (members, diagnostics) = rt.block_on(views.dao_membership())?;
    report_diagnostics(&diagnostics);
    println!("{}", serde_json::to_string_pretty(&members)?);
    Ok(())
}
