use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hermes_config::{load_layered_yaml, secrets::resolve_auth, ToolsConfig};
use hermes_management::{AuthHeader, ClientConfig, ManagementClient};
use hermes_reconcile::Migrator;
use hermes_tree::maxrate::{missing_max_rate, MaxRateCleaner};
use hermes_tree::owner::{migrate_owners, OwnershipPlan};
use hermes_tree::support_team::fix_support_team;
use hermes_tree::{ensure_prefix, DeletePacing, TreeLayout, ZkTree};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hermes-tools")]
#[command(about = "Hermes control-plane migration and maintenance tools", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (later files override earlier ones)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy groups, topics and schemas from one management service to another
    Migrate(MigrateArgs),

    /// Remove stale nodes from the consumers max-rate tree
    MaxRateClean(MaxRateArgs),

    /// Reassign topic / subscription owners from a CSV file
    OwnerMigrate(OwnerArgs),

    /// Set supportTeam on subscriptions that lack it
    FixSupportTeam(SupportTeamArgs),

    /// Compute layered config hash + print canonical JSON
    ConfigHash,
}

#[derive(Args)]
struct MigrateArgs {
    /// Source management base URL
    #[arg(long, short = 's')]
    source: Option<String>,

    /// Destination management base URL
    #[arg(long, short = 'd')]
    destination: Option<String>,

    /// Authorization header name sent on destination writes
    #[arg(long, short = 'a')]
    auth_header: Option<String>,

    /// Authorization header value (prefer --auth-key-env)
    #[arg(long, short = 'k', conflicts_with = "auth_key_env")]
    auth_key: Option<String>,

    /// Name of the env var holding the authorization header value
    #[arg(long)]
    auth_key_env: Option<String>,

    /// Decide and log every action without issuing writes
    #[arg(long, alias = "dryrun", default_value_t = false)]
    dry_run: bool,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the full report as JSON instead of key=value lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct TreeArgs {
    /// Coordination service connection string
    #[arg(long, short = 'z')]
    zookeeper: Option<String>,

    /// Path prefix of the management tree
    #[arg(long, short = 'p')]
    prefix: Option<String>,
}

#[derive(Args)]
struct MaxRateArgs {
    #[command(flatten)]
    tree: TreeArgs,

    /// Clean up the max-rate tree at subscription level
    #[arg(long, default_value_t = false)]
    fix_subscriptions: bool,

    /// Clean up the max-rate tree at consumer level
    #[arg(long, default_value_t = false)]
    fix_consumers: bool,

    /// Write changes to the coordination service (default: report only)
    #[arg(long, default_value_t = false)]
    save: bool,

    /// Required with --save: the literal string "SAVE <prefix>"
    #[arg(long)]
    confirm: Option<String>,

    /// Pause after each delete, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Args)]
struct OwnerArgs {
    #[command(flatten)]
    tree: TreeArgs,

    /// CSV file: Topic,Subscription,Owner Source,Owner ID
    #[arg(long, short = 's')]
    source: String,

    #[arg(long, alias = "dryrun", default_value_t = false)]
    dry_run: bool,
}

#[derive(Args)]
struct SupportTeamArgs {
    #[command(flatten)]
    tree: TreeArgs,

    #[arg(long, alias = "dryrun", default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli.config_paths)?;

    match cli.cmd {
        Commands::Migrate(args) => run_migrate(args, &config),
        Commands::MaxRateClean(args) => run_max_rate_clean(args, &config),
        Commands::OwnerMigrate(args) => run_owner_migrate(args, &config),
        Commands::FixSupportTeam(args) => run_fix_support_team(args, &config),
        Commands::ConfigHash => {
            let path_refs: Vec<&str> = cli.config_paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries only the command result.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(paths: &[String]) -> Result<ToolsConfig> {
    if paths.is_empty() {
        return Ok(ToolsConfig::default());
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    info!(config_hash = %loaded.config_hash, "configuration loaded");
    Ok(loaded.tools)
}

// ---------------------------------------------------------------------------
// migrate
// ---------------------------------------------------------------------------

fn run_migrate(args: MigrateArgs, config: &ToolsConfig) -> Result<()> {
    let m = &config.management;
    let source = args
        .source
        .or_else(|| m.source_url.clone())
        .context("missing --source (or management.source_url)")?;
    let destination = args
        .destination
        .or_else(|| m.destination_url.clone())
        .context("missing --destination (or management.destination_url)")?;
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(m.timeout_secs));

    let auth = match args.auth_header.or_else(|| m.auth_header.clone()) {
        Some(header) => {
            let value_env = args.auth_key_env.as_deref().or(m.auth_value_env.as_deref());
            let resolved = resolve_auth(&header, args.auth_key.as_deref(), value_env)?;
            Some(AuthHeader::new(resolved.header, resolved.value))
        }
        None if args.auth_key.is_some() || args.auth_key_env.is_some() => {
            bail!("--auth-key / --auth-key-env require --auth-header")
        }
        None => None,
    };
    if auth.is_none() && !args.dry_run {
        warn!("no auth header configured; destination writes are sent unauthenticated");
    }

    let source_client = ManagementClient::new(ClientConfig::new(&source).with_timeout(timeout))
        .context("source client")?;
    let mut destination_config = ClientConfig::new(&destination).with_timeout(timeout);
    if let Some(auth) = auth {
        destination_config = destination_config.with_auth(auth);
    }
    let destination_client =
        ManagementClient::new(destination_config).context("destination client")?;

    let report = Migrator::new(&source_client, &destination_client, args.dry_run)
        .run()
        .with_context(|| format!("listing source {source} failed"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("run_id={}", report.run_id);
        println!("dry_run={}", report.dry_run);
        println!("{}", report.summary_line());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// coordination-tree tools
// ---------------------------------------------------------------------------

struct TreeTarget {
    connect: String,
    layout: TreeLayout,
}

fn tree_target(args: &TreeArgs, config: &ToolsConfig) -> Result<TreeTarget> {
    let c = &config.coordination;
    let connect = args
        .zookeeper
        .clone()
        .or_else(|| c.connect.clone())
        .context("missing --zookeeper (or coordination.connect)")?;
    let prefix = args.prefix.clone().unwrap_or_else(|| c.prefix.clone());
    Ok(TreeTarget {
        connect,
        layout: TreeLayout::new(prefix),
    })
}

/// `--save` needs `--confirm "SAVE <prefix>"` typed out for the exact prefix.
fn require_save_confirmation(prefix: &str, confirm: Option<&str>) -> Result<()> {
    let expected = format!("SAVE {prefix}");
    if confirm != Some(expected.as_str()) {
        bail!("REFUSING SAVE: re-run with --confirm \"{expected}\"");
    }
    Ok(())
}

/// Tree tools are async; the migrate path stays fully blocking.
fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("tokio runtime build failed")?;
    Ok(rt.block_on(fut))
}

async fn connect(target: &TreeTarget) -> Result<ZkTree> {
    let tree = ZkTree::connect(&target.connect).await?;
    ensure_prefix(&tree, &target.layout).await?;
    Ok(tree)
}

fn run_max_rate_clean(args: MaxRateArgs, config: &ToolsConfig) -> Result<()> {
    let target = tree_target(&args.tree, config)?;
    if !args.fix_subscriptions && !args.fix_consumers {
        println!("nothing_to_do=true");
        return Ok(());
    }
    if args.save {
        require_save_confirmation(target.layout.prefix(), args.confirm.as_deref())?;
    }
    let delay_ms = args.delay_ms.unwrap_or(config.coordination.delete_delay_ms);
    let pacing = DeletePacing::new(Duration::from_millis(delay_ms));

    block_on(async {
        let tree = connect(&target).await?;
        let cleaner = MaxRateCleaner::new(&tree, &target.layout, pacing, args.save);

        if args.fix_subscriptions {
            let scan = cleaner.scan_subscriptions().await?;
            let max_rate = cleaner.max_rate_subscriptions().await?;
            let report = cleaner.clean_subscriptions(&scan.active, &max_rate).await?;
            let missing = missing_max_rate(&scan.active, &max_rate);
            println!(
                "active_subscriptions={} inactive_subscriptions={} invalid_subscriptions={}",
                scan.active.len(),
                scan.inactive.len(),
                scan.invalid.len()
            );
            println!(
                "stale_subscription_nodes={} missing_max_rate={} saved={}",
                report.paths.len(),
                missing.len(),
                report.saved
            );
        }

        if args.fix_consumers {
            let consumers = cleaner.consumers().await?;
            let max_rate = cleaner.max_rate_subscriptions().await?;
            let report = cleaner.clean_consumers(&consumers, &max_rate).await?;
            println!(
                "registered_consumers={} stale_consumer_nodes={} saved={}",
                consumers.len(),
                report.paths.len(),
                report.saved
            );
        }
        Ok::<_, anyhow::Error>(())
    })?
}

fn run_owner_migrate(args: OwnerArgs, config: &ToolsConfig) -> Result<()> {
    let target = tree_target(&args.tree, config)?;
    let plan = OwnershipPlan::from_path(&args.source)?;
    for (topic, ownership) in plan.iter() {
        info!(topic = topic.as_str(), ?ownership, "ownership requested");
    }

    block_on(async {
        let tree = connect(&target).await?;
        let report = migrate_owners(&tree, &target.layout, &plan, args.dry_run).await?;
        println!(
            "changed={} unreadable={} dry_run={}",
            report.changed.len(),
            report.unreadable.len(),
            args.dry_run
        );
        Ok::<_, anyhow::Error>(())
    })?
}

fn run_fix_support_team(args: SupportTeamArgs, config: &ToolsConfig) -> Result<()> {
    let target = tree_target(&args.tree, config)?;

    block_on(async {
        let tree = connect(&target).await?;
        let report = fix_support_team(&tree, &target.layout, args.dry_run).await?;
        println!(
            "fixed={} unreadable={} dry_run={}",
            report.fixed.len(),
            report.unreadable.len(),
            args.dry_run
        );
        Ok::<_, anyhow::Error>(())
    })?
}
