use anyhow::Result;
use clap::Parser;
use querynode::server::wait_for_shutdown_signal;
use querynode::{NodeConfig, Server};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "querynode")]
#[command(about = "Lifecycle and health orchestrator for a cluster query node")]
#[command(version)]
#[command(long_about = "Brings up a query node: waits for its coordinators to report \
healthy, starts the query engine in a fixed order and serves data-plane requests until \
SIGINT or SIGTERM. A coordinator that cannot be brought up terminates the process.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "querynode.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the node")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - build the node but don't run it
    #[arg(long, help = "Perform dry run - build the node but don't start it")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting query node v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match NodeConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let server = Server::standalone(&config);

    if args.dry_run {
        info!("Dry run mode - node built but not started");
        println!("✓ Dry run completed successfully - query node {} built", server.node_id());
        return Ok(());
    }

    // Serving without coordinators is never safe
    if let Some(exit_code) = server.run_or_exit_code(stop_timeout(&config)).await {
        std::process::exit(exit_code);
    }

    let reason = wait_for_shutdown_signal().await;
    info!("Stopping query node: {:?}", reason);

    let exit_code = server.shutdown(stop_timeout(&config)).await;
    info!("Query node exited with code: {}", exit_code);

    std::process::exit(exit_code);
}

fn stop_timeout(config: &NodeConfig) -> Duration {
    Duration::from_secs(config.shutdown.stop_timeout_seconds)
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("querynode={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Query node configuration file");
    println!("# Every key may be overridden with QUERYNODE__<SECTION>__<KEY>");
    println!();
    println!("{}", toml::to_string_pretty(&NodeConfig::default())?);
    Ok(())
}
