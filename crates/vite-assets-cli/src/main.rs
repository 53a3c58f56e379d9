mod server;
mod settings;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use vite_assets::config::DEFAULT_PROJECT_PATH;
use vite_assets::{analyze, AssetServer, DirStore, DynStore, Environment, PackageJson};

use server::MountedAssets;
use settings::{load_settings, project_dir, ConfigOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "vite-assets",
    author,
    version,
    about = "Serve a Vite frontend's sources in development and its build output in production",
    propagate_version = true
)]
struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Output log format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the frontend's assets under the configured URL prefix.
    Serve(ServeArgs),
    /// Print the framework profile detected from package.json.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// TCP socket to bind for HTTP traffic.
    #[arg(short = 'l', long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Directory relative project paths are resolved against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to a YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frontend project directory.
    #[arg(long)]
    project: Option<String>,

    /// Serving environment ("development" or "production").
    #[arg(long)]
    environment: Option<String>,

    /// Build the dev server URL with https.
    #[arg(long)]
    https: bool,

    /// Host of the Vite dev server.
    #[arg(long)]
    dev_server_domain: Option<String>,

    /// Port of the Vite dev server.
    #[arg(long)]
    dev_server_port: Option<String>,

    /// URL path the assets are mounted under.
    #[arg(long)]
    url_prefix: Option<String>,

    /// Build output directory served in production.
    #[arg(long)]
    assets_path: Option<String>,

    /// Entry point script to advertise.
    #[arg(long)]
    entry_point: Option<String>,

    /// Log the serving root on every request.
    #[arg(long)]
    debug: bool,
}

impl ServeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            project_path: self.project.clone(),
            environment: self.environment.clone().map(Environment::from),
            https: self.https.then_some(true),
            dev_server_domain: self.dev_server_domain.clone(),
            dev_server_port: self.dev_server_port.clone(),
            url_prefix: self.url_prefix.clone(),
            assets_path: self.assets_path.clone(),
            entry_point: self.entry_point.clone(),
            debug: self.debug.then_some(true),
        }
    }
}

#[derive(Args, Debug, Clone)]
struct InspectArgs {
    /// Directory relative project paths are resolved against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Frontend project directory.
    #[arg(long, default_value = DEFAULT_PROJECT_PATH)]
    project: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match cli.command {
        Command::Serve(args) => run_serve(args).await?,
        Command::Inspect(args) => run_inspect(args).await?,
    }

    Ok(())
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let _ = tracing::subscriber::set_global_default(build_subscriber(
        verbosity,
        format,
        std::io::stdout,
    ));
}

fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Targets stay in the output so access lines (`vite_assets::access`) can
/// be told apart from diagnostics.
fn build_subscriber<W>(
    verbosity: u8,
    format: LogFormat,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level(verbosity).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer);

    match format {
        LogFormat::Text => Box::new(subscriber.finish()),
        LogFormat::Json => Box::new(subscriber.json().finish()),
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = load_settings(args.config.as_deref(), &args.overrides()).await?;
    if config.project_path.is_empty() {
        config.project_path = DEFAULT_PROJECT_PATH.to_string();
    }

    let dir = project_dir(&args.root, &config.project_path);
    let store: DynStore = Arc::new(
        DirStore::new(&dir)
            .with_context(|| format!("frontend project {} is not usable", dir.display()))?,
    );
    config
        .resolve(store.as_ref())
        .await
        .context("failed to resolve frontend configuration")?;

    info!(
        environment = %config.environment,
        platform = %config.platform,
        entry_point = %config.entry_point,
        url_prefix = %config.url_prefix,
        "frontend configuration resolved"
    );
    if !config.environment.is_production() {
        info!(dev_server = %config.dev_server_base_url(), "proxying module requests to vite dev server");
    }

    let handler = AssetServer::new(Arc::new(config), store)
        .file_server()
        .context("failed to build asset handler")?;
    let assets = Arc::new(MountedAssets::new(handler));

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(
        address = %listener.local_addr()?,
        prefix = %assets.prefix(),
        root = %dir.display(),
        "asset server listening"
    );

    server::run(listener, assets, shutdown_signal()).await
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let dir = project_dir(&args.root, &args.project);
    let store = DirStore::new(&dir)
        .with_context(|| format!("frontend project {} is not usable", dir.display()))?;
    let package = PackageJson::load(&store, &args.project)
        .await
        .with_context(|| format!("failed to read package.json in {}", dir.display()))?;
    let profile = analyze(&package).context("package.json does not describe a vite project")?;

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
