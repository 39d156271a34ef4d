mod config;

/// Version injected at compile time via SENTRY_PROVIDER_VERSION (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("SENTRY_PROVIDER_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use sentry_provider::resource::{self, dispatch, Operation, ResourceKind};
use sentry_provider::sentry::client::SentryClient;
use sentry_provider::ProviderError;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative reconciliation of Sentry resources
#[derive(Parser, Debug)]
#[command(name = "sentry-provider", version = VERSION, about, long_about = None)]
struct Args {
    /// Sentry auth token (falls back to SENTRY_AUTH_TOKEN / SENTRY_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API base URL (falls back to SENTRY_BASE_URL, default https://sentry.io/api/)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Persist the effective token and base URL to the config file
    #[arg(long, global = true)]
    save: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a resource from a config file
    Create {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        /// YAML or JSON config, `-` for stdin
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Read a resource by identifier
    Read {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        id: String,
    },
    /// Update a resource from a config file
    Update {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a resource
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        id: String,
    },
    /// Adopt an existing resource, e.g. `import metric_alert acme/web/123`
    Import {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        id: String,
    },
    /// Reconcile one instance: create, update, re-create or delete as needed
    Apply {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        /// Identifier currently tracked, if any
        #[arg(long)]
        id: Option<String>,
        /// Declared config; omit to delete the tracked instance
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Look up an existing object without managing it
    Data {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        key: String,
    },
    /// Print the schema of one or all resource kinds
    Schema {
        #[arg(value_parser = parse_kind)]
        kind: Option<ResourceKind>,
    },
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    s.parse().map_err(|e: ProviderError| e.to_string())
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();
    let file = open_log_file(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("sentry-provider {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("sentry-provider").join("sentry-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".sentry-provider").join("sentry-provider.log");
    }
    PathBuf::from("sentry-provider.log")
}

/// Read a YAML or JSON resource config
fn read_input(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading config from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };

    serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schema(kind: Option<ResourceKind>) -> Result<Value> {
    match kind {
        Some(kind) => {
            let def = resource::get_resource_def(kind.key())
                .with_context(|| format!("no schema for {kind}"))?;
            Ok(serde_json::to_value(def)?)
        }
        None => Ok(serde_json::to_value(&resource::get_registry().resources)?),
    }
}

async fn run(client: &SentryClient, command: Command) -> Result<Value, ProviderError> {
    match command {
        Command::Create { kind, file } => {
            let input = read_input(&file).map_err(|e| ProviderError::Config(format!("{e:#}")))?;
            resource::execute(client, kind, Operation::Create, None, Some(input)).await
        }
        Command::Read { kind, id } => resource::execute(client, kind, Operation::Read, Some(id.as_str()), None).await,
        Command::Update { kind, id, file } => {
            let input = read_input(&file).map_err(|e| ProviderError::Config(format!("{e:#}")))?;
            resource::execute(client, kind, Operation::Update, Some(id.as_str()), Some(input)).await
        }
        Command::Delete { kind, id } => resource::execute(client, kind, Operation::Delete, Some(id.as_str()), None).await,
        Command::Import { kind, id } => resource::execute(client, kind, Operation::Import, Some(id.as_str()), None).await,
        Command::Apply { kind, id, file } => {
            let declared = file
                .as_deref()
                .map(read_input)
                .transpose()
                .map_err(|e| ProviderError::Config(format!("{e:#}")))?;
            dispatch::apply(client, kind, id.as_deref(), declared).await
        }
        Command::Data { kind, key } => resource::read_data_source(client, kind, &key).await,
        Command::Schema { .. } => Err(ProviderError::Config("schema needs no client".into())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    if let Command::Schema { kind } = args.command {
        return print_json(&schema(kind)?);
    }

    let config = Config::load();
    let settings = config.resolve(args.token, args.base_url, |key| std::env::var(key).ok());
    tracing::info!("Using {:?}", settings);

    if args.save {
        Config::from(&settings).save()?;
    }

    if settings.token.is_none() {
        tracing::warn!("No auth token configured, requests will be anonymous");
    }

    let client = SentryClient::new(&settings.base_url, settings.token.clone())
        .with_context(|| format!("invalid base URL {}", settings.base_url))?;

    match run(&client, args.command).await {
        Ok(value) => print_json(&value),
        Err(err) => {
            // The caller still needs to know what actually landed remotely.
            if let Some(state) = err.partial_state() {
                match err.created_id() {
                    Some(id) => print_json(&serde_json::json!({ "id": id, "state": state }))?,
                    None => print_json(state)?,
                }
            }
            Err(err.into())
        }
    }
}
