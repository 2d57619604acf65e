use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_sql_datasource::config::Config;
use gcp_sql_datasource::gcp::client::GcpClient;
use gcp_sql_datasource::resource::schema::sql_databases_schema;
use gcp_sql_datasource::resource::{read_databases, ReadOutcome, ReadRequest};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Read the databases of a Cloud SQL instance
#[derive(Parser, Debug)]
#[command(name = "gcp-sql-databases", version, about, long_about = None)]
struct Args {
    /// Cloud SQL instance name (overrides the request file)
    #[arg(short, long)]
    instance: Option<String>,

    /// GCP project containing the instance (overrides the request file)
    #[arg(short, long)]
    project: Option<String>,

    /// YAML or JSON read request: {project, instance, filters}
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Read timeout in seconds, retries included
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the data source schema and exit
    #[arg(long)]
    schema: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
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

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        },
    };

    // Non-blocking writer; the guard flushes on drop
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcp-sql-databases started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

/// Get the log file path
fn get_log_path() -> PathBuf {
    // Use ~/.config/gcp-sql-datasource/ on Linux/macOS
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcp-sql-datasource").join("gcp-sql-datasource.log");
    }
    // Fallback to home directory
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcp-sql-datasource").join("gcp-sql-datasource.log");
    }
    // Last resort: current directory
    PathBuf::from("gcp-sql-datasource.log")
}

/// Build the read request from the request file and flag overrides
fn load_request(args: &Args) -> Result<ReadRequest> {
    let mut request: ReadRequest = match &args.request {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file {:?}", path))?;
            // YAML parser reads JSON request files too
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse request file {:?}", path))?
        },
        None => ReadRequest::default(),
    };

    // Command line flags take precedence over the request file
    if let Some(instance) = &args.instance {
        request.instance = instance.clone();
    }
    if let Some(project) = &args.project {
        request.project = Some(project.clone());
    }

    if request.instance.is_empty() {
        anyhow::bail!("instance: required field is not set. Use --instance or a request file");
    }

    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging (keep guard alive for the duration of the program)
    let _log_guard = setup_logging(args.log_level);

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&sql_databases_schema())?);
        return Ok(());
    }

    let request = load_request(&args)?;

    // Load provider configuration
    let mut config = Config::load();
    if let Some(timeout) = args.timeout {
        config.read_timeout_secs = timeout;
    }
    let default_project = config.effective_project();

    tracing::info!(
        "Reading databases of instance {} (default project: {:?})",
        request.instance,
        default_project
    );

    // Initialize GCP client
    let client = GcpClient::new(&config)
        .await
        .context("Failed to initialize GCP client")?;

    let outcome = read_databases(&client, default_project.as_deref(), &request)
        .await
        .with_context(|| format!("Failed to read databases of instance {:?}", request.instance))?;

    // A vanished instance clears the data source instead of failing
    match outcome {
        ReadOutcome::Found(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        ReadOutcome::Missing => println!("{}", serde_json::json!({ "id": "" })),
    }

    Ok(())
}
