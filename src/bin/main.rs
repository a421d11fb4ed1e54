//! clipcount CLI - answer video-metrics questions with one number
//!
//! Usage:
//!   clipcount compile <spec.json|-> [--output sql|json]
//!   clipcount query <spec.json|->
//!   clipcount ask "<question>"
//!   clipcount init
//!   clipcount load <dataset.json> [--batch-size 500]
//!
//! Examples:
//!   echo '{"table":"videos","aggregation":"count_rows","field":"id"}' | clipcount query -
//!   clipcount ask "How many videos have more than 100000 views?"
//!   clipcount --config ./clipcount.toml load videos.json

use clap::{Parser, Subcommand, ValueEnum};
use clipcount::compile::compile_with;
use clipcount::config::Settings;
use clipcount::nl::OpenAiSpecProducer;
use clipcount::service::Analytics;
use clipcount::spec::Specification;
use clipcount::store::{self, DEFAULT_BATCH_SIZE};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "clipcount")]
#[command(about = "clipcount - answers analytics questions about video metrics with a single number")]
#[command(version)]
struct Cli {
    /// Path to a clipcount.toml (overrides the default search)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a specification to SQL without running it
    Compile {
        /// Specification JSON file, or - for stdin
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Run a specification and print the number
    Query {
        /// Specification JSON file, or - for stdin
        file: PathBuf,
    },

    /// Ask a question in plain language
    Ask {
        /// The question
        question: String,
    },

    /// Create the database schema
    Init,

    /// Bulk-load a videos dataset
    Load {
        /// Dataset JSON file
        file: PathBuf,

        /// Rows per transaction
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL followed by one `-- :name = value` line per parameter
    Sql,
    /// {"sql": ..., "params": {...}}
    Json,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Compile { file, output } => cmd_compile(&settings, &file, output),
        Commands::Query { file } => cmd_query(&settings, &file),
        Commands::Ask { question } => cmd_ask(&settings, &question),
        Commands::Init => cmd_init(&settings),
        Commands::Load { file, batch_size } => cmd_load(&settings, &file, batch_size),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings, clipcount::config::SettingsError> {
    match path {
        Some(p) => Settings::from_file(p),
        None => Settings::load(),
    }
}

fn read_spec(file: &Path) -> Result<Specification, String> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Error reading stdin: {}", e))?;
        buf
    } else {
        fs::read_to_string(file)
            .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?
    };
    Specification::from_json(&text).map_err(|e| e.to_string())
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Error starting runtime: {}", e))
}

fn cmd_compile(settings: &Settings, file: &Path, output: OutputFormat) -> ExitCode {
    let spec = match read_spec(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match compile_with(&spec, &settings.compiler.options()) {
        Ok(compiled) => {
            match output {
                OutputFormat::Sql => {
                    println!("{}", compiled.sql);
                    for (name, value) in &compiled.params {
                        println!("-- :{} = {}", name, value);
                    }
                }
                OutputFormat::Json => {
                    let doc = serde_json::json!({
                        "sql": compiled.sql,
                        "params": compiled.params,
                    });
                    println!("{}", doc);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_query(settings: &Settings, file: &Path) -> ExitCode {
    let spec = match read_spec(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let analytics = match Analytics::from_settings(settings) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(analytics.answer_spec(&spec)) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_ask(settings: &Settings, question: &str) -> ExitCode {
    let question = question.trim();
    if question.is_empty() {
        eprintln!("Ask a question in plain text.");
        return ExitCode::FAILURE;
    }

    let setup = || -> Result<(Analytics, OpenAiSpecProducer), String> {
        let analytics = Analytics::from_settings(settings).map_err(|e| e.to_string())?;
        let llm = &settings.llm;
        let api_key = llm.resolved_api_key().map_err(|e| e.to_string())?;
        let timeout = llm.timeout().map_err(|e| e.to_string())?;
        let producer = OpenAiSpecProducer::with_timeout(api_key, Some(timeout))
            .map_err(|e| e.to_string())?
            .with_base_url(llm.base_url.as_str())
            .with_model(llm.model.as_str())
            .with_temperature(llm.temperature);
        Ok((analytics, producer))
    };

    let (analytics, producer) = match setup() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(analytics.answer_text(&producer, question)) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "question failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn open_writer(settings: &Settings) -> Result<rusqlite::Connection, String> {
    let path = settings
        .database
        .resolved_path()
        .map_err(|e| e.to_string())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Error creating '{}': {}", parent.display(), e))?;
    }
    let conn = clipcount::exec::Database::new(&path)
        .open_writer()
        .map_err(|e| format!("Error opening '{}': {}", path.display(), e))?;
    store::create_schema(&conn).map_err(|e| e.to_string())?;
    Ok(conn)
}

fn cmd_init(settings: &Settings) -> ExitCode {
    match open_writer(settings) {
        Ok(_) => {
            println!("Schema ready at {}", settings.database.path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_load(settings: &Settings, file: &Path, batch_size: usize) -> ExitCode {
    let mut conn = match open_writer(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match store::load_file(&mut conn, file, batch_size) {
        Ok(stats) => {
            println!(
                "Loaded {} videos and {} snapshots in {} batches",
                stats.videos, stats.snapshots, stats.batches
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error loading '{}': {}", file.display(), e);
            ExitCode::FAILURE
        }
    }
}
