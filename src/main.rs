// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use lingosplice::Controller;
use lingosplice::app_config::{Config, LogLevel, TranslationProvider};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, translate and rewrite every script under a directory
    Translate(TranslateArgs),

    /// List the texts a single script would contribute, without translating
    Scan(ScanArgs),

    /// Generate shell completions for lingosplice
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Build output directory containing the JavaScript files
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = Config::DEFAULT_FILE_NAME)]
    config_path: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key, overriding `aiApiKey`
    #[arg(long, env = "LINGOSPLICE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Comma-separated target languages (e.g., 'en,fr,ja')
    #[arg(short = 't', long, value_delimiter = ',')]
    languages: Option<Vec<String>>,

    /// Directory holding lang.json and process.json
    #[arg(long)]
    cache_dir: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// JavaScript file to scan
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = Config::DEFAULT_FILE_NAME)]
    config_path: PathBuf,
}

/// lingosplice - incremental AI translation for JavaScript bundles
#[derive(Parser, Debug)]
#[command(name = "lingosplice")]
#[command(version)]
#[command(about = "Extract, translate and rewrite human-language text in built JavaScript files")]
#[command(long_about = "lingosplice finds source-language text inside string and template literals of built
JavaScript files, replaces it with lookup calls and writes one JSON asset per language.

EXAMPLES:
    lingosplice translate dist/                     # Translate using translate.config.json
    lingosplice translate -t en,ja dist/            # Override target languages
    lingosplice translate -p anthropic -m claude-3-5-haiku-latest dist/
    lingosplice scan dist/index.js                  # Show texts that would be extracted
    lingosplice completions bash > lingosplice.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in translate.config.json by default. If the config file
    doesn't exist, a default one is created automatically. Only texts absent from
    the translation cache (lang.json) are sent to the provider.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering happens through `log::max_level`, which may change later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; raised or lowered once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lingosplice", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Scan(args) => run_scan(args),
    }
}

/// Load the configuration, creating a default file when it does not exist
fn load_or_create_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path.display());
    let config = Config::default();
    config.save(config_path)?;
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // A command-line level applies before the config is even read
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(LogLevel::from(cmd_log_level.clone()).to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.ai_provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.ai_model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.ai_api_key = api_key.clone();
    }
    if let Some(languages) = &options.languages {
        config.target_language_list = languages
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
    }
    if let Some(cache_dir) = &options.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    if !options.input_dir.is_dir() {
        return Err(anyhow!("Input directory does not exist: {:?}", options.input_dir));
    }

    // Relative cache paths resolve against the config file's directory
    let base_dir = options
        .config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let controller = Controller::with_config(config)?.with_base_dir(base_dir);
    controller.run(options.input_dir).await?;

    Ok(())
}

fn run_scan(options: ScanArgs) -> Result<()> {
    let config = if options.config_path.exists() {
        Config::from_file(&options.config_path)?
    } else {
        Config::default()
    };

    let controller = Controller::with_config(config)?;
    let texts = controller.scan(&options.file)?;

    info!("Found {} text(s) in {}", texts.len(), options.file.display());
    let mut stdout = std::io::stdout();
    for text in texts {
        writeln!(stdout, "{}", text).context("Failed to write to stdout")?;
    }

    Ok(())
}
