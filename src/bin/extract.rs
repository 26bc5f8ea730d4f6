//! Schema Extract CLI
//!
//! Extracts table metadata from a schema registry.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use kafka_schema_extractor::{
    ExtractorConfig, OutputFormat, RegistryApi, SchemaExtractor, SchemaNode, TableRecord,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-extract")]
#[command(about = "Extract table metadata from a schema registry")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Registry base URL (overrides config)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Basic auth user (overrides config)
    #[arg(long, global = true)]
    username: Option<String>,

    /// Basic auth password (overrides config)
    #[arg(long, global = true, env = "EXTRACTOR_REGISTRY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format (overrides config)
    #[arg(short, long, global = true, value_enum)]
    format: Option<Format>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    JsonLines,
    Pretty,
    Compact,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::JsonLines => OutputFormat::JsonLines,
            Format::Pretty => OutputFormat::Pretty,
            Format::Compact => OutputFormat::Compact,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every subject's latest schema as a table record
    Run,

    /// Check the connection and list subjects
    Subjects,

    /// Extract a single subject
    Show {
        /// Subject name
        subject: String,
    },

    /// Normalize a local schema document
    Normalize {
        /// Path to the schema JSON
        file: PathBuf,
        /// Subject name to file the table under
        #[arg(short, long, default_value = "local")]
        subject: String,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output as TOML
        #[arg(long)]
        toml: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "extractor.toml")]
        output: String,
    },

    /// Validate configuration
    Validate,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ExtractorConfig> {
    let mut cfg = ExtractorConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(url) = &cli.url {
        cfg.registry.url = Some(url.clone());
    }
    if let Some(username) = &cli.username {
        cfg.registry.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        cfg.registry.password = Some(password.clone());
    }
    if let Some(timeout) = cli.timeout {
        cfg.registry.timeout_secs = timeout;
    }
    if let Some(format) = cli.format {
        cfg.output.format = format.into();
    }

    Ok(cfg)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = load_config(&cli)?;

    match cli.command {
        Commands::Run => {
            let mut extractor = SchemaExtractor::new(cfg.client()?).with_normalizer(cfg.normalizer());
            let mut out = std::io::stdout().lock();
            let mut collected = Vec::new();

            while let Some(record) = extractor.extract()? {
                match cfg.output.format {
                    OutputFormat::Compact => collected.push(record.to_document()),
                    format => write_record(&mut out, &record, format)?,
                }
            }
            if cfg.output.format == OutputFormat::Compact {
                writeln!(out, "{}", serde_json::Value::Array(collected))?;
            }
            out.flush()?;

            let stats = extractor.stats();
            eprintln!(
                "✅ Extracted {} of {} subjects ({} skipped)",
                stats.extracted,
                stats.subjects,
                stats.skipped_count()
            );
            for skipped in &stats.skipped {
                eprintln!("   └─ {} [{}]: {}", skipped.subject, skipped.kind, skipped.reason);
            }
            Ok(())
        }

        Commands::Subjects => {
            let client = cfg.client()?;
            client.check_connection()?;
            let subjects = client.list_subjects()?;

            if subjects.is_empty() {
                eprintln!("No subjects registered.");
            }
            for subject in subjects {
                println!("{}", subject);
            }
            Ok(())
        }

        Commands::Show { subject } => {
            let client = cfg.client()?;
            client.check_connection()?;
            let version = client.max_version(&subject)?;
            let doc = client.fetch_version(&subject, &version)?;
            let record = cfg.normalizer().normalize(&doc, &subject)?;

            eprintln!("📦 {} (version {})", record.key(), version);
            write_record(&mut std::io::stdout().lock(), &record, cfg.output.format)?;
            Ok(())
        }

        Commands::Normalize { file, subject } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let doc = SchemaNode::parse(&subject, &text)?;
            let record = cfg.normalizer().normalize(&doc, &subject)?;
            write_record(&mut std::io::stdout().lock(), &record, cfg.output.format)?;
            Ok(())
        }

        Commands::Config { command } => run_config(command, cfg),
    }
}

fn run_config(command: ConfigCommands, cfg: ExtractorConfig) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show { toml } => {
            if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Schema Extractor Configuration\n");
                println!("Registry:");
                println!("  URL: {:?}", cfg.registry.url);
                println!("  Username: {:?}", cfg.registry.username);
                println!("  Password: {}", if cfg.registry.password.is_some() { "<set>" } else { "<unset>" });
                println!("  Timeout: {}s", cfg.registry.timeout_secs);

                println!("\nNormalize:");
                println!("  Max depth: {}", cfg.normalize.max_depth);
                println!("  Default cluster: {}", cfg.normalize.default_cluster);

                println!("\nOutput:");
                println!("  Format: {:?}", cfg.output.format);
            }
            Ok(())
        }

        ConfigCommands::Init { output } => {
            ExtractorConfig::default().save(&output)?;
            println!("✅ Created config file: {}", output);
            Ok(())
        }

        ConfigCommands::Validate => {
            if cfg.registry.url.is_none() {
                bail!("registry.url is not set");
            }
            cfg.connection()?;
            println!("✅ Configuration is valid");
            println!("   Registry: {:?}", cfg.registry.url);
            Ok(())
        }
    }
}

fn write_record(out: &mut impl Write, record: &TableRecord, format: OutputFormat) -> anyhow::Result<()> {
    let doc = record.to_document();
    match format {
        OutputFormat::Pretty => writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?,
        OutputFormat::JsonLines | OutputFormat::Compact => writeln!(out, "{}", doc)?,
    }
    Ok(())
}
