mod config;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use blueprint_catalog::{CatalogError, CatalogReader, JsonCatalogReader, catalog_json_schema};
use blueprint_core::{DatabaseBlueprint, Error as CoreError, link};
use clap::{Args, Parser, Subcommand, ValueEnum};
use logging::{LogFormat, init_logging};
use thiserror::Error;
use tokio::task::JoinSet;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("unable to locate a configuration profile named {name} in {}", .path.display())]
    UnknownProfile { name: String, path: PathBuf },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{count} constraint(s) could not be linked")]
    Incomplete { count: usize },
    #[error("foreign key graph contains cycles")]
    Cycle,
}

#[derive(Parser, Debug)]
#[command(name = "blueprint", version, about = "Database blueprint CLI")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Log filter, e.g. `debug` or `blueprint_core=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the relations of each catalog.
    Show(ShowArgs),
    /// Print the foreign key dependency order of each catalog.
    Order(OrderArgs),
    /// Print the JSON Schema of catalog documents.
    CatalogSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Catalog document(s) to build.
    #[arg(long = "catalog", value_name = "FILE", required = true)]
    catalogs: Vec<PathBuf>,
    /// Configuration file with named profiles.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Profile to read options from.
    #[arg(long, default_value = config::DEFAULT_PROFILE)]
    profile: String,
    /// Schema name(s) to include. Overrides the profile.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Only list the relation with this name.
    #[arg(long)]
    table: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Fail when any constraint could not be linked.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct OrderArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Fail when the foreign key graph has cycles.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level.as_deref())?;

    match cli.command {
        Command::Show(args) => run_show(args).await,
        Command::Order(args) => run_order(args).await,
        Command::CatalogSchema => run_catalog_schema(),
    }
}

async fn run_show(args: ShowArgs) -> Result<(), CliError> {
    let graphs = build_all(&args.source).await?;

    match args.format {
        OutputFormat::Text => {
            for graph in &graphs {
                if graphs.len() > 1 {
                    println!("database {}", graph.name());
                }
                print!("{}", render::render_blueprint(graph, args.table.as_deref()));
            }
        }
        OutputFormat::Json => {
            let json = match graphs.as_slice() {
                [graph] => serde_json::to_string_pretty(graph)?,
                graphs => serde_json::to_string_pretty(graphs)?,
            };
            println!("{json}");
        }
    }

    let count: usize = graphs.iter().map(|graph| graph.link_errors().len()).sum();
    if count > 0 {
        tracing::warn!(event = "blueprint_incomplete", link_errors = count);
        if args.strict {
            return Err(CliError::Incomplete { count });
        }
    }
    Ok(())
}

async fn run_order(args: OrderArgs) -> Result<(), CliError> {
    let graphs = build_all(&args.source).await?;
    let reports: Vec<_> = graphs
        .iter()
        .map(|graph| (graph, graph.dependency_report()))
        .collect();

    for (graph, report) in &reports {
        match args.format {
            OutputFormat::Text => print!("{}", render::render_order(graph, report)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        }
    }

    if args.strict && reports.iter().any(|(_, report)| report.cycle.is_some()) {
        return Err(CliError::Cycle);
    }
    Ok(())
}

fn run_catalog_schema() -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(&catalog_json_schema())?);
    Ok(())
}

/// Read and link every catalog concurrently. Results keep the argument order.
async fn build_all(source: &SourceArgs) -> Result<Vec<DatabaseBlueprint>, CliError> {
    let loaded = config::load_config(source.config.as_deref())?;
    let profile = loaded.profile(&source.profile)?;
    let engine = profile.catalog.engine()?;
    let mut options = profile.database_blueprint.clone();
    if !source.schema.is_empty() {
        options.schemas = Some(source.schema.clone());
    }
    let options = Arc::new(options);

    tracing::info!(
        event = "build_started",
        profile = %source.profile,
        config = %loaded.path.display(),
        from_file = loaded.from_file,
        catalogs = source.catalogs.len()
    );
    let timer = Instant::now();

    let mut tasks = JoinSet::new();
    for (position, path) in source.catalogs.iter().enumerate() {
        let reader = JsonCatalogReader::new(path).with_engine(engine);
        let options = Arc::clone(&options);
        tasks.spawn(async move {
            let snapshot = reader.read(&options).await?;
            let graph = tokio::task::spawn_blocking(move || link(&snapshot, &options)).await??;
            Ok::<_, CliError>((position, graph))
        });
    }

    let mut graphs = Vec::with_capacity(source.catalogs.len());
    while let Some(joined) = tasks.join_next().await {
        graphs.push(joined??);
    }
    graphs.sort_by_key(|(position, _)| *position);

    tracing::info!(
        event = "build_finished",
        catalogs = graphs.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(graphs.into_iter().map(|(_, graph)| graph).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../blueprint-catalog/tests/fixtures/shop.catalog.json")
    }

    fn source(catalogs: Vec<PathBuf>, schema: Vec<String>) -> SourceArgs {
        SourceArgs {
            catalogs,
            config: Some(PathBuf::from("does/not/exist/blueprint.toml")),
            profile: config::DEFAULT_PROFILE.to_string(),
            schema,
        }
    }

    #[test]
    fn parses_show_arguments() {
        let cli = Cli::try_parse_from([
            "blueprint",
            "show",
            "--catalog",
            "a.json",
            "--catalog",
            "b.json",
            "--schema",
            "public",
            "--format",
            "json",
            "--strict",
        ])
        .unwrap();

        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.source.catalogs.len(), 2);
        assert_eq!(args.source.profile, "default");
        assert_eq!(args.source.schema, vec!["public".to_string()]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.strict);
    }

    #[test]
    fn show_requires_a_catalog() {
        assert!(Cli::try_parse_from(["blueprint", "show"]).is_err());
    }

    #[tokio::test]
    async fn builds_catalogs_in_argument_order() {
        let graphs = build_all(&source(vec![fixture(), fixture()], Vec::new()))
            .await
            .unwrap();
        assert_eq!(graphs.len(), 2);
        assert!(graphs.iter().all(DatabaseBlueprint::is_complete));
        assert_eq!(graphs[0].relations().count(), 4);
    }

    #[tokio::test]
    async fn schema_flag_overrides_profile() {
        let graphs = build_all(&source(vec![fixture()], vec!["reporting".to_string()]))
            .await
            .unwrap();
        assert_eq!(graphs[0].schemas().count(), 0);
    }

    #[tokio::test]
    async fn unknown_profile_is_reported() {
        let mut args = source(vec![fixture()], Vec::new());
        args.profile = "staging".to_string();
        let err = build_all(&args).await.unwrap_err();
        assert!(matches!(err, CliError::UnknownProfile { .. }));
    }

    #[tokio::test]
    async fn missing_catalog_fails_the_build() {
        let err = build_all(&source(vec![PathBuf::from("missing.json")], Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Catalog(CatalogError::Io { .. })));
    }
}
