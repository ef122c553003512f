//! Fieldrank CLI: researcher recommendations from the command line
//!
//! Field searches are served either by an offline JSON catalogue or by an
//! HTTP search endpoint.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use fieldrank::{
    normalize_targets, parse_or_default, weighted_fields, AuthorGroup, FieldFetcher, FieldOntology,
    FieldSearch, HttpFieldSearch, Recommender, RecommenderConfig, StaticFieldSearch, SystemClock,
    TargetAuthor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fieldrank",
    version,
    about = "Researcher recommendations from author/field graphs"
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend authors for a set of target authors
    Recommend {
        /// JSON list of {"Name", "Fields of Study"}; omit for default topics
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Offline field catalogue (JSON)
        #[arg(long, conflicts_with = "search_url")]
        catalog: Option<PathBuf>,

        /// Field search endpoint
        #[arg(long)]
        search_url: Option<String>,

        /// Overrides the configured number of top picks
        #[arg(long)]
        max_recommendations: Option<String>,
    },
    /// Show the weighted fields of interest for a set of target authors
    Weights {
        #[arg(long)]
        targets: PathBuf,
    },
    /// List fields sharing authors with a field in the catalogue
    Related {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        field: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RecommenderConfig::default(),
    };

    match cli.command {
        Commands::Recommend { targets, catalog, search_url, max_recommendations } => {
            if let Some(raw) = max_recommendations {
                config.max_recommendations =
                    parse_or_default(&raw, config.max_recommendations, "max_recommendations");
            }
            let targets = match targets {
                Some(path) => load_targets(&path)?,
                None => Vec::new(),
            };
            let search = open_search(catalog.as_deref(), search_url.as_deref(), &config)?;
            run_recommend(config, search, &targets, &cli.format).await
        }
        Commands::Weights { targets } => {
            run_weights(&load_targets(&targets)?, &config, &cli.format)
        }
        Commands::Related { catalog, field } => {
            run_related(&catalog, &field, &config, &cli.format).await
        }
    }
}

fn load_targets(path: &Path) -> Result<Vec<TargetAuthor>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading targets {}", path.display()))?;
    let targets: Vec<TargetAuthor> =
        serde_json::from_str(&raw).with_context(|| format!("parsing targets {}", path.display()))?;
    Ok(normalize_targets(targets))
}

fn open_search(
    catalog: Option<&Path>,
    search_url: Option<&str>,
    config: &RecommenderConfig,
) -> Result<Arc<dyn FieldSearch>> {
    match (catalog, search_url) {
        (Some(path), _) => Ok(Arc::new(StaticFieldSearch::from_json_file(path)?)),
        (None, Some(url)) => Ok(Arc::new(HttpFieldSearch::new(
            url,
            Duration::from_secs(config.request_timeout_secs),
        )?)),
        (None, None) => bail!("either --catalog or --search-url is required"),
    }
}

async fn run_recommend(
    config: RecommenderConfig,
    search: Arc<dyn FieldSearch>,
    targets: &[TargetAuthor],
    format: &OutputFormat,
) -> Result<()> {
    let recommender = Recommender::new(config, search, Arc::new(SystemClock));
    let result = recommender.recommend(targets).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.payload)?);
        }
        OutputFormat::Table => {
            for group in &result.payload.recommended_authors {
                print_group(group);
            }
            for group in &result.payload.authors_by_weighted_fields {
                print_group(group);
            }
        }
    }

    Ok(())
}

fn run_weights(
    targets: &[TargetAuthor],
    config: &RecommenderConfig,
    format: &OutputFormat,
) -> Result<()> {
    let weights = weighted_fields(targets, config.top_fields);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&weights)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Field", "Weight"]);
            for w in &weights {
                table.add_row(vec![w.field.clone(), w.weight.to_string()]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

async fn run_related(
    catalog: &Path,
    field: &str,
    config: &RecommenderConfig,
    format: &OutputFormat,
) -> Result<()> {
    let search = Arc::new(StaticFieldSearch::from_json_file(catalog)?);
    let fields = search.fields();
    let fetcher = FieldFetcher::new(search, Arc::new(SystemClock), config.fetch_policy());
    let results = fetcher.fetch_fields(&fields, 0, 0).await;

    let mut ontology = FieldOntology::new();
    for field in results.keys() {
        ontology.update(field, &fetcher.observed_authors(field));
    }
    let related = ontology.related_fields(field.trim());

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&related)?);
        }
        OutputFormat::Table => {
            if related.is_empty() {
                println!("(no related fields)");
            }
            for name in &related {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn print_group(group: &AuthorGroup) {
    println!("{}", group.subheading);
    if group.authors.is_empty() {
        println!("(no authors)\n");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Profile Link", "Reason"]);
    for author in &group.authors {
        table.add_row(vec![
            author.name.clone(),
            author.profile_link.clone(),
            author.reason.clone(),
        ]);
    }
    println!("{}\n", table);
}
