use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use teamatch_api::{AppState, RestApi};
use teamatch_core::{load_catalog, BooleanMatch, Catalog, CatalogSchema, MemoryFeedbackSink, Query, TriState};
use teamatch_similarity::{Outcome, RecommendOptions, Recommender, DEFAULT_THRESHOLD, DEFAULT_TOP_N};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Content-based drink recommendations
#[derive(Parser, Debug)]
#[command(name = "teamatch")]
#[command(about = "Recommend drinks from a tagged catalog", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API
    Serve {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[command(flatten)]
        ranking: RankingArgs,

        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,

        /// Most recent feedback records kept in memory
        #[arg(long, default_value_t = 100_000)]
        feedback_limit: usize,
    },
    /// Print recommendations for one set of selections
    Recommend {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[command(flatten)]
        ranking: RankingArgs,

        #[arg(long)]
        category: Option<String>,

        /// Base type(s), comma separated
        #[arg(long)]
        base_type: Option<String>,

        /// Flavor tag, repeatable
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Attribute preference such as "Contains Caffeine=No", repeatable
        #[arg(long = "prefer")]
        preferences: Vec<String>,

        /// Show which terms drove each score
        #[arg(long)]
        explain: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the categories, base types, flavor tags and attributes of a catalog
    Options {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

#[derive(clap::Args, Debug)]
struct CatalogArgs {
    /// Path to the catalog CSV file
    #[arg(short, long)]
    catalog: PathBuf,

    #[arg(long, default_value = "Menu")]
    menu_column: String,

    #[arg(long, default_value = "Category")]
    category_column: String,

    #[arg(long, default_value = "Base Type")]
    base_type_column: String,

    #[arg(long, default_value = "Flavor Tags")]
    flavor_tags_column: String,
}

impl CatalogArgs {
    fn load(&self) -> anyhow::Result<Catalog> {
        let schema = CatalogSchema {
            menu_column: self.menu_column.clone(),
            category_column: self.category_column.clone(),
            base_type_column: self.base_type_column.clone(),
            flavor_tags_column: self.flavor_tags_column.clone(),
        };
        load_catalog(&self.catalog, &schema)
            .with_context(|| format!("Failed to load catalog: {}", self.catalog.display()))
    }
}

#[derive(clap::Args, Debug)]
struct RankingArgs {
    /// Minimum similarity score in threshold mode
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, conflicts_with_all = ["top_n_only", "neighbors"])]
    threshold: f32,

    /// Maximum number of recommendations
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Ignore the threshold and always return the best --top-n items
    #[arg(long)]
    top_n_only: bool,

    /// Nearest-neighbour mode: the k closest items over the whole catalog
    #[arg(long, conflicts_with = "top_n_only")]
    neighbors: Option<usize>,

    /// Let a "No" preference accept items whose value is unknown
    #[arg(long)]
    lenient: bool,

    /// Score the whole catalog instead of only the selected base types
    #[arg(long)]
    no_base_type_scope: bool,

    /// Drop English stop words when vectorizing
    #[arg(long)]
    stop_words: bool,
}

impl RankingArgs {
    fn options(&self) -> anyhow::Result<RecommendOptions> {
        let options = if let Some(k) = self.neighbors {
            RecommendOptions::nearest_neighbors(k)
        } else if self.top_n_only {
            RecommendOptions::top_n(self.top_n)
        } else {
            RecommendOptions::threshold(self.threshold).with_top_n(self.top_n)
        };

        let boolean_match = if self.lenient {
            BooleanMatch::Lenient
        } else {
            BooleanMatch::Strict
        };
        let options = options
            .with_boolean_match(boolean_match)
            .with_base_type_scope(options.base_type_scope && !self.no_base_type_scope)
            .with_stop_words(options.stop_words || self.stop_words);

        options.validate()?;
        Ok(options)
    }
}

fn parse_preference(raw: &str) -> anyhow::Result<(String, TriState)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("Preference must look like NAME=Yes or NAME=No, got {:?}", raw);
    };
    let value = TriState::parse(value);
    if !value.is_known() {
        bail!("Preference value for {:?} must be Yes or No", name.trim());
    }
    Ok((name.trim().to_string(), value))
}

fn run_recommend(
    catalog: &Catalog,
    options: RecommendOptions,
    query: Query,
    explain: bool,
    json: bool,
) -> anyhow::Result<()> {
    let recommender = Recommender::new(options);
    let result = recommender.recommend(catalog, &query);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result.outcome {
        Outcome::EmptyCandidateSet => println!("No drinks match these filters. Try different filters."),
        Outcome::NoQualifyingMatch => println!("No matching drinks found. Try different tags."),
        Outcome::Matched => {
            for (rank, item) in result.items.iter().enumerate() {
                println!("{}. {} ({:.3})", rank + 1, item.menu_name, item.score);
                if explain {
                    if let Some(explanation) = recommender.explain(catalog, &query, &item.menu_name) {
                        for contribution in &explanation.contributions {
                            println!("     {:<20} {:.3}", contribution.term, contribution.weight);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_options(catalog: &Catalog) {
    let options = catalog.options();
    println!("Categories:  {}", options.categories.join(", "));
    println!("Base types:  {}", options.base_types.join(", "));
    println!("Flavor tags: {}", options.flavor_tags.join(", "));
    println!("Attributes:  {}", options.attributes.join(", "));
}

async fn serve(
    catalog: Catalog,
    options: RecommendOptions,
    http_port: u16,
    feedback_limit: usize,
) -> anyhow::Result<()> {
    let feedback = Arc::new(MemoryFeedbackSink::with_limit(feedback_limit));
    let state = AppState::new(Arc::new(catalog), feedback, options);

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("teamatch started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Serve {
            catalog,
            ranking,
            http_port,
            feedback_limit,
        } => {
            info!("Starting teamatch v{}", env!("CARGO_PKG_VERSION"));
            let options = ranking.options()?;
            serve(catalog.load()?, options, http_port, feedback_limit).await
        }
        Command::Recommend {
            catalog,
            ranking,
            category,
            base_type,
            tags,
            preferences,
            explain,
            json,
        } => {
            let options = ranking.options()?;
            let mut query = Query::new().with_tags(tags);
            if let Some(category) = category {
                query = query.with_category(category);
            }
            if let Some(base_type) = base_type {
                query = query.with_base_type(base_type);
            }
            for raw in &preferences {
                let (name, value) = parse_preference(raw)?;
                query = query.with_preference(name, value);
            }
            run_recommend(&catalog.load()?, options, query, explain, json)
        }
        Command::Options { catalog } => {
            run_options(&catalog.load()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preference() {
        assert_eq!(
            parse_preference("Contains Caffeine=No").unwrap(),
            ("Contains Caffeine".to_string(), TriState::No)
        );
        assert!(parse_preference("Contains Caffeine").is_err());
        assert!(parse_preference("Contains Caffeine=perhaps").is_err());
    }

    #[test]
    fn test_ranking_args() {
        let args = Args::parse_from([
            "teamatch", "recommend", "--catalog", "menu.csv", "--top-n-only", "--top-n", "3", "--lenient",
        ]);
        let Command::Recommend { ranking, .. } = args.command else {
            panic!("expected recommend");
        };
        let options = ranking.options().unwrap();
        assert_eq!(options.policy, teamatch_similarity::CutoffPolicy::TopN);
        assert_eq!(options.top_n, 3);
        assert_eq!(options.boolean_match, BooleanMatch::Lenient);
    }

    #[test]
    fn test_neighbors_mode() {
        let args = Args::parse_from(["teamatch", "recommend", "-c", "menu.csv", "--neighbors", "6"]);
        let Command::Recommend { ranking, .. } = args.command else {
            panic!("expected recommend");
        };
        let options = ranking.options().unwrap();
        assert_eq!(options.top_n, 6);
        assert!(!options.base_type_scope);
    }
}
