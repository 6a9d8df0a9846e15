use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dota_dash::config::AppConfig;
use dota_dash::fetch::memory::InMemorySource;
use dota_dash::fetch::{ApiClient, StatsSource};
use dota_dash::listing::{CategoryFilter, SortDirection, SortKey};
use dota_dash::models::{HeroId, RatingBracket, StatsType};
use dota_dash::normalize::Normalizer;
use dota_dash::render;
use dota_dash::views::{
    HeroDetailView, HeroGridView, HeroPageView, HeroesTableView, Loadable, ProfileView,
};

#[derive(Parser)]
#[command(name = "dota-dash")]
#[command(about = "Dota 2 profile and hero statistics dashboard")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Backend API base URL; overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Session id sent as the `session_id` cookie; overrides the config file
    #[arg(long)]
    session: Option<String>,

    /// Serve data from a JSON fixture file instead of the backend
    #[arg(long)]
    fixture: Option<String>,

    /// Print screen data as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the player profile and match history
    Profile {
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Hero statistics table
    Heroes {
        /// Rating bracket (11-15, 21-25, ..., 71-75, 81)
        #[arg(long)]
        rating: Option<RatingBracket>,

        /// Sort column: name, win-rate, presence, kda, gpm, xpm
        #[arg(long, default_value = "win-rate")]
        sort: SortKey,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Case-insensitive hero name filter
        #[arg(long)]
        search: Option<String>,

        /// Primary attribute filter: all, str, agi, int, universal
        #[arg(long, default_value = "all")]
        attr: CategoryFilter,

        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Hero catalog
    Grid {
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "all")]
        attr: CategoryFilter,
    },

    /// Single hero page with its best matchups and items
    Hero {
        /// Hero id
        id: String,

        #[arg(long)]
        rating: Option<RatingBracket>,

        /// Panel series: raw, with, against, item
        #[arg(long = "type", default_value = "raw")]
        stats_type: StatsType,
    },

    /// Dump a normalized statistics series
    Stats {
        #[arg(long)]
        rating: Option<RatingBracket>,

        /// Series: raw, gpm, xpm, against, with, item
        #[arg(long = "type")]
        stats_type: StatsType,

        /// Limit to one hero via the per-hero endpoint
        #[arg(long)]
        hero: Option<HeroId>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(session) = &cli.session {
        config.api.session_id = Some(session.clone());
    }
    config.validate()?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting dota-dash v{}", env!("CARGO_PKG_VERSION"));

    let source: Arc<dyn StatsSource> = match &cli.fixture {
        Some(path) => {
            tracing::info!("Using fixture {}", path);
            Arc::new(InMemorySource::from_file(Path::new(path))?)
        }
        None => Arc::new(ApiClient::new(&config.api)?),
    };
    let normalizer = Normalizer::new(config.view.rate_scale);
    let default_rating = config.view.default_rating;
    let page_size = config.view.page_size;

    match cli.command {
        Commands::Profile { page } => {
            let mut view = ProfileView::new(source, page_size);
            view.load().await;
            let data = ready_or_exit(view.state().await);
            if page != 1 && !view.go_to_page(page).await {
                tracing::warn!("Page {} does not exist, showing page 1", page);
            }
            let Some(matches) = view.match_page().await else {
                return Ok(());
            };
            if cli.json {
                print_json(&(&data.user, &matches))?;
            } else {
                print!("{}", render::render_profile(&data.user, &matches));
            }
        }
        Commands::Heroes {
            rating,
            sort,
            asc,
            search,
            attr,
            page,
        } => {
            let rating = rating.unwrap_or(default_rating);
            let mut view = HeroesTableView::new(source, normalizer, rating, page_size);
            let direction = if asc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            view.set_sort(sort, direction);
            view.set_category(attr);
            if let Some(search) = search {
                view.set_search(search);
            }

            view.load().await;
            ready_or_exit(view.state().await);
            if page != 1 && !view.go_to_page(page).await {
                tracing::warn!("Page {} does not exist, showing page 1", page);
            }
            let Some(table) = view.visible().await else {
                return Ok(());
            };
            if cli.json {
                print_json(&table)?;
            } else {
                print!("{}", render::render_table(&table));
            }
        }
        Commands::Grid { search, attr } => {
            let mut view = HeroGridView::new(source);
            view.set_category(attr);
            if let Some(search) = search {
                view.set_search(search);
            }

            view.load().await;
            ready_or_exit(view.state().await);
            let heroes = view.visible().await.unwrap_or_default();
            if cli.json {
                print_json(&heroes)?;
            } else {
                print!("{}", render::render_grid(&heroes));
            }
        }
        Commands::Hero {
            id,
            rating,
            stats_type,
        } => {
            let rating = rating.unwrap_or(default_rating);
            let page = HeroPageView::new(Arc::clone(&source), normalizer, id, rating)
                .with_stats_type(stats_type);
            page.load().await;
            let hero = ready_or_exit(page.hero_state().await);
            let panel = page.panel_state().await;

            let detail = HeroDetailView::new(source, normalizer, hero.id, rating);
            detail.load().await;
            let detail = detail.state().await;

            if cli.json {
                print_json(&serde_json::json!({
                    "hero": hero,
                    "stats_type": stats_type,
                    "panel": panel.ready(),
                    "detail": detail.ready(),
                }))?;
                return Ok(());
            }

            print!("{}", render::render_hero_header(&hero));
            println!("\n=== {} (rating {}) ===", stats_type, rating);
            match &panel {
                Loadable::Ready(panel) => print!("{}", render::render_panel(panel)),
                Loadable::Failed(e) => println!("{}", render::render_error(e)),
                _ => {}
            }
            match &detail {
                Loadable::Ready(detail) => print!("{}", render::render_detail(detail)),
                Loadable::Failed(e) => println!("\n{}", render::render_error(e)),
                _ => {}
            }
        }
        Commands::Stats {
            rating,
            stats_type,
            hero,
        } => {
            let rating = rating.unwrap_or(default_rating);
            let payload = match hero {
                Some(hero) => source.hero_stats(rating, hero, stats_type).await?,
                None => source.all_stats(rating, stats_type).await?,
            };
            match stats_type {
                StatsType::Raw | StatsType::Gpm | StatsType::Xpm => match hero {
                    Some(hero) => {
                        print_json(&normalizer.hero_record(payload, stats_type, hero)?)?
                    }
                    None => print_json(&normalizer.stat_records(payload, stats_type)?)?,
                },
                StatsType::Against | StatsType::With => {
                    print_json(&normalizer.matchups(payload, stats_type, hero)?)?
                }
                StatsType::Item => {
                    let items = normalizer.items(payload)?;
                    let items: Vec<_> = match hero {
                        Some(hero) => items.into_iter().filter(|i| i.hero_id == hero).collect(),
                        None => items,
                    };
                    print_json(&items)?
                }
            }
        }
    }

    Ok(())
}

/// Unwrap a loaded screen, or print its error with a retry hint and exit.
fn ready_or_exit<T>(state: Loadable<T>) -> T {
    match state {
        Loadable::Ready(value) => value,
        Loadable::Failed(e) => {
            eprintln!("{}", render::render_error(&e));
            std::process::exit(1);
        }
        Loadable::Idle | Loadable::Loading => {
            eprintln!("No data loaded");
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
