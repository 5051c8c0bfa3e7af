mod app;
mod cards;
mod category;
mod config;
mod constants;
mod error;
mod selector;
mod youtube;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{App, FetchRequest, ViewState};
use cards::{PLAIN, Palette};
use category::{find_category, health_categories};
use config::Config;
use youtube::{ClientConfig, VideoSearch, VideoSearchClient};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Discover health videos on YouTube", long_about = None)]
struct Args {
  /// YouTube Data API key
  #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, global = true)]
  api_key: Option<String>,

  /// Print records as JSON instead of cards
  #[arg(long, global = true)]
  json: bool,

  /// Disable ANSI colours
  #[arg(long, global = true)]
  no_color: bool,

  /// Retry a failed fetch this many times before giving up
  #[arg(long, default_value_t = 0, global = true)]
  retries: u32,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// A random mix of health videos (default)
  Random {
    /// Only show videos matching this category's keywords
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Search for a topic
  Search {
    query: String,
    #[arg(short = 'n', long, default_value_t = 5)]
    count: usize,
  },
  /// Videos for one health category (see `categories`)
  Category {
    id: String,
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,
  },
  /// List health categories
  Categories,
  /// Show or change the dark-mode preference
  Theme { mode: Option<ThemeMode> },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeMode {
  Dark,
  Light,
  Toggle,
}

// --- Logging ---

/// Log to a daily file in the data dir so stdout stays clean for cards/JSON.
fn init_logging() -> Option<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", "healthtube")?;
  let log_dir = dirs.data_local_dir().join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "healthtube.log"));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("healthtube=info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

/// `--api-key` / `YOUTUBE_API_KEY`, then the legacy public variable. Blank values count as unset.
fn resolve_api_key(arg: Option<String>, legacy: Option<String>) -> Option<String> {
  let present = |k: &String| !k.trim().is_empty();
  arg.filter(present).or_else(|| legacy.filter(present))
}

/// Search box input: trimmed, and refused when nothing is left.
fn query_request(query: &str, count: usize) -> Result<FetchRequest> {
  let query = query.trim();
  if query.is_empty() {
    return Err(anyhow!("Search query is empty"));
  }
  Ok(FetchRequest::Query { query: query.to_string(), count })
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_logging();
  info!(version = env!("CARGO_PKG_VERSION"), "healthtube starting");

  let mut config = Config::load();
  let palette = if args.no_color || args.json { PLAIN } else { cards::palette(config.is_dark()) };

  let request = match args.command.unwrap_or(Command::Random { filter: None }) {
    Command::Categories => {
      for cat in health_categories() {
        println!("{}", cards::render_category(cat, &palette));
      }
      return Ok(());
    }
    Command::Theme { mode } => {
      let dark = match mode {
        None => config.is_dark(),
        Some(ThemeMode::Toggle) => config.toggle_dark_mode(),
        Some(ThemeMode::Dark | ThemeMode::Light) => {
          let dark = matches!(mode, Some(ThemeMode::Dark));
          config.dark_mode = Some(dark);
          dark
        }
      };
      if mode.is_some() {
        config.save();
      }
      println!("{}", if dark { "dark" } else { "light" });
      return Ok(());
    }
    Command::Random { filter } => {
      let filter = match filter {
        Some(id) => Some(find_category(&id).ok_or_else(|| anyhow!("Unknown category: {}", id))?),
        None => None,
      };
      (FetchRequest::Random, filter)
    }
    Command::Search { query, count } => (query_request(&query, count)?, None),
    Command::Category { id, count } => {
      let category =
        find_category(&id).ok_or_else(|| anyhow!("Unknown category: {} (try `healthtube categories`)", id))?;
      (FetchRequest::Category { category, count }, None)
    }
  };

  let api_key = resolve_api_key(args.api_key, std::env::var("NEXT_PUBLIC_YOUTUBE_API_KEY").ok());
  let client = VideoSearchClient::new(ClientConfig::new(api_key));
  let output = Output { json: args.json, retries: args.retries, palette };
  run(Arc::new(client), request, &output).await
}

struct Output {
  json: bool,
  retries: u32,
  palette: Palette,
}

async fn run(
  client: Arc<dyn VideoSearch>,
  (request, filter): (FetchRequest, Option<category::CategoryDefinition>),
  out: &Output,
) -> Result<()> {
  let mut app = App::new(client);
  app.category_filter = filter;
  app.trigger(request);
  if !out.json
    && let Some(msg) = &app.status_message
  {
    eprintln!("{}", msg);
  }
  app.settle().await;

  let mut retries_left = out.retries;
  while let ViewState::Error(msg) = &app.view
    && retries_left > 0
  {
    eprintln!("{} (retrying)", msg);
    retries_left -= 1;
    app.retry();
    app.settle().await;
  }

  let (json, palette) = (out.json, &out.palette);

  match &app.view {
    ViewState::Content => {
      let visible = app.visible();
      if json {
        println!("{}", serde_json::to_string_pretty(&visible).context("Failed to serialize videos")?);
      } else if visible.is_empty() {
        println!("No videos match the selected category.");
      } else {
        println!("{}", cards::render_cards(visible, palette));
      }
      Ok(())
    }
    ViewState::Empty => {
      if json {
        println!("[]");
      } else {
        println!("No videos found.");
      }
      Ok(())
    }
    ViewState::Error(msg) => Err(anyhow!("{}", msg)),
    ViewState::Idle | ViewState::Loading => Err(anyhow!("Fetch did not complete")),
  }
}
