use std::error::Error;
use std::path::PathBuf;

use atty::Stream;
use clap::{Parser, Subcommand};
use daily_words::{
    AppConfig, CategoryOutcome, CategoryView, DailyWords, HistoryEntry, WordEntry, WordOfTheDay,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "daily-words", about = "A few new words every day", version)]
pub struct Cli {
    /// Emit JSON instead of formatted cards.
    #[arg(long, global = true)]
    json: bool,

    /// JSON file used as the key-value store (defaults to $DAILY_WORDS_STORE).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show today's words, fetching them if the cache is stale.
    Today,
    /// List the words of previous days, newest first.
    History,
    /// List saved favorites.
    Favorites,
    /// Save one of today's words as a favorite.
    Favorite {
        /// Word from today's list.
        word: String,
    },
    /// Show words related to a topic.
    Category {
        /// Topic or meaning to search for.
        topic: String,
    },
    /// Show or change preferences.
    Settings {
        /// Enable or disable dark mode for the web pages.
        #[arg(long)]
        dark_mode: Option<bool>,
        /// Number of words fetched per day.
        #[arg(long)]
        count: Option<usize>,
    },
    /// Run the HTTP front end.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used for canonical links.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = AppConfig::from_env();
    if let Some(path) = cli.store.clone() {
        config.store_path = Some(path);
    }
    let app = daily_words::open(&config).map_err(|err| err.to_string())?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match cli.command {
            Command::Today => handle_today(&app, cli.json).await,
            Command::History => handle_history(&app, cli.json),
            Command::Favorites => handle_favorites(&app, cli.json),
            Command::Favorite { word } => handle_favorite(&app, &word, cli.json).await,
            Command::Category { topic } => handle_category(&app, &topic, cli.json).await,
            Command::Settings { dark_mode, count } => {
                handle_settings(&app, dark_mode, count, cli.json)
            }
            #[cfg(feature = "web")]
            Command::Serve { addr, base_url } => {
                daily_words::web::serve(daily_words::web::WebConfig { addr, base_url }, app)
                    .await?;
                Ok(())
            }
        }
    })
}

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn handle_today(app: &WordOfTheDay, as_json: bool) -> Result<(), Box<dyn Error>> {
    let daily = app.load_words().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&daily)?);
        return Ok(());
    }
    match &daily {
        DailyWords::Unavailable => {
            return Err("Could not load daily words. Try again.".into());
        }
        DailyWords::Cached(words) | DailyWords::Fresh(words) => {
            println!("Words for {}:", app.today());
            print_cards(words, "Nothing to show.");
        }
    }
    Ok(())
}

fn handle_history(app: &WordOfTheDay, as_json: bool) -> Result<(), Box<dyn Error>> {
    let history = app.load_history();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print_history(&history);
    }
    Ok(())
}

fn handle_favorites(app: &WordOfTheDay, as_json: bool) -> Result<(), Box<dyn Error>> {
    let favorites = app.load_favorites();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&favorites)?);
    } else {
        print_cards(&favorites, "No favorites yet.");
    }
    Ok(())
}

async fn handle_favorite(
    app: &WordOfTheDay,
    word: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let daily = app.load_words().await?;
    let entry = daily
        .words()
        .iter()
        .find(|entry| entry.word().eq_ignore_ascii_case(word.trim()))
        .ok_or_else(|| format!("{word:?} is not one of today's words"))?;
    let added = app.add_favorite(entry)?;

    if as_json {
        let payload = json!({ "word": entry.word(), "added": added });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if added {
        println!("Added \"{}\" to favorites!", entry.word());
    } else {
        println!("\"{}\" is already a favorite.", entry.word());
    }
    Ok(())
}

async fn handle_category(
    app: &WordOfTheDay,
    topic: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if topic.trim().is_empty() {
        return Err("Topic cannot be empty".into());
    }
    let view = app.load_category(topic).await;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    print_category(&view);
    Ok(())
}

fn handle_settings(
    app: &WordOfTheDay,
    dark_mode: Option<bool>,
    count: Option<usize>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if let Some(enabled) = dark_mode {
        app.set_dark_mode(enabled)?;
    }
    if let Some(count) = count {
        app.set_daily_word_count(count)?;
    }
    let dark_mode = app.dark_mode();
    let count = app.daily_word_count();
    if as_json {
        let payload = json!({ "darkMode": dark_mode, "dailyWordCount": count });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Dark mode:     {}", if dark_mode { "on" } else { "off" });
        println!("Words per day: {count}");
    }
    Ok(())
}

fn print_category(view: &CategoryView) {
    match &view.outcome {
        CategoryOutcome::Found { words } => {
            println!("Words for {}:", view.topic);
            print_cards(words, "Nothing to show.");
        }
        CategoryOutcome::Fallback { words } => {
            println!(
                "⚠ No valid words found for {}, showing random instead.",
                view.topic
            );
            print_cards(words, "Nothing to show.");
        }
        CategoryOutcome::Failed { message } => println!("{message}"),
    }
}

fn print_history(history: &[HistoryEntry]) {
    if history.is_empty() {
        println!("No history yet.");
        return;
    }
    let width = history
        .iter()
        .flat_map(|entry| entry.words.iter())
        .map(|w| w.word().len())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    for entry in history {
        println!("\n{}", entry.date);
        println!("{:-<width$}", "", width = width + 2);
        for w in &entry.words {
            println!("{:<width$}  {}", w.word(), w.meaning(), width = width);
        }
    }
}

fn print_cards(words: &[WordEntry], empty_message: &str) {
    if words.is_empty() {
        println!("{empty_message}");
        return;
    }
    for w in words {
        let body = format!(
            "**Meaning:** {}\n\n**Example:** *{}*",
            w.meaning(),
            w.example()
        );
        render_markdown_block(w.word(), &body);
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn markdown_skin() -> MadSkin {
    MadSkin::default()
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = markdown_skin();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
