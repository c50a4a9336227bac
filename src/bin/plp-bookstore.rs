use clap::{Parser, Subcommand};
use plp_bookstore::cli::{self as prog_cli, OutputMode};
use plp_bookstore::config::AppConfig;
use plp_bookstore::query::{Order, SortSpec};
use plp_bookstore::{Bookstore, logger};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plp-bookstore", version, about = "Queries against the plp_bookstore.books collection", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). Falls back to $PLP_BOOKSTORE_CONFIG.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Connection string. Takes precedence over $MONGODB_URI and the config file.")]
    uri: Option<String>,
    #[arg(long, help = "Database name (default plp_bookstore)")]
    db: Option<String>,
    #[arg(long, help = "Collection name (default books)")]
    collection: Option<String>,
    #[arg(long, help = "Print one JSON object per result instead of headings and pretty JSON")]
    json: bool,
    #[arg(long, help = "error|warn|info|debug|trace|off (default info)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the sample query sequence (default when no subcommand is given)")]
    Demo,
    #[command(name = "find-genre", about = "Books of a genre")]
    FindGenre { genre: String },
    #[command(name = "find-author", about = "Books by an author")]
    FindAuthor { author: String },
    #[command(name = "find-after", about = "Books published after a year")]
    FindAfter {
        #[arg(allow_negative_numbers = true)]
        year: i32,
    },
    #[command(name = "in-stock-after", about = "In-stock books published after a year")]
    InStockAfter {
        #[arg(allow_negative_numbers = true)]
        year: i32,
    },
    #[command(name = "update-price", about = "Set the price of the book with this title")]
    UpdatePrice { title: String, price: f64 },
    #[command(about = "Delete the book with this title")]
    Delete { title: String },
    #[command(about = "Insert the sample catalogue")]
    Seed {
        #[arg(long, help = "Drop the collection first")]
        reset: bool,
    },
    #[command(about = "Read selected fields only (default: title, author, price)")]
    Projection {
        #[arg(long, value_delimiter = ',', help = "Comma-separated field list")]
        fields: Option<Vec<String>>,
    },
    #[command(name = "sort-price", about = "All books ordered by price")]
    SortPrice {
        #[arg(long, default_value = "asc", help = "asc|desc")]
        order: String,
    },
    #[command(about = "One page of books")]
    Page {
        #[arg(default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 5)]
        per_page: u64,
        #[arg(long, help = "Sort key for stable paging, e.g. title")]
        sort: Option<String>,
        #[arg(long, default_value = "asc", help = "asc|desc, used with --sort")]
        order: String,
    },
    #[command(name = "avg-price-by-genre", about = "Average price and count per genre")]
    AvgPriceByGenre,
    #[command(name = "top-author", about = "Author with the most books")]
    TopAuthor,
    #[command(name = "by-decade", about = "Book counts per publication decade")]
    ByDecade,
    #[command(name = "create-indexes", about = "Ensure the title and author+published_year indexes")]
    CreateIndexes,
    #[command(name = "list-indexes", about = "Index names on the collection")]
    ListIndexes,
    #[command(about = "Explain a find with executionStats")]
    Explain {
        #[arg(default_value = r#"{"title": "1984"}"#, help = "Filter as a JSON object")]
        filter: String,
        #[arg(long, help = "Print plan stage, index and counters instead of the raw explain")]
        summary: bool,
    },
}

fn to_command(cmd: Commands) -> Result<prog_cli::Command, plp_bookstore::errors::DbError> {
    use prog_cli::Command as C;
    Ok(match cmd {
        Commands::Demo => C::Demo,
        Commands::FindGenre { genre } => C::FindGenre { genre },
        Commands::FindAuthor { author } => C::FindAuthor { author },
        Commands::FindAfter { year } => C::FindAfter { year },
        Commands::InStockAfter { year } => C::InStockAfter { year },
        Commands::UpdatePrice { title, price } => C::UpdatePrice { title, price },
        Commands::Delete { title } => C::Delete { title },
        Commands::Seed { reset } => C::Seed { reset },
        Commands::Projection { fields } => C::Projection { fields },
        Commands::SortPrice { order } => C::SortPrice { order: order.parse::<Order>()? },
        Commands::Page { page, per_page, sort, order } => {
            let order = order.parse::<Order>()?;
            C::Page { page, per_page, sort: sort.map(|f| SortSpec::new(&f, order)) }
        }
        Commands::AvgPriceByGenre => C::AvgPriceByGenre,
        Commands::TopAuthor => C::TopAuthor,
        Commands::ByDecade => C::ByDecade,
        Commands::CreateIndexes => C::CreateIndexes,
        Commands::ListIndexes => C::ListIndexes,
        Commands::Explain { filter, summary } => C::Explain { filter_json: filter, summary },
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let overrides = AppConfig {
        uri: cli.uri.clone(),
        database: cli.db.clone(),
        collection: cli.collection.clone(),
        log_level: cli.log_level.clone().or_else(|| std::env::var(logger::LOG_LEVEL_ENV).ok()),
        log_dir: std::env::var(logger::LOG_DIR_ENV).ok().map(PathBuf::from),
    };
    let cfg = match AppConfig::load(overrides, cli.config.as_deref(), |k| std::env::var(k).ok()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    logger::configure_logging(cfg.log_dir.as_deref(), cfg.log_level.as_deref());

    let store = Bookstore::new(cfg.connection());
    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let r = match to_command(cli.command.unwrap_or(Commands::Demo)) {
        Ok(cmd) => prog_cli::run_with_format(&store, cmd, mode).await,
        Err(e) => Err(e),
    };
    if let Err(e) = r {
        if log::log_enabled!(log::Level::Error) {
            log::error!("Error in queries demo: {e}");
        } else {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}
