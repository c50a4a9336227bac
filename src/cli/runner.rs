use crate::Bookstore;
use crate::book::sample_books;
use crate::errors::DbError;
use crate::query::{self, ExplainSummary, Projection};
use bson::doc;
use serde::Serialize;

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

/// Render one result. Human mode prints a heading and pretty JSON; Json mode prints
/// a single `{"step": .., "result": ..}` line.
///
/// # Errors
/// Returns `DbError::Json` if the value cannot be serialized.
pub fn render<T: Serialize>(mode: OutputMode, label: &str, value: &T) -> Result<String, DbError> {
    Ok(match mode {
        OutputMode::Human => format!("\n{label}:\n{}", serde_json::to_string_pretty(value)?),
        OutputMode::Json => {
            serde_json::to_string(&serde_json::json!({ "step": label, "result": value }))?
        }
    })
}

fn emit<T: Serialize>(mode: OutputMode, label: &str, value: &T) -> Result<(), DbError> {
    println!("{}", render(mode, label, value)?);
    Ok(())
}

/// # Errors
/// The first failing query, or a JSON serialization error.
pub async fn run_demo(store: &Bookstore, mode: OutputMode) -> Result<(), DbError> {
    if mode == OutputMode::Human {
        println!("Connecting to {}", store.config().redacted_uri());
    }
    emit(mode, "1) Find Fiction books", &store.find_by_genre("Fiction").await?)?;
    emit(mode, "2) Find books published after 2000", &store.find_published_after(2000).await?)?;
    emit(
        mode,
        "3) Projection (title, author, price)",
        &store.projection_title_author_price().await?,
    )?;
    emit(mode, "4) Aggregation: average price by genre", &store.avg_price_by_genre().await?)?;
    emit(
        mode,
        "5) Create indexes (title, author+published_year)",
        &store.create_indexes().await?,
    )?;
    emit(
        mode,
        "6) Explain example query (title = \"1984\")",
        &store.explain_query(doc! { "title": "1984" }).await?,
    )?;
    if mode == OutputMode::Human {
        println!("\nDemo complete. Run with --help to call specific queries.");
    }
    Ok(())
}

/// # Errors
/// Whatever the underlying query returns, or a JSON serialization error.
pub async fn run_with_format(
    store: &Bookstore,
    cmd: Command,
    mode: OutputMode,
) -> Result<(), DbError> {
    match cmd {
        Command::Demo => run_demo(store, mode).await,
        Command::FindGenre { genre } => {
            emit(mode, &format!("Books in genre {genre}"), &store.find_by_genre(&genre).await?)
        }
        Command::FindAuthor { author } => {
            emit(mode, &format!("Books by {author}"), &store.find_by_author(&author).await?)
        }
        Command::FindAfter { year } => emit(
            mode,
            &format!("Books published after {year}"),
            &store.find_published_after(year).await?,
        ),
        Command::InStockAfter { year } => emit(
            mode,
            &format!("In-stock books published after {year}"),
            &store.in_stock_after(year).await?,
        ),
        Command::UpdatePrice { title, price } => emit(
            mode,
            &format!("Update price of {title}"),
            &store.update_price(&title, price).await?,
        ),
        Command::Delete { title } => {
            emit(mode, &format!("Delete {title}"), &store.delete_by_title(&title).await?)
        }
        Command::Seed { reset } => {
            if reset {
                store.drop_collection().await?;
            }
            let inserted = store.insert_books(&sample_books()).await?;
            emit(mode, "Seed", &serde_json::json!({ "inserted": inserted, "reset": reset }))
        }
        Command::Projection { fields } => match fields {
            Some(fields) => emit(
                mode,
                &format!("Projection ({})", fields.join(", ")),
                &store.find_projected(&Projection::new(&fields)).await?,
            ),
            None => emit(
                mode,
                "Projection (title, author, price)",
                &store.projection_title_author_price().await?,
            ),
        },
        Command::SortPrice { order } => {
            emit(mode, &format!("Books by price ({order:?})"), &store.sort_by_price(order).await?)
        }
        Command::Page { page, per_page, sort } => {
            let books = match &sort {
                Some(s) => store.paginate_sorted(page, per_page, s).await?,
                None => store.paginate(page, per_page).await?,
            };
            emit(mode, &format!("Page {page} ({per_page} per page)"), &books)
        }
        Command::AvgPriceByGenre => {
            emit(mode, "Average price by genre", &store.avg_price_by_genre().await?)
        }
        Command::TopAuthor => {
            emit(mode, "Author with most books", &store.author_with_most_books().await?)
        }
        Command::ByDecade => emit(mode, "Books per decade", &store.group_by_decade().await?),
        Command::CreateIndexes => emit(mode, "Create indexes", &store.create_indexes().await?),
        Command::ListIndexes => emit(mode, "Indexes", &store.list_index_names().await?),
        Command::Explain { filter_json, summary } => {
            let filter = query::parse_filter_json(&filter_json)?;
            let explain = store.explain_query(filter).await?;
            if summary {
                emit(mode, "Explain summary", &ExplainSummary::from_explain(&explain))
            } else {
                emit(mode, "Explain", &explain)
            }
        }
    }
}

/// [`run_with_format`] with human-readable output.
///
/// # Errors
/// See [`run_with_format`].
pub async fn run(store: &Bookstore, cmd: Command) -> Result<(), DbError> {
    run_with_format(store, cmd, OutputMode::Human).await
}
