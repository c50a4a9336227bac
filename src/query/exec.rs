use crate::book::{Book, BookSummary};
use crate::config::ConnectionConfig;
use crate::errors::DbError;
use crate::logger::AUDIT_TARGET;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{Collection, IndexModel};
use std::time::Instant;

use super::filters;
use super::pipelines;
use super::session::{with_collection, with_database};
use super::types::{
    AuthorCount, DecadeCount, DeleteReport, GenrePriceStats, Order, Projection, SortSpec,
    UpdateReport,
};

fn audit(op: &str, cfg: &ConnectionConfig, started: Instant, fields: serde_json::Value) {
    let mut line = serde_json::json!({
        "op": op,
        "ns": cfg.namespace(),
        "duration_ms": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    if let (Some(obj), serde_json::Value::Object(extra)) = (line.as_object_mut(), fields) {
        obj.extend(extra);
    }
    log::info!(target: AUDIT_TARGET, "{line}");
}

async fn find_books(
    op: &str,
    cfg: &ConnectionConfig,
    filter: Document,
    sort: Option<Document>,
    window: Option<(u64, i64)>,
) -> Result<Vec<Book>, DbError> {
    log::debug!("{op}: filter={filter} sort={sort:?} window={window:?}");
    let started = Instant::now();
    let books = with_collection(cfg, move |coll| async move {
        let coll: Collection<Book> = coll.clone_with_type();
        let mut find = coll.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        if let Some((skip, limit)) = window {
            find = find.skip(skip).limit(limit);
        }
        let cursor = find.await?;
        Ok::<_, DbError>(cursor.try_collect::<Vec<Book>>().await?)
    })
    .await?;
    audit(op, cfg, started, serde_json::json!({ "result_count": books.len() }));
    Ok(books)
}

async fn aggregate(
    op: &str,
    cfg: &ConnectionConfig,
    pipeline: Vec<Document>,
) -> Result<Vec<Document>, DbError> {
    let started = Instant::now();
    let rows = with_collection(cfg, move |coll| async move {
        let cursor = coll.aggregate(pipeline).await?;
        Ok::<_, DbError>(cursor.try_collect::<Vec<Document>>().await?)
    })
    .await?;
    audit(op, cfg, started, serde_json::json!({ "result_count": rows.len() }));
    Ok(rows)
}

/// All records whose `genre` equals `genre`.
///
/// # Errors
/// Connection, query, or decode failures.
pub async fn find_by_genre(cfg: &ConnectionConfig, genre: &str) -> Result<Vec<Book>, DbError> {
    find_books("find_by_genre", cfg, filters::by_genre(genre), None, None).await
}

/// # Errors
/// Connection, query, or decode failures.
pub async fn find_by_author(cfg: &ConnectionConfig, author: &str) -> Result<Vec<Book>, DbError> {
    find_books("find_by_author", cfg, filters::by_author(author), None, None).await
}

/// Records with `published_year` strictly greater than `year`.
///
/// # Errors
/// Connection, query, or decode failures.
pub async fn find_published_after(
    cfg: &ConnectionConfig,
    year: i32,
) -> Result<Vec<Book>, DbError> {
    find_books("find_published_after", cfg, filters::published_after(year), None, None).await
}

/// In-stock records published after `year`.
///
/// # Errors
/// Connection, query, or decode failures.
pub async fn in_stock_after(cfg: &ConnectionConfig, year: i32) -> Result<Vec<Book>, DbError> {
    find_books("in_stock_after", cfg, filters::in_stock_after(year), None, None).await
}

/// Set `price` on the first record titled `title`. Zero counts when nothing matches.
///
/// # Errors
/// Connection or query failures.
pub async fn update_price(
    cfg: &ConnectionConfig,
    title: &str,
    new_price: f64,
) -> Result<UpdateReport, DbError> {
    let started = Instant::now();
    let filter = filters::by_title(title);
    let update = filters::set_price(new_price);
    let report = with_collection(cfg, move |coll| async move {
        Ok::<_, DbError>(UpdateReport::from(coll.update_one(filter, update).await?))
    })
    .await?;
    audit(
        "update_price",
        cfg,
        started,
        serde_json::json!({ "matched": report.matched, "modified": report.modified }),
    );
    Ok(report)
}

/// Remove the first record titled `title`.
///
/// # Errors
/// Connection or query failures.
pub async fn delete_by_title(cfg: &ConnectionConfig, title: &str) -> Result<DeleteReport, DbError> {
    let started = Instant::now();
    let filter = filters::by_title(title);
    let report = with_collection(cfg, move |coll| async move {
        Ok::<_, DbError>(DeleteReport::from(coll.delete_one(filter).await?))
    })
    .await?;
    audit("delete_by_title", cfg, started, serde_json::json!({ "deleted": report.deleted }));
    Ok(report)
}

/// Every record reduced to `projection.fields`, without `_id`.
///
/// # Errors
/// Connection or query failures.
pub async fn find_projected(
    cfg: &ConnectionConfig,
    projection: &Projection,
) -> Result<Vec<Document>, DbError> {
    let started = Instant::now();
    let projection = projection.to_document();
    let docs = with_collection(cfg, move |coll| async move {
        let cursor = coll.find(doc! {}).projection(projection).await?;
        Ok::<_, DbError>(cursor.try_collect::<Vec<Document>>().await?)
    })
    .await?;
    audit("find_projected", cfg, started, serde_json::json!({ "result_count": docs.len() }));
    Ok(docs)
}

/// # Errors
/// Connection, query, or decode failures.
pub async fn projection_title_author_price(
    cfg: &ConnectionConfig,
) -> Result<Vec<BookSummary>, DbError> {
    find_projected(cfg, &Projection::title_author_price())
        .await?
        .into_iter()
        .map(|d| bson::from_document::<BookSummary>(d).map_err(DbError::from))
        .collect()
}

/// # Errors
/// Connection, query, or decode failures.
pub async fn sort_by_price(cfg: &ConnectionConfig, order: Order) -> Result<Vec<Book>, DbError> {
    let sort = SortSpec::new("price", order).to_document();
    find_books("sort_by_price", cfg, doc! {}, Some(sort), None).await
}

/// Number of records to skip for a 1-based `page`.
///
/// # Errors
/// `DbError::InvalidArgument` when `page` or `per_page` is zero, or the offset overflows.
pub fn skip_for_page(page: u64, per_page: u64) -> Result<u64, DbError> {
    if page == 0 {
        return Err(DbError::InvalidArgument("page numbers start at 1".into()));
    }
    if per_page == 0 {
        return Err(DbError::InvalidArgument("page size must be at least 1".into()));
    }
    (page - 1)
        .checked_mul(per_page)
        .filter(|s| i64::try_from(*s).is_ok())
        .ok_or_else(|| DbError::InvalidArgument(format!("page {page} x {per_page} is out of range")))
}

fn window(page: u64, per_page: u64) -> Result<(u64, i64), DbError> {
    let skip = skip_for_page(page, per_page)?;
    let limit = i64::try_from(per_page)
        .map_err(|_| DbError::InvalidArgument(format!("page size {per_page} is out of range")))?;
    Ok((skip, limit))
}

/// Page `page` (1-based) of `per_page` records in natural order.
///
/// # Errors
/// `DbError::InvalidArgument` for a zero page or page size; otherwise connection,
/// query, or decode failures.
pub async fn paginate(
    cfg: &ConnectionConfig,
    page: u64,
    per_page: u64,
) -> Result<Vec<Book>, DbError> {
    let w = window(page, per_page)?;
    find_books("paginate", cfg, doc! {}, None, Some(w)).await
}

/// Like [`paginate`] over a sorted read, so that consecutive pages tile the sorted sequence.
///
/// # Errors
/// See [`paginate`].
pub async fn paginate_sorted(
    cfg: &ConnectionConfig,
    page: u64,
    per_page: u64,
    sort: &SortSpec,
) -> Result<Vec<Book>, DbError> {
    let w = window(page, per_page)?;
    find_books("paginate_sorted", cfg, doc! {}, Some(sort.to_document()), Some(w)).await
}

/// Average price and record count per genre, ascending by genre.
///
/// # Errors
/// Connection or query failures, or an unexpected row shape.
pub async fn avg_price_by_genre(cfg: &ConnectionConfig) -> Result<Vec<GenrePriceStats>, DbError> {
    aggregate("avg_price_by_genre", cfg, pipelines::avg_price_by_genre())
        .await?
        .iter()
        .map(GenrePriceStats::try_from)
        .collect()
}

/// The author with the most records; `None` on an empty collection.
///
/// # Errors
/// Connection or query failures, or an unexpected row shape.
pub async fn author_with_most_books(cfg: &ConnectionConfig) -> Result<Option<AuthorCount>, DbError> {
    let rows = aggregate("author_with_most_books", cfg, pipelines::author_with_most_books()).await?;
    rows.first().map(AuthorCount::try_from).transpose()
}

/// Record counts per decade, ascending.
///
/// # Errors
/// Connection or query failures, or an unexpected row shape.
pub async fn group_by_decade(cfg: &ConnectionConfig) -> Result<Vec<DecadeCount>, DbError> {
    aggregate("group_by_decade", cfg, pipelines::group_by_decade())
        .await?
        .iter()
        .map(DecadeCount::try_from)
        .collect()
}

/// Ensure the `title` and `(author, published_year)` indexes exist. Safe to repeat.
///
/// # Errors
/// Connection or query failures.
pub async fn create_indexes(cfg: &ConnectionConfig) -> Result<Vec<String>, DbError> {
    let started = Instant::now();
    let models: Vec<IndexModel> = pipelines::book_index_keys()
        .into_iter()
        .map(|keys| IndexModel::builder().keys(keys).build())
        .collect();
    let names = with_collection(cfg, move |coll| async move {
        Ok::<_, DbError>(coll.create_indexes(models).await?.index_names)
    })
    .await?;
    audit("create_indexes", cfg, started, serde_json::json!({ "indexes": names }));
    Ok(names)
}

/// Names of all indexes on the collection, including `_id_`.
///
/// # Errors
/// Connection or query failures.
pub async fn list_index_names(cfg: &ConnectionConfig) -> Result<Vec<String>, DbError> {
    with_collection(cfg, |coll| async move { Ok::<_, DbError>(coll.list_index_names().await?) }).await
}

/// Run `find(filter)` through `explain` with `executionStats` verbosity.
///
/// # Errors
/// Connection or query failures.
pub async fn explain_query(cfg: &ConnectionConfig, filter: Document) -> Result<Document, DbError> {
    let started = Instant::now();
    let command = doc! {
        "explain": { "find": cfg.collection.as_str(), "filter": filter },
        "verbosity": "executionStats",
    };
    let explain =
        with_database(cfg, |db| async move { Ok::<_, DbError>(db.run_command(command).await?) }).await?;
    audit("explain_query", cfg, started, serde_json::json!({}));
    Ok(explain)
}

/// Bulk insert; returns how many records the server acknowledged.
///
/// # Errors
/// Connection or write failures. An empty slice is a no-op.
pub async fn insert_books(cfg: &ConnectionConfig, books: &[Book]) -> Result<usize, DbError> {
    if books.is_empty() {
        return Ok(0);
    }
    let started = Instant::now();
    let books = books.to_vec();
    let inserted = with_collection(cfg, move |coll| async move {
        let coll: Collection<Book> = coll.clone_with_type();
        Ok::<_, DbError>(coll.insert_many(books).await?.inserted_ids.len())
    })
    .await?;
    audit("insert_books", cfg, started, serde_json::json!({ "inserted": inserted }));
    Ok(inserted)
}

/// Drop the collection and its indexes. Dropping a missing collection succeeds.
///
/// # Errors
/// Connection or query failures.
pub async fn drop_collection(cfg: &ConnectionConfig) -> Result<(), DbError> {
    let started = Instant::now();
    with_collection(cfg, |coll| async move { Ok::<_, DbError>(coll.drop().await?) }).await?;
    audit("drop_collection", cfg, started, serde_json::json!({}));
    Ok(())
}
