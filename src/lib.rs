pub mod book;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod query;

use crate::book::{Book, BookSummary};
use crate::config::ConnectionConfig;
use crate::errors::DbError;
use crate::query::{
    AuthorCount, DecadeCount, DeleteReport, GenrePriceStats, Order, Projection, SortSpec,
    UpdateReport,
};
use bson::Document;

/// Query façade bound to one connection configuration.
///
/// Holds no connection: every call opens its own client and closes it before returning.
#[derive(Debug, Clone, Default)]
pub struct Bookstore {
    config: ConnectionConfig,
}

impl Bookstore {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Local defaults with `MONGODB_URI` applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ConnectionConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    // --- Query API (façade over query module) ---
    pub async fn find_by_genre(&self, genre: &str) -> Result<Vec<Book>, DbError> {
        query::find_by_genre(&self.config, genre).await
    }

    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Book>, DbError> {
        query::find_by_author(&self.config, author).await
    }

    pub async fn find_published_after(&self, year: i32) -> Result<Vec<Book>, DbError> {
        query::find_published_after(&self.config, year).await
    }

    pub async fn update_price(&self, title: &str, new_price: f64) -> Result<UpdateReport, DbError> {
        query::update_price(&self.config, title, new_price).await
    }

    pub async fn delete_by_title(&self, title: &str) -> Result<DeleteReport, DbError> {
        query::delete_by_title(&self.config, title).await
    }

    pub async fn in_stock_after(&self, year: i32) -> Result<Vec<Book>, DbError> {
        query::in_stock_after(&self.config, year).await
    }

    pub async fn find_projected(&self, projection: &Projection) -> Result<Vec<Document>, DbError> {
        query::find_projected(&self.config, projection).await
    }

    pub async fn projection_title_author_price(&self) -> Result<Vec<BookSummary>, DbError> {
        query::projection_title_author_price(&self.config).await
    }

    pub async fn sort_by_price(&self, order: Order) -> Result<Vec<Book>, DbError> {
        query::sort_by_price(&self.config, order).await
    }

    pub async fn paginate(&self, page: u64, per_page: u64) -> Result<Vec<Book>, DbError> {
        query::paginate(&self.config, page, per_page).await
    }

    pub async fn paginate_sorted(
        &self,
        page: u64,
        per_page: u64,
        sort: &SortSpec,
    ) -> Result<Vec<Book>, DbError> {
        query::paginate_sorted(&self.config, page, per_page, sort).await
    }

    pub async fn avg_price_by_genre(&self) -> Result<Vec<GenrePriceStats>, DbError> {
        query::avg_price_by_genre(&self.config).await
    }

    pub async fn author_with_most_books(&self) -> Result<Option<AuthorCount>, DbError> {
        query::author_with_most_books(&self.config).await
    }

    pub async fn group_by_decade(&self) -> Result<Vec<DecadeCount>, DbError> {
        query::group_by_decade(&self.config).await
    }

    pub async fn create_indexes(&self) -> Result<Vec<String>, DbError> {
        query::create_indexes(&self.config).await
    }

    pub async fn list_index_names(&self) -> Result<Vec<String>, DbError> {
        query::list_index_names(&self.config).await
    }

    pub async fn explain_query(&self, filter: Document) -> Result<Document, DbError> {
        query::explain_query(&self.config, filter).await
    }

    pub async fn insert_books(&self, books: &[Book]) -> Result<usize, DbError> {
        query::insert_books(&self.config, books).await
    }

    pub async fn drop_collection(&self) -> Result<(), DbError> {
        query::drop_collection(&self.config).await
    }
}

/// Install logging from `PLP_BOOKSTORE_LOG_*`. Call once before the first query.
pub fn init() {
    logger::configure_from_env();
}
