// Filter, pipeline and index documents are plain builders; `exec` sends them.
pub mod eval;
pub mod filters;
pub mod pipelines;

mod exec;
mod parse;
mod session;
mod types;

pub use eval::{compare_bson, compare_docs, is_sorted_by, matches_filter};
pub use exec::{
    author_with_most_books, avg_price_by_genre, create_indexes, delete_by_title, drop_collection,
    explain_query, find_by_author, find_by_genre, find_projected, find_published_after,
    group_by_decade, in_stock_after, insert_books, list_index_names, paginate, paginate_sorted,
    projection_title_author_price, skip_for_page, sort_by_price, update_price,
};
pub use parse::parse_filter_json;
pub use pipelines::decade_of;
pub use session::{with_collection, with_database};
pub use types::{
    AuthorCount, DecadeCount, DeleteReport, ExplainSummary, GenrePriceStats, Order, Projection,
    SortSpec, UpdateReport,
};
