use crate::query::{Order, SortSpec};

pub enum Command {
    /// The sample sequence run when no subcommand is given.
    Demo,
    // Filters
    FindGenre {
        genre: String,
    },
    FindAuthor {
        author: String,
    },
    FindAfter {
        year: i32,
    },
    InStockAfter {
        year: i32,
    },
    // Writes
    UpdatePrice {
        title: String,
        price: f64,
    },
    Delete {
        title: String,
    },
    Seed {
        reset: bool,
    },
    // Shaped reads
    Projection {
        fields: Option<Vec<String>>,
    },
    SortPrice {
        order: Order,
    },
    Page {
        page: u64,
        per_page: u64,
        sort: Option<SortSpec>,
    },
    // Aggregates
    AvgPriceByGenre,
    TopAuthor,
    ByDecade,
    // Indexes & diagnostics
    CreateIndexes,
    ListIndexes,
    Explain {
        filter_json: String,
        summary: bool,
    },
}
