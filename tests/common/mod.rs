//! Live-server helpers. Tests that need MongoDB call `live_store` and return early
//! when `PLP_BOOKSTORE_TEST_URI` is unset.
#![allow(dead_code)]

use plp_bookstore::Bookstore;
use plp_bookstore::book::Book;
use plp_bookstore::config::ConnectionConfig;

pub const TEST_URI_ENV: &str = "PLP_BOOKSTORE_TEST_URI";

/// A store on a fresh, uniquely named collection in `plp_bookstore_test`.
pub fn live_store(test: &str) -> Option<Bookstore> {
    let Ok(uri) = std::env::var(TEST_URI_ENV) else {
        eprintln!("skipping {test}: {TEST_URI_ENV} not set");
        return None;
    };
    let collection = format!("books_{test}_{}", uuid::Uuid::new_v4().simple());
    Some(Bookstore::new(ConnectionConfig {
        uri,
        database: "plp_bookstore_test".into(),
        collection,
    }))
}

pub async fn seeded(test: &str, books: &[Book]) -> Option<Bookstore> {
    let store = live_store(test)?;
    let n = store.insert_books(books).await.expect("seed");
    assert_eq!(n, books.len());
    Some(store)
}

pub async fn cleanup(store: &Bookstore) {
    store.drop_collection().await.expect("drop test collection");
}

pub fn book(title: &str, author: &str, genre: &str, year: i32, price: f64, in_stock: bool) -> Book {
    Book::new(title, author, genre, year, price, in_stock)
}

/// Twenty-three books across three genres with distinct titles.
pub fn shelf() -> Vec<Book> {
    let genres = ["Fiction", "Fantasy", "Mystery"];
    (0..23)
        .map(|i| {
            let year = 1950 + i * 3;
            book(
                &format!("Title {i:02}"),
                &format!("Author {}", i % 4),
                genres[(i % 3) as usize],
                year,
                5.0 + f64::from(i),
                i % 2 == 0,
            )
        })
        .collect()
}
