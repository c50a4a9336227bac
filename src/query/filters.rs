//! Filter and update documents sent by the façade.

use bson::{Document, doc};

#[must_use]
pub fn by_genre(genre: &str) -> Document {
    doc! { "genre": genre }
}

#[must_use]
pub fn by_author(author: &str) -> Document {
    doc! { "author": author }
}

#[must_use]
pub fn by_title(title: &str) -> Document {
    doc! { "title": title }
}

#[must_use]
pub fn published_after(year: i32) -> Document {
    doc! { "published_year": { "$gt": year } }
}

#[must_use]
pub fn in_stock_after(year: i32) -> Document {
    doc! { "in_stock": true, "published_year": { "$gt": year } }
}

#[must_use]
pub fn set_price(price: f64) -> Document {
    doc! { "$set": { "price": price } }
}
