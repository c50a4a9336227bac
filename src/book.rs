use bson::Bson;
use bson::oid::ObjectId;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A record in the `books` collection.
///
/// Fields outside this set are ignored on decode. `price` may be stored as an
/// integer, a double or a decimal; all decode into `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    #[serde(deserialize_with = "price_from_bson")]
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    #[must_use]
    pub fn new(
        title: &str,
        author: &str,
        genre: &str,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            published_year,
            price,
            in_stock,
        }
    }
}

/// Title/author/price view returned by the projected read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
    #[serde(deserialize_with = "price_from_bson")]
    pub price: f64,
}

fn price_from_bson<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Bson::deserialize(deserializer)? {
        Bson::Double(f) => Ok(f),
        Bson::Int32(i) => Ok(f64::from(i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Ok(i as f64),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("price must be numeric, got {other}"))),
    }
}

/// The catalogue loaded by `seed`.
#[must_use]
pub fn sample_books() -> Vec<Book> {
    vec![
        Book::new("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960, 12.99, true),
        Book::new("1984", "George Orwell", "Dystopian", 1949, 10.99, true),
        Book::new("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1925, 9.99, true),
        Book::new("Brave New World", "Aldous Huxley", "Dystopian", 1932, 11.50, false),
        Book::new("The Hobbit", "J.R.R. Tolkien", "Fantasy", 1937, 14.99, true),
        Book::new("The Catcher in the Rye", "J.D. Salinger", "Fiction", 1951, 8.99, true),
        Book::new("Pride and Prejudice", "Jane Austen", "Romance", 1813, 7.99, true),
        Book::new("The Lord of the Rings", "J.R.R. Tolkien", "Fantasy", 1954, 19.99, true),
        Book::new("Animal Farm", "George Orwell", "Political Satire", 1945, 8.50, false),
        Book::new("The Alchemist", "Paulo Coelho", "Fiction", 1988, 10.99, true),
        Book::new("Moby Dick", "Herman Melville", "Adventure", 1851, 12.50, false),
        Book::new("Wuthering Heights", "Emily Brontë", "Gothic Fiction", 1847, 9.99, true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn decodes_integer_price_and_ignores_extra_fields() {
        let d = doc! {
            "_id": ObjectId::new(),
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Science Fiction",
            "published_year": 1965,
            "price": 15,
            "in_stock": true,
            "pages": 412,
            "publisher": "Chilton Books",
        };
        let b: Book = bson::from_document(d).unwrap();
        assert_eq!(b.title, "Dune");
        assert!((b.price - 15.0).abs() < f64::EPSILON);
        assert!(b.id.is_some());
    }

    #[test]
    fn decodes_decimal_price() {
        let price: bson::Decimal128 = "12.99".parse().unwrap();
        let d = doc! {
            "title": "Emma",
            "author": "Jane Austen",
            "genre": "Romance",
            "published_year": 1815,
            "price": Bson::Decimal128(price),
            "in_stock": false,
        };
        let b: Book = bson::from_document(d.clone()).unwrap();
        assert!((b.price - 12.99).abs() < 1e-9);
        let s: BookSummary = bson::from_document(d).unwrap();
        assert!((s.price - 12.99).abs() < 1e-9);
    }

    #[test]
    fn non_numeric_price_is_a_decode_error() {
        let d = doc! {
            "title": "Emma",
            "author": "Jane Austen",
            "genre": "Romance",
            "published_year": 1815,
            "price": "cheap",
            "in_stock": false,
        };
        assert!(bson::from_document::<Book>(d).is_err());
    }

    #[test]
    fn new_books_serialize_without_id() {
        let b = Book::new("Dune", "Frank Herbert", "Science Fiction", 1965, 15.0, true);
        let d = bson::to_document(&b).unwrap();
        assert!(!d.contains_key("_id"));
        assert_eq!(d.get_i32("published_year").unwrap(), 1965);
    }

    #[test]
    fn sample_titles_are_unique() {
        let books = sample_books();
        let mut titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), books.len());
    }
}
