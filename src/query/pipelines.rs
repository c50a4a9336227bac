//! Aggregation pipelines and index specifications.

use bson::{Document, doc};

#[must_use]
pub fn avg_price_by_genre() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$genre", "avgPrice": { "$avg": "$price" }, "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

#[must_use]
pub fn author_with_most_books() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": 1 },
    ]
}

#[must_use]
pub fn group_by_decade() -> Vec<Document> {
    vec![
        doc! { "$project": {
            "decade": { "$multiply": [ { "$floor": { "$divide": ["$published_year", 10] } }, 10 ] }
        } },
        doc! { "$group": { "_id": "$decade", "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// Bucket a year the way `group_by_decade` does on the server: floor(year / 10) * 10.
#[must_use]
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Keys of the indexes ensured by `create_indexes`.
#[must_use]
pub fn book_index_keys() -> Vec<Document> {
    vec![doc! { "title": 1 }, doc! { "author": 1, "published_year": 1 }]
}

/// Server-generated names for `book_index_keys`, in the same order.
#[must_use]
pub fn book_index_names() -> Vec<String> {
    book_index_keys().iter().map(index_name).collect()
}

/// `{a: 1, b: -1}` -> `a_1_b_-1`, matching the server's default naming.
#[must_use]
pub fn index_name(keys: &Document) -> String {
    keys.iter().map(|(k, v)| format!("{k}_{v}")).collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_examples() {
        assert_eq!(decade_of(1987), 1980);
        assert_eq!(decade_of(1990), 1990);
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(-5), -10);
    }

    #[test]
    fn index_names_follow_server_convention() {
        assert_eq!(book_index_names(), vec!["title_1", "author_1_published_year_1"]);
    }

    #[test]
    fn top_author_limits_to_one() {
        let p = author_with_most_books();
        assert_eq!(p.last().unwrap().get_i32("$limit").unwrap(), 1);
        assert_eq!(p[1].get_document("$sort").unwrap().get_i32("count").unwrap(), -1);
    }

    #[test]
    fn genre_groups_sorted_ascending() {
        let p = avg_price_by_genre();
        assert_eq!(p[1], doc! { "$sort": { "_id": 1 } });
    }
}
