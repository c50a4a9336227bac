mod common;

use common::{book, cleanup, seeded};

#[tokio::test]
async fn average_price_per_genre_in_genre_order() {
    let books = vec![
        book("a", "X", "Mystery", 2001, 10.0, true),
        book("b", "X", "Mystery", 2002, 20.0, true),
        book("c", "Y", "Fantasy", 1999, 7.0, false),
    ];
    let Some(store) = seeded("avg_genre", &books).await else { return };

    let stats = store.avg_price_by_genre().await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].genre.as_deref(), Some("Fantasy"));
    assert_eq!(stats[0].count, 1);
    assert_eq!(stats[0].avg_price, Some(7.0));
    assert_eq!(stats[1].genre.as_deref(), Some("Mystery"));
    assert_eq!(stats[1].count, 2);
    assert!((stats[1].avg_price.unwrap() - 15.0).abs() < 1e-9);
    cleanup(&store).await;
}

#[tokio::test]
async fn top_author_and_decades() {
    let books = vec![
        book("a", "Le Guin", "SciFi", 1987, 5.0, true),
        book("b", "Le Guin", "SciFi", 1990, 6.0, true),
        book("c", "Banks", "SciFi", 1989, 7.0, true),
    ];
    let Some(store) = seeded("top_decade", &books).await else { return };

    let top = store.author_with_most_books().await.unwrap().unwrap();
    assert_eq!((top.author.as_deref(), top.count), (Some("Le Guin"), 2));

    let decades = store.group_by_decade().await.unwrap();
    let pairs: Vec<_> = decades.iter().map(|d| (d.decade, d.count)).collect();
    assert_eq!(pairs, [(Some(1980), 2), (Some(1990), 1)]);
    cleanup(&store).await;
}

#[tokio::test]
async fn empty_collection_aggregates_to_nothing() {
    let Some(store) = common::live_store("empty_aggs") else { return };
    assert!(store.avg_price_by_genre().await.unwrap().is_empty());
    assert!(store.author_with_most_books().await.unwrap().is_none());
    assert!(store.group_by_decade().await.unwrap().is_empty());
}
