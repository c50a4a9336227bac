use plp_bookstore::book::Book;
use plp_bookstore::query::{
    Order, SortSpec, compare_docs, decade_of, filters, is_sorted_by, matches_filter, skip_for_page,
};
use proptest::prelude::*;

fn arb_book() -> impl Strategy<Value = Book> {
    (
        "[A-Z][a-z]{0,8}",
        prop::sample::select(vec!["Fiction", "Fantasy", "Mystery"]),
        1800i32..2030,
        0u32..5000,
        any::<bool>(),
    )
        .prop_map(|(title, genre, year, cents, stock)| {
            Book::new(&title, "Someone", genre, year, f64::from(cents) / 100.0, stock)
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_page_offsets_tile(page in 1u64..10_000, per_page in 1u64..1_000) {
        let skip = skip_for_page(page, per_page).unwrap();
        let next = skip_for_page(page + 1, per_page).unwrap();
        prop_assert_eq!(next - skip, per_page);
        prop_assert_eq!(skip % per_page, 0);
    }

    #[test]
    fn prop_decade_floors(year in -5000i32..5000) {
        let d = decade_of(year);
        prop_assert_eq!(d % 10, 0);
        prop_assert!(d <= year && year - d < 10);
        prop_assert_eq!(f64::from(d), (f64::from(year) / 10.0).floor() * 10.0);
    }

    #[test]
    fn prop_filter_documents_agree_with_fields(book in arb_book(), year in 1800i32..2030) {
        let doc = bson::to_document(&book).unwrap();
        prop_assert_eq!(
            matches_filter(&doc, &filters::published_after(year)),
            book.published_year > year
        );
        prop_assert_eq!(
            matches_filter(&doc, &filters::in_stock_after(year)),
            book.in_stock && book.published_year > year
        );
        prop_assert!(matches_filter(&doc, &filters::by_genre(&book.genre)));
        prop_assert!(matches_filter(&doc, &filters::by_title(&book.title)));
    }

    #[test]
    fn prop_sorting_by_compare_docs_is_sorted(books in prop::collection::vec(arb_book(), 0..40)) {
        let spec = SortSpec::new("price", Order::Desc);
        let mut docs: Vec<_> = books.iter().map(|b| bson::to_document(b).unwrap()).collect();
        docs.sort_by(|a, b| compare_docs(a, b, &spec));
        prop_assert!(is_sorted_by(&docs, &spec));
        let prices_descending = docs.windows(2).all(|w| {
            w[0].get_f64("price").unwrap() >= w[1].get_f64("price").unwrap()
        });
        prop_assert!(prices_descending);
    }
}
