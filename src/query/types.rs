use crate::errors::DbError;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// Sort direction as the server expects it: 1 or -1.
    #[must_use]
    pub fn direction(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

impl FromStr for Order {
    type Err = DbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Asc),
            "desc" | "descending" | "-1" => Ok(Self::Desc),
            other => Err(DbError::InvalidArgument(format!("unknown sort order: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    #[must_use]
    pub fn new(field: &str, order: Order) -> Self {
        Self { field: field.to_string(), order }
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        d.insert(self.field.clone(), self.order.direction());
        d
    }
}

/// Fields kept by a projected read. `_id` is always excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub fields: Vec<String>,
}

impl Projection {
    #[must_use]
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self { fields: fields.iter().map(|f| f.as_ref().to_string()).collect() }
    }

    #[must_use]
    pub fn title_author_price() -> Self {
        Self::new(&["title", "author", "price"])
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        for f in self.fields.iter().filter(|f| f.as_str() != "_id") {
            d.insert(f.clone(), 1);
        }
        d.insert("_id", 0);
        d
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

impl From<mongodb::results::UpdateResult> for UpdateReport {
    fn from(r: mongodb::results::UpdateResult) -> Self {
        Self { matched: r.matched_count, modified: r.modified_count }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted: u64,
}

impl From<mongodb::results::DeleteResult> for DeleteReport {
    fn from(r: mongodb::results::DeleteResult) -> Self {
        Self { deleted: r.deleted_count }
    }
}

/// One `$group` row of the average-price-by-genre pipeline.
///
/// Group keys are `None` for the bucket of records missing the grouped field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePriceStats {
    pub genre: Option<String>,
    /// `None` when no record in the group has a numeric price.
    pub avg_price: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    pub decade: Option<i32>,
    pub count: u64,
}

fn number(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Int32(i) => Some(f64::from(*i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}

fn required_number(doc: &Document, key: &str) -> Result<f64, DbError> {
    number(doc, key)
        .ok_or_else(|| DbError::Query(format!("aggregate row has no numeric `{key}`: {doc}")))
}

/// A `$group` key: null or missing is `None`, anything else must be a string.
fn group_str(doc: &Document) -> Result<Option<String>, DbError> {
    match doc.get("_id") {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DbError::Query(format!("aggregate row has a non-string `_id`: {doc}"))),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_of(doc: &Document) -> Result<u64, DbError> {
    let n = required_number(doc, "count")?;
    Ok(if n <= 0.0 { 0 } else { n as u64 })
}

impl TryFrom<&Document> for GenrePriceStats {
    type Error = DbError;
    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Ok(Self {
            genre: group_str(doc)?,
            avg_price: number(doc, "avgPrice"),
            count: count_of(doc)?,
        })
    }
}

impl TryFrom<&Document> for AuthorCount {
    type Error = DbError;
    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Ok(Self { author: group_str(doc)?, count: count_of(doc)? })
    }
}

impl TryFrom<&Document> for DecadeCount {
    type Error = DbError;
    // `$floor` over `$divide` yields a double on the server.
    #[allow(clippy::cast_possible_truncation)]
    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let decade = match doc.get("_id") {
            None | Some(Bson::Null) => None,
            Some(_) => Some(required_number(doc, "_id")? as i32),
        };
        Ok(Self { decade, count: count_of(doc)? })
    }
}

/// The interesting parts of an `executionStats` explain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainSummary {
    pub winning_stage: Option<String>,
    pub index_name: Option<String>,
    pub returned: Option<i64>,
    pub docs_examined: Option<i64>,
    pub keys_examined: Option<i64>,
    pub execution_time_ms: Option<i64>,
}

#[allow(clippy::cast_possible_truncation)]
fn int(doc: &Document, key: &str) -> Option<i64> {
    number(doc, key).map(|f| f as i64)
}

/// Depth-first search for the first plan stage carrying an `indexName`.
fn find_index_name(stage: &Document) -> Option<String> {
    if let Ok(name) = stage.get_str("indexName") {
        return Some(name.to_string());
    }
    if let Ok(input) = stage.get_document("inputStage") {
        return find_index_name(input);
    }
    if let Ok(inputs) = stage.get_array("inputStages") {
        return inputs.iter().filter_map(Bson::as_document).find_map(find_index_name);
    }
    None
}

impl ExplainSummary {
    #[must_use]
    pub fn from_explain(explain: &Document) -> Self {
        let mut out = Self::default();
        if let Ok(plan) = explain.get_document("queryPlanner") {
            // Newer servers wrap the plan in `queryPlan`.
            let winning = plan.get_document("winningPlan").ok().map(|w| {
                w.get_document("queryPlan").unwrap_or(w)
            });
            if let Some(w) = winning {
                out.winning_stage = w.get_str("stage").ok().map(str::to_string);
                out.index_name = find_index_name(w);
            }
        }
        if let Ok(stats) = explain.get_document("executionStats") {
            out.returned = int(stats, "nReturned");
            out.docs_examined = int(stats, "totalDocsExamined");
            out.keys_examined = int(stats, "totalKeysExamined");
            out.execution_time_ms = int(stats, "executionTimeMillis");
        }
        out
    }

    #[must_use]
    pub fn used_index(&self) -> bool {
        self.index_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn order_parsing_and_direction() {
        assert_eq!("DESC".parse::<Order>().unwrap().direction(), -1);
        assert_eq!("1".parse::<Order>().unwrap(), Order::Asc);
        assert!(matches!("sideways".parse::<Order>(), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn projection_always_excludes_id() {
        let p = Projection::new(&["title", "_id", "price"]);
        assert_eq!(p.to_document(), doc! { "title": 1, "price": 1, "_id": 0 });
    }

    #[test]
    fn aggregate_rows_decode() {
        let g = GenrePriceStats::try_from(&doc! { "_id": "Fiction", "avgPrice": 11.5, "count": 2 }).unwrap();
        assert_eq!(g.genre.as_deref(), Some("Fiction"));
        assert_eq!(g.avg_price, Some(11.5));
        assert_eq!(g.count, 2);

        let g = GenrePriceStats::try_from(&doc! { "_id": "Poetry", "avgPrice": null, "count": 1 }).unwrap();
        assert_eq!(g.avg_price, None);

        let d = DecadeCount::try_from(&doc! { "_id": 1980.0, "count": 3_i64 }).unwrap();
        assert_eq!(d, DecadeCount { decade: Some(1980), count: 3 });

        assert!(AuthorCount::try_from(&doc! { "_id": 7, "count": 1 }).is_err());
    }

    #[test]
    fn decimal_averages_are_numbers() {
        let avg: bson::Decimal128 = "12.50".parse().unwrap();
        let row = doc! { "_id": "Fiction", "avgPrice": Bson::Decimal128(avg), "count": 2 };
        let g = GenrePriceStats::try_from(&row).unwrap();
        assert_eq!(g.avg_price, Some(12.5));
        assert_eq!(g.count, 2);
    }

    #[test]
    fn missing_group_keys_form_their_own_bucket() {
        let g = GenrePriceStats::try_from(&doc! { "_id": null, "avgPrice": 3.0, "count": 1 }).unwrap();
        assert_eq!(g, GenrePriceStats { genre: None, avg_price: Some(3.0), count: 1 });

        let a = AuthorCount::try_from(&doc! { "_id": null, "count": 4 }).unwrap();
        assert_eq!(a, AuthorCount { author: None, count: 4 });

        let d = DecadeCount::try_from(&doc! { "_id": null, "count": 1 }).unwrap();
        assert_eq!(d, DecadeCount { decade: None, count: 1 });
    }

    #[test]
    fn explain_summary_reads_index_scan() {
        let explain = doc! {
            "queryPlanner": {
                "winningPlan": {
                    "stage": "FETCH",
                    "inputStage": { "stage": "IXSCAN", "indexName": "title_1" }
                }
            },
            "executionStats": {
                "nReturned": 1,
                "executionTimeMillis": 0,
                "totalKeysExamined": 1,
                "totalDocsExamined": 1
            }
        };
        let s = ExplainSummary::from_explain(&explain);
        assert_eq!(s.winning_stage.as_deref(), Some("FETCH"));
        assert_eq!(s.index_name.as_deref(), Some("title_1"));
        assert_eq!(s.returned, Some(1));
        assert!(s.used_index());
    }

    #[test]
    fn explain_summary_collection_scan() {
        let explain = doc! {
            "queryPlanner": { "winningPlan": { "queryPlan": { "stage": "COLLSCAN" } } },
            "executionStats": { "nReturned": 0, "totalDocsExamined": 12_i64 }
        };
        let s = ExplainSummary::from_explain(&explain);
        assert_eq!(s.winning_stage.as_deref(), Some("COLLSCAN"));
        assert!(!s.used_index());
        assert_eq!(s.docs_examined, Some(12));
    }
}
