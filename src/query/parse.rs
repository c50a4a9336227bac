use crate::errors::DbError;
use bson::Document;

const MAX_FILTER_LEN: usize = 64 * 1024;

/// Parse a JSON object (as typed on the command line) into a filter document.
///
/// # Errors
/// Returns `DbError::InvalidArgument` if the input is not a JSON object, or
/// `DbError::Json` if it is not JSON at all.
pub fn parse_filter_json(json: &str) -> Result<Document, DbError> {
    if json.len() > MAX_FILTER_LEN {
        return Err(DbError::InvalidArgument(format!("filter longer than {MAX_FILTER_LEN} bytes")));
    }
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(DbError::InvalidArgument(format!("filter must be a JSON object, got: {value}")));
    }
    bson::to_document(&value).map_err(|e| DbError::InvalidArgument(e.to_string()))
}
