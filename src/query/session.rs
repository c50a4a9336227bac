use crate::config::ConnectionConfig;
use crate::errors::DbError;
use bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use std::future::Future;

async fn connect(cfg: &ConnectionConfig) -> Result<Client, DbError> {
    let client = Client::with_uri_str(&cfg.uri)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;
    // The driver connects lazily; ping so that an unreachable server fails here.
    if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
        client.shutdown().await;
        return Err(DbError::Connection(e.to_string()));
    }
    log::debug!("connected to {}", cfg.namespace());
    Ok(client)
}

/// Open a client, hand the configured database to `op`, then shut the client down
/// whether `op` succeeded or not.
///
/// # Errors
/// Returns `DbError::Connection` if the server cannot be reached, otherwise whatever `op` returns.
pub async fn with_database<T, F, Fut>(cfg: &ConnectionConfig, op: F) -> Result<T, DbError>
where
    F: FnOnce(Database) -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let client = connect(cfg).await?;
    let result = op(client.database(&cfg.database)).await;
    client.shutdown().await;
    log::debug!("closed connection to {} (ok={})", cfg.namespace(), result.is_ok());
    result
}

/// [`with_database`] narrowed to the configured collection.
///
/// # Errors
/// See [`with_database`].
pub async fn with_collection<T, F, Fut>(cfg: &ConnectionConfig, op: F) -> Result<T, DbError>
where
    F: FnOnce(Collection<Document>) -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let name = cfg.collection.clone();
    with_database(cfg, move |db| op(db.collection::<Document>(&name))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_uri_is_a_connection_error_and_op_never_runs() {
        let cfg = ConnectionConfig { uri: "not-a-uri".into(), ..ConnectionConfig::default() };
        let mut ran = false;
        let r: Result<(), DbError> = with_collection(&cfg, |_coll| {
            ran = true;
            async { Ok(()) }
        })
        .await;
        assert!(matches!(r, Err(DbError::Connection(_))));
        assert!(!ran);
    }
}
