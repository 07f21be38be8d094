use super::{get_connection, DbPool};
use crate::errors::StorageError;
use diesel::SqliteConnection;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};
use quotecache_core::errors::{DatabaseError, Error, Result};

// A write job runs against the actor's connection inside an immediate transaction.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type Erased = Box<dyn Any + Send + 'static>;

/// Handle for sending jobs to the writer actor.
///
/// All cache writes go through one connection so SQLite never sees two
/// writers racing for the lock.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Erased>, oneshot::Sender<Result<Erased>>)>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// Fails with `DatabaseError::Internal` when the actor has stopped.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Erased)),
                ret_tx,
            ))
            .await
            .map_err(|_| actor_stopped("writer actor is not running"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| actor_stopped("writer actor dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| actor_stopped("writer actor returned an unexpected type"))
    }
}

fn actor_stopped(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor takes one connection from the pool up front and holds it for its
/// lifetime; it stops when every `WriteHandle` has been dropped.
pub fn spawn_writer(pool: &DbPool) -> Result<WriteHandle> {
    let mut conn = get_connection(pool)?;
    let (tx, mut rx) = mpsc::channel::<(Job<Erased>, oneshot::Sender<Result<Erased>>)>(1024);

    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Erased> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // The requester may have given up waiting.
            let _ = reply_tx.send(result);
        }
    });

    Ok(WriteHandle { tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::analysis_cache;
    use crate::utils::test_db;
    use diesel::prelude::*;

    fn insert_row(conn: &mut SqliteConnection, key: &str) -> Result<usize> {
        diesel::insert_into(analysis_cache::table)
            .values((
                analysis_cache::symbol.eq(key),
                analysis_cache::result_json.eq("{}"),
                analysis_cache::cached_at.eq(0_i64),
                analysis_cache::expires_at.eq(1_i64),
            ))
            .execute(conn)
            .map_err(|e| StorageError::from(e).into())
    }

    fn count_rows(pool: &DbPool) -> i64 {
        let mut conn = get_connection(pool).unwrap();
        analysis_cache::table.count().get_result(&mut conn).unwrap()
    }

    #[tokio::test]
    async fn test_exec_returns_job_value() {
        let db = test_db::setup();
        let inserted = db.writer.exec(|c| insert_row(c, "AAPL")).await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(count_rows(&db.pool), 1);
    }

    #[tokio::test]
    async fn test_failed_job_rolls_back() {
        let db = test_db::setup();
        let result: Result<()> = db
            .writer
            .exec(|c| {
                insert_row(c, "AAPL")?;
                Err(Error::Unexpected("abort".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Database(DatabaseError::Internal(_)))));
        assert_eq!(count_rows(&db.pool), 0);
    }
}
