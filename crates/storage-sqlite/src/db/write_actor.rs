use super::{DbPool, UnitOfWork};
use crate::errors::StorageError;
use dompet_core::errors::{DatabaseError, Result};
use log::debug;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

// A job runs inside one immediate transaction on the writer's connection.
// Its return value is type-erased so one channel can carry every job.
type Job<T> = Box<dyn FnOnce(&mut UnitOfWork<'_>) -> Result<T> + Send + 'static>;
type ErasedResult = Result<Box<dyn Any + Send + 'static>>;

const QUEUE_CAPACITY: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Box<dyn Any + Send + 'static>>, oneshot::Sender<ErasedResult>)>,
}

impl WriteHandle {
    /// Runs `job` as one unit of work. The transaction commits when the job
    /// returns `Ok` and rolls back when it returns `Err`.
    ///
    /// A stopped actor or a dropped reply is reported as `TransactionFailed`.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |uow: &mut UnitOfWork<'_>| {
                    job(uow).map(|v| Box::new(v) as Box<dyn Any + Send>)
                }),
                ret_tx,
            ))
            .await
            .map_err(|_| {
                DatabaseError::TransactionFailed("the writer has stopped".to_string())
            })?;

        let boxed = ret_rx.await.map_err(|_| {
            DatabaseError::TransactionFailed(
                "the writer dropped the job without replying".to_string(),
            )
        })??;

        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            DatabaseError::Internal("writer returned an unexpected result type".to_string())
                .into()
        })
    }
}

/// Spawns the single writer. It owns one pooled connection for its lifetime
/// and runs jobs one at a time, so writes never interleave.
///
/// The connection is taken before the task starts; failing to get one fails
/// here instead of inside the task.
pub fn spawn_writer(pool: DbPool) -> Result<WriteHandle> {
    let mut conn = pool.get().map_err(StorageError::from)?;
    let (tx, mut rx) = mpsc::channel::<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<ErasedResult>,
    )>(QUEUE_CAPACITY);

    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let result: ErasedResult = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    let mut uow = UnitOfWork::new(c);
                    job(&mut uow).map_err(StorageError::from)
                })
                .map_err(|e: StorageError| e.into());

            // The caller may have gone away; the transaction outcome stands.
            let _ = reply_tx.send(result);
        }
        debug!("Writer stopped: every handle was dropped");
    });

    Ok(WriteHandle { tx })
}
