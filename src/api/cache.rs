use std::future::Future;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    errors::{ClientError, Result},
    types::{Epoch, Fork, Genesis},
};

/// Connection-scoped chain constants. Each value is fetched at most once successfully; failed
/// fetches leave the slot empty so the next caller retries.
#[derive(Debug, Default)]
pub struct ChainConstants {
    genesis: OnceCell<Genesis>,
    slots_per_epoch: OnceCell<u64>,
    far_future_epoch: OnceCell<Epoch>,
    fork_schedule: OnceCell<Vec<Fork>>,
}

impl ChainConstants {
    pub async fn genesis<F, Fut>(&self, fetch: F) -> Result<Genesis>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Genesis>>,
    {
        self.genesis.get_or_try_init(fetch).await.copied()
    }

    pub async fn slots_per_epoch<F, Fut>(&self, fetch: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        self.slots_per_epoch.get_or_try_init(fetch).await.copied()
    }

    pub async fn far_future_epoch<F, Fut>(&self, fetch: F) -> Result<Epoch>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Epoch>>,
    {
        self.far_future_epoch.get_or_try_init(fetch).await.copied()
    }

    /// The schedule is stored sorted ascending by epoch.
    pub async fn fork_schedule<F, Fut>(&self, fetch: F) -> Result<Vec<Fork>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Fork>>>,
    {
        self.fork_schedule
            .get_or_try_init(|| async move {
                let mut schedule = fetch().await?;
                schedule.sort_by_key(|fork| fork.epoch);
                debug!(forks = schedule.len(), "cached fork schedule");
                Ok::<_, ClientError>(schedule)
            })
            .await
            .cloned()
    }
}
