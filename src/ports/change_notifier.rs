//! ChangeNotifier port - How the write path tells viewers about mutations.
//!
//! Called exactly once per successful store mutation, after the commit.
//! Delivery is best-effort; implementations never return errors.

use async_trait::async_trait;

use crate::domain::savings::Record;

#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn announce_created(&self, record: Record);

    async fn announce_updated(&self, record: Record);

    async fn announce_deleted(&self, record: Record);

    async fn announce_cleared(&self, deleted_count: u64);
}
