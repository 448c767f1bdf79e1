//! Count record store boundary and an in-memory implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use shopcount_common::{BranchId, BranchInfo, CountRecord, DateRange, Result};
use std::collections::HashMap;

/// Source of raw count records and branch metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountRecordStore: Send + Sync {
    /// Records of `branch_id` with `range.start <= timestamp < range.end`,
    /// in no particular order.
    async fn fetch_records(&self, branch_id: &BranchId, range: &DateRange)
        -> Result<Vec<CountRecord>>;

    /// Branch metadata, or `None` for an unknown branch.
    async fn find_branch(&self, branch_id: &BranchId) -> Result<Option<BranchInfo>>;

    /// The most recent record of every camera of `branch_id`.
    async fn latest_per_camera(&self, branch_id: &BranchId) -> Result<Vec<CountRecord>>;
}

/// Process-local store backed by vectors behind read-write locks.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    branches: RwLock<HashMap<BranchId, BranchInfo>>,
    records: RwLock<Vec<CountRecord>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or renames a branch.
    pub fn upsert_branch(&self, branch: BranchInfo) {
        self.branches.write().insert(branch.branch_id.clone(), branch);
    }

    /// Appends records.
    pub fn insert_records(&self, records: impl IntoIterator<Item = CountRecord>) {
        self.records.write().extend(records);
    }
}

#[async_trait]
impl CountRecordStore for InMemoryStore {
    async fn fetch_records(
        &self,
        branch_id: &BranchId,
        range: &DateRange,
    ) -> Result<Vec<CountRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| &r.branch_id == branch_id && range.contains(&r.timestamp))
            .cloned()
            .collect())
    }

    async fn find_branch(&self, branch_id: &BranchId) -> Result<Option<BranchInfo>> {
        Ok(self.branches.read().get(branch_id).cloned())
    }

    async fn latest_per_camera(&self, branch_id: &BranchId) -> Result<Vec<CountRecord>> {
        let records = self.records.read();
        let mut latest: HashMap<Option<&str>, &CountRecord> = HashMap::new();

        for record in records.iter().filter(|r| &r.branch_id == branch_id) {
            let camera = record.camera_id.as_deref();
            match latest.get(&camera) {
                Some(existing) if existing.timestamp > record.timestamp => {}
                _ => {
                    latest.insert(camera, record);
                }
            }
        }

        Ok(latest.into_values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopcount_common::test_utils::{mock_date, mock_timestamp, record};

    #[tokio::test]
    async fn test_fetch_is_half_open_and_branch_scoped() {
        let store = InMemoryStore::new();
        store.insert_records([
            record(mock_timestamp(2024, 1, 1, 0, 0, 0), 1, 0, 1),
            record(mock_timestamp(2024, 1, 1, 23, 59, 59), 1, 0, 1),
            record(mock_timestamp(2024, 1, 2, 0, 0, 0), 1, 0, 1),
            CountRecord::new("OTHER", mock_timestamp(2024, 1, 1, 12, 0, 0), 1, 0, 1),
        ]);

        let range = DateRange::single_day(mock_date(2024, 1, 1)).unwrap();
        let fetched = store
            .fetch_records(&BranchId::from("BKK-001"), &range)
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
    }

    #[tokio::test]
    async fn test_latest_per_camera() {
        let store = InMemoryStore::new();
        store.insert_records([
            record(mock_timestamp(2024, 1, 1, 9, 0, 0), 0, 0, 3).with_camera("cam-1"),
            record(mock_timestamp(2024, 1, 1, 10, 0, 0), 0, 0, 5).with_camera("cam-1"),
            record(mock_timestamp(2024, 1, 1, 9, 30, 0), 0, 0, 2).with_camera("cam-2"),
        ]);

        let mut latest = store
            .latest_per_camera(&BranchId::from("BKK-001"))
            .await
            .unwrap();
        latest.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].current_count, 5);
        assert_eq!(latest[1].current_count, 2);
    }

    #[tokio::test]
    async fn test_find_branch() {
        let store = InMemoryStore::new();
        store.upsert_branch(BranchInfo::new("BKK-001", "Siam"));

        let found = store.find_branch(&BranchId::from("BKK-001")).await.unwrap();
        assert_eq!(found.map(|b| b.name), Some("Siam".to_string()));
        assert!(store.find_branch(&BranchId::from("NOPE")).await.unwrap().is_none());
    }
}
