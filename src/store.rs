use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Candidate, Interview, Mentor};

pub const SNAPSHOT_SLOT: &str = "dashboard.snapshot";
pub const AGGREGATION_SLOT: &str = "dashboard.aggregation";
pub const PERFORMANCE_SLOT: &str = "dashboard.performance";

/// Read-only access to the three collections the dashboard summarises.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn candidates(&self) -> DashboardResult<Vec<Candidate>>;
    async fn interviews(&self) -> DashboardResult<Vec<Interview>>;
    async fn mentors(&self) -> DashboardResult<Vec<Mentor>>;
}

/// Named single-record slots. `set` replaces the whole payload.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn get(&self, name: &str) -> DashboardResult<Option<String>>;
    async fn set(&self, name: &str, payload: String) -> DashboardResult<()>;
}

/// Loads a slot, treating read failures and undecodable payloads as an empty slot.
pub async fn read_slot<T, S>(store: &S, name: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: SlotStore + ?Sized,
{
    let payload = match store.get(name).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!(slot = name, "slot is empty");
            return None;
        }
        Err(err) => {
            warn!(slot = name, error = %err, "failed to read slot, treating as empty");
            return None;
        }
    };

    match serde_json::from_str(&payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(slot = name, error = %err, "discarding corrupt slot payload");
            None
        }
    }
}

pub async fn write_slot<T, S>(store: &S, name: &str, value: &T) -> DashboardResult<()>
where
    T: Serialize,
    S: SlotStore + ?Sized,
{
    let payload = serde_json::to_string(value).map_err(|source| DashboardError::SlotEncoding {
        slot: name.to_string(),
        source,
    })?;
    store.set(name, payload).await?;
    debug!(slot = name, "slot written");
    Ok(())
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    pub struct MemoryRecordSource {
        pub candidates: Mutex<Vec<Candidate>>,
        pub interviews: Mutex<Vec<Interview>>,
        pub mentors: Mutex<Vec<Mentor>>,
        pub fail_reads: AtomicBool,
        pub reads: AtomicUsize,
        /// Per-read latency in milliseconds; zero answers immediately.
        pub read_delay_ms: AtomicU64,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl MemoryRecordSource {
        pub fn new(candidates: Vec<Candidate>, interviews: Vec<Interview>, mentors: Vec<Mentor>) -> Self {
            Self {
                candidates: Mutex::new(candidates),
                interviews: Mutex::new(interviews),
                mentors: Mutex::new(mentors),
                ..Default::default()
            }
        }

        async fn check(&self, collection: &'static str) -> DashboardResult<()> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let delay = self.read_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(DashboardError::RecordSource {
                    collection,
                    source: sqlx::Error::PoolClosed,
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordSource for MemoryRecordSource {
        async fn candidates(&self) -> DashboardResult<Vec<Candidate>> {
            self.check("candidates").await?;
            Ok(self.candidates.lock().unwrap().clone())
        }

        async fn interviews(&self) -> DashboardResult<Vec<Interview>> {
            self.check("interviews").await?;
            Ok(self.interviews.lock().unwrap().clone())
        }

        async fn mentors(&self) -> DashboardResult<Vec<Mentor>> {
            self.check("mentors").await?;
            Ok(self.mentors.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    pub struct MemorySlotStore {
        pub slots: Mutex<HashMap<String, String>>,
        pub fail_writes: AtomicBool,
    }

    impl MemorySlotStore {
        pub fn raw(&self, name: &str) -> Option<String> {
            self.slots.lock().unwrap().get(name).cloned()
        }

        pub fn put_raw(&self, name: &str, payload: &str) {
            self.slots
                .lock()
                .unwrap()
                .insert(name.to_string(), payload.to_string());
        }
    }

    #[async_trait]
    impl SlotStore for MemorySlotStore {
        async fn get(&self, name: &str) -> DashboardResult<Option<String>> {
            Ok(self.raw(name))
        }

        async fn set(&self, name: &str, payload: String) -> DashboardResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DashboardError::SlotStore {
                    slot: name.to_string(),
                    source: sqlx::Error::PoolClosed,
                });
            }
            self.slots.lock().unwrap().insert(name.to_string(), payload);
            Ok(())
        }
    }
}
