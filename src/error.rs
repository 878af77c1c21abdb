use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to read {collection} from record source: {source}")]
    RecordSource {
        collection: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("slot store error on {slot}: {source}")]
    SlotStore {
        slot: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to encode slot {slot}: {source}")]
    SlotEncoding {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("refresh scheduler has shut down")]
    SchedulerClosed,
}

pub type DashboardResult<T> = Result<T, DashboardError>;
