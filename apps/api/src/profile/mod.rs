// Client profile engine.
// models -> metrics/jobs (pure derivations) -> versioning + storage (persistence) -> store (state machine).
// HTTP glue lives in handlers; nothing else touches the store directly.

pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod store;
pub mod versioning;
