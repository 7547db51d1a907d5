//! 데이터 수집 모듈.

pub mod history;
pub mod persist;
pub mod scheduler;
pub mod snapshot;

pub use history::{summarize_history, SymbolHistory};
pub use persist::{Reference, StorageManager};
pub use scheduler::{CadenceScheduler, CycleOutcome};
pub use snapshot::{Snapshot, SnapshotFetcher};
