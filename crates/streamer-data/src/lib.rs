//! 시세 저장소.
//!
//! - `QuoteStore` - 저장소 인터페이스 (append-only 가격, replace-latest 참조 테이블)
//! - `PostgresStore` - PostgreSQL 구현
//! - `MemoryStore` - 프로세스 내 구현 (dry-run, 테스트)

pub mod error;
pub mod storage;

pub use error::{DataError, Result};
pub use storage::memory::{MemoryStore, WriteEvent};
pub use storage::postgres::{DatabaseConfig, PostgresStore};
pub use storage::{QuoteStore, TableKind, TableNames};
