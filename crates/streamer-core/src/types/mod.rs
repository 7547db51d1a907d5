//! 도메인 타입 모듈.

pub mod quote;
pub mod symbol;

pub use quote::*;
pub use symbol::*;
