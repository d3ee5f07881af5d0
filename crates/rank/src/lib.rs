//! Ranking of name pairs.
//!
//! Provides:
//! - Bounded top-K selection over the first × last cross product
//! - A parallel scan with progress reporting and cancellation
//! - `EngineSession`, which loads a model and dataset once and serves
//!   pair queries and scans against them

pub mod config;
pub mod error;
pub mod scan;
pub mod session;
pub mod topk;

pub use config::{EngineConfig, RankConfig};
pub use error::EngineError;
pub use scan::{
    best_for_first, scan_top_k, select_top_k, CancelToken, ProgressFn, ScanControl, ScanError, ScanProgress,
};
pub use session::{EngineSession, PoolSnapshot, ScanRequest};
pub use topk::{RankedPair, TopK};
