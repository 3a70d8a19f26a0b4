//! Bulk operation core
//!
//! - [`action`] - the lifecycle actions an operator can run
//! - [`result`] - per-item [`OperationResult`]
//! - [`invoker`] - runs one action on one resource and normalizes the outcome
//! - [`dispatcher`] - fans an action out over a selection
//! - [`progress`] - begin/complete reporting seam

pub mod action;
pub mod dispatcher;
pub mod invoker;
pub mod progress;
pub mod result;

pub use action::ResourceAction;
pub use dispatcher::{BatchOutcome, BatchReport, BulkDispatcher, ExitPolicy, DEFAULT_CONCURRENCY};
pub use invoker::{ActionExecutor, ActionInvoker};
pub use progress::{BatchItem, NoProgress, ProgressEvent, ProgressSink};
pub use result::{FailureKind, OperationResult};
