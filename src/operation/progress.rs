//! Progress reporting seam for the bulk dispatcher.
//!
//! The dispatcher only knows [`ProgressSink`]; console rendering lives in
//! `ui::progress`, and [`ProgressEvent`] over an `mpsc` channel lets any other
//! consumer follow a batch.

use super::result::OperationResult;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One item of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub id: Uuid,
    /// Position in the selection
    pub index: usize,
    /// Text shown to the operator
    pub label: String,
}

impl BatchItem {
    pub fn new(index: usize, label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            label,
        }
    }
}

/// Events emitted during a batch
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Item registered, its action is about to start
    Begin { item: BatchItem },
    /// Item resolved; emitted exactly once per item
    Complete {
        item: BatchItem,
        result: OperationResult,
    },
}

/// Receives per-item progress.
///
/// `begin` is called before an item's action starts and `complete` exactly
/// once when it resolves. Completions arrive in any order.
pub trait ProgressSink {
    fn begin(&self, item: &BatchItem);
    fn complete(&self, item: &BatchItem, result: &OperationResult);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&self, _item: &BatchItem) {}
    fn complete(&self, _item: &BatchItem, _result: &OperationResult) {}
}

/// Forwards events to a channel; a dropped receiver is ignored
impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn begin(&self, item: &BatchItem) {
        let _ = self.send(ProgressEvent::Begin { item: item.clone() });
    }

    fn complete(&self, item: &BatchItem, result: &OperationResult) {
        let _ = self.send(ProgressEvent::Complete {
            item: item.clone(),
            result: result.clone(),
        });
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn begin(&self, item: &BatchItem) {
        (**self).begin(item)
    }

    fn complete(&self, item: &BatchItem, result: &OperationResult) {
        (**self).complete(item, result)
    }
}
