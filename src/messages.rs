//! Message types sent from background tasks to the editing thread
//!
//! Loads run on the tokio runtime; their results come back as messages
//! and are applied by `HighlightEngine::process_async_messages`.

use crate::resources::LoadReport;

/// Resource loading messages
#[derive(Debug, Clone)]
pub enum ResourceMsg {
    /// A load batch finished (fully or partially)
    BatchLoaded {
        /// Token the batch was issued with
        token: u64,
        /// Document version current when the batch was issued
        issued_for: u64,
        report: LoadReport,
    },
}

/// Top-level message type
#[derive(Debug, Clone)]
pub enum Msg {
    Resource(ResourceMsg),
}

impl Msg {
    pub fn batch_loaded(token: u64, issued_for: u64, report: LoadReport) -> Self {
        Msg::Resource(ResourceMsg::BatchLoaded {
            token,
            issued_for,
            report,
        })
    }
}
