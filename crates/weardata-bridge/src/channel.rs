//! Result channels: how outcomes travel back to the command's caller.

use std::sync::Arc;

use tokio::sync::mpsc;
use weardata_core::StructuredValue;

/// Outcome class of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// One delivery to a result channel.
///
/// `keep_callback` marks a non-terminal delivery: the channel stays open for
/// more results. Listener deliveries set it; command completions don't.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResult {
    pub status: Status,
    pub message: Option<StructuredValue>,
    pub keep_callback: bool,
}

impl PluginResult {
    /// Success with no value.
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
            keep_callback: false,
        }
    }

    /// Success carrying a value.
    pub fn ok_with(value: StructuredValue) -> Self {
        Self {
            status: Status::Ok,
            message: Some(value),
            keep_callback: false,
        }
    }

    /// Failure with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(StructuredValue::String(message.into())),
            keep_callback: false,
        }
    }

    pub fn keep_callback(mut self, keep: bool) -> Self {
        self.keep_callback = keep;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// The error message, for error results.
    pub fn error_message(&self) -> Option<&str> {
        match (self.status, &self.message) {
            (Status::Error, Some(StructuredValue::String(s))) => Some(s),
            _ => None,
        }
    }
}

/// Callback handle supplied with each command.
///
/// Implemented by the host's plugin layer. A delivery to a channel whose
/// owner is gone is the host's concern; implementations should drop it.
pub trait ResultChannel: Send + Sync {
    fn deliver(&self, result: PluginResult);
}

/// Shared handle to a result channel.
pub type Channel = Arc<dyn ResultChannel>;

impl ResultChannel for mpsc::UnboundedSender<PluginResult> {
    fn deliver(&self, result: PluginResult) {
        if self.send(result).is_err() {
            tracing::debug!("result channel receiver dropped");
        }
    }
}
