use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Last-known health of a remote processor, overwritten wholesale on every
/// probe. A missing entry always reads as [`ProcessorHealth::UNHEALTHY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorHealth {
    pub failing: bool,
    pub min_response_time: u64,
}

impl ProcessorHealth {
    pub const UNHEALTHY: ProcessorHealth = ProcessorHealth {
        failing: true,
        min_response_time: 0,
    };

    /// Connect/read timeout for an outbound call to this processor.
    /// `min_response_time` of zero means the value is unknown, so the
    /// configured default applies.
    pub fn call_timeout(&self, default_timeout: Duration) -> Duration {
        if self.min_response_time == 0 {
            default_timeout
        } else {
            Duration::from_millis(self.min_response_time)
        }
    }
}
