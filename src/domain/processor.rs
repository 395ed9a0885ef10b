use serde::{Deserialize, Serialize};

/// The two interchangeable remote payment processors. `Default` is always
/// preferred; `Fallback` is the sole escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorName {
    Default,
    Fallback,
}

impl ProcessorName {
    pub fn value(&self) -> &'static str {
        match self {
            ProcessorName::Default => "default",
            ProcessorName::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProcessorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}
