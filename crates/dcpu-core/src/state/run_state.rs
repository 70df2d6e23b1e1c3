use crate::fault::DecodeError;

/// Lifecycle of an [`crate::ExecutionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// No execution thread is running.
    #[default]
    Stopped,
    /// The execution thread is retiring instructions.
    Running,
    /// The execution thread halted on an undecodable instruction.
    Faulted(DecodeError),
}

impl RunState {
    /// Returns the decode fault that halted execution, if any.
    #[must_use]
    pub const fn fault(self) -> Option<DecodeError> {
        match self {
            Self::Faulted(cause) => Some(cause),
            Self::Stopped | Self::Running => None,
        }
    }

    /// Returns `true` only while the execution thread is live.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
