#![forbid(unsafe_code)]

//! Store failure modes.

/// Error type for store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The store has been torn down and accepts no further registrations or actions.
    TornDown,
    /// An action was dispatched while the reducer was still processing another one.
    ReentrantDispatch,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TornDown => write!(f, "store has been torn down"),
            Self::ReentrantDispatch => {
                write!(f, "action dispatched while the reducer was running")
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(StoreError::TornDown.to_string(), "store has been torn down");
        assert!(
            StoreError::ReentrantDispatch
                .to_string()
                .contains("reducer was running")
        );
    }
}
