//! Per-client handshake state.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::MCP_VERSION;

/// Handshake state of one logical client.
///
/// `initialized` starts `false` and is set once by the `initialized`
/// notification; nothing clears it.
#[derive(Debug)]
pub struct SessionState {
    initialized: AtomicBool,
    protocol_version: &'static str,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            protocol_version: MCP_VERSION,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Mark the handshake complete. Returns `true` on the first transition.
    pub fn mark_initialized(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }

    pub fn protocol_version(&self) -> &str {
        self.protocol_version
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uninitialized() {
        let state = SessionState::new();
        assert!(!state.is_initialized());
        assert_eq!(state.protocol_version(), "2025-03-26");
    }

    #[test]
    fn test_mark_initialized_once() {
        let state = SessionState::new();
        assert!(state.mark_initialized());
        assert!(!state.mark_initialized());
        assert!(state.is_initialized());
    }
}
