use std::time::Duration;

/// When an abandoned room gets wiped back to an empty lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    pub reset_after: Duration, // all players disconnected for this long
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            reset_after: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl IdlePolicy {
    pub fn new(reset_after: Duration) -> Self {
        Self { reset_after }
    }
}
