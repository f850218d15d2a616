use crate::domain::UserId;

/// Single-operator gate. Every inbound event passes through `permits` before
/// any other processing; everyone except the configured submitter is ignored.
#[derive(Clone, Copy, Debug)]
pub struct SubmitterGuard {
    submitter: UserId,
}

impl SubmitterGuard {
    pub fn new(submitter: UserId) -> Self {
        Self { submitter }
    }

    /// Events without a sender (channel posts, anonymous admins) are rejected.
    pub fn permits(&self, sender: Option<UserId>) -> bool {
        sender == Some(self.submitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_configured_submitter_passes() {
        let guard = SubmitterGuard::new(UserId(42));
        assert!(guard.permits(Some(UserId(42))));
        assert!(!guard.permits(Some(UserId(43))));
        assert!(!guard.permits(None));
    }
}
