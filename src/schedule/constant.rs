//! A schedule with a fixed recommendation.

use super::{Action, ReseedSchedule, StickyFlag};

/// Always recommends the same action.
///
/// Used by wirings that want a never-reseed or always-reseed policy, and
/// by tests that need a predictable schedule.
#[derive(Debug)]
pub struct ConstantSchedule {
    action: Action,
    sticky: StickyFlag,
}

impl ConstantSchedule {
    /// Creates a schedule that always recommends `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            sticky: StickyFlag::new(),
        }
    }
}

impl ReseedSchedule for ConstantSchedule {
    fn poll(&self) -> Action {
        self.action
    }

    fn acknowledge(&self) {}

    fn sticky(&self) -> &StickyFlag {
        &self.sticky
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_reports_its_action() {
        let schedule = ConstantSchedule::new(Action::TryReseed);
        assert_eq!(schedule.read(), Action::TryReseed);
        assert_eq!(schedule.read(), Action::TryReseed);
    }

    #[test]
    fn test_constant_must_reseed_relatches() {
        let schedule = ConstantSchedule::new(Action::MustReseed);
        assert_eq!(schedule.read(), Action::MustReseed);

        // The constant recommendation re-latches immediately after the
        // acknowledgement.
        schedule.notify_reseed();
        assert_eq!(schedule.read(), Action::MustReseed);
    }
}
