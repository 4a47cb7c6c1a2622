//! Combines two schedules.

use super::{Action, ReseedSchedule, StickyFlag};

/// Forwards the more urgent of two child recommendations.
///
/// Reseed acknowledgements fan out to both children. Trees nest, so any
/// number of schedules can be combined.
#[derive(Debug)]
pub struct TreeSchedule<A, B> {
    left: A,
    right: B,
    sticky: StickyFlag,
}

impl<A: ReseedSchedule, B: ReseedSchedule> TreeSchedule<A, B> {
    /// Combines `left` and `right`.
    pub fn new(left: A, right: B) -> Self {
        Self {
            left,
            right,
            sticky: StickyFlag::new(),
        }
    }
}

impl<A: ReseedSchedule, B: ReseedSchedule> ReseedSchedule for TreeSchedule<A, B> {
    fn poll(&self) -> Action {
        self.left.read().max(self.right.read())
    }

    fn acknowledge(&self) {
        self.left.notify_reseed();
        self.right.notify_reseed();
    }

    fn sticky(&self) -> &StickyFlag {
        &self.sticky
    }
}
