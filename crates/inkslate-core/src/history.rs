//! Undo-history grouping policy.
//!
//! A pointer gesture or a burst of keyboard nudges should undo as one step.
//! The coordinator tracks which group (if any) is open and closes it on
//! gesture end, nudge idle timeout, or an explicit interruption.

use crate::sink::AnnotationSink;
use crate::timer::DebounceTimer;

/// Why a history group is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Pointer drag or resize.
    Gesture,
    /// Run of arrow-key moves/resizes.
    Nudge,
}

/// Opens and closes history groups on the sink.
#[derive(Debug, Clone)]
pub struct HistoryCoordinator {
    open: Option<GroupKind>,
    nudge_timer: DebounceTimer,
    idle_ms: u64,
}

impl HistoryCoordinator {
    pub fn new(idle_ms: u64) -> Self {
        Self {
            open: None,
            nudge_timer: DebounceTimer::new(),
            idle_ms,
        }
    }

    /// The currently open group.
    pub fn open_group(&self) -> Option<GroupKind> {
        self.open
    }

    /// When the open nudge burst times out.
    pub fn next_deadline(&self) -> Option<u64> {
        self.nudge_timer.deadline()
    }

    /// Open a group for a pointer gesture, closing any nudge burst first.
    pub fn begin_gesture(&mut self, sink: &mut dyn AnnotationSink) {
        self.close(sink);
        log::debug!("history group opened for gesture");
        sink.begin_history_group();
        self.open = Some(GroupKind::Gesture);
    }

    /// Close the gesture group, if one is open.
    pub fn end_gesture(&mut self, sink: &mut dyn AnnotationSink) {
        if self.open == Some(GroupKind::Gesture) {
            self.close(sink);
        }
    }

    /// Record a nudge at `now`: join the open burst or start a new one, and
    /// push the idle deadline back.
    pub fn nudge(&mut self, now: u64, sink: &mut dyn AnnotationSink) {
        // A deadline that passed without a tick still ends the old burst.
        self.tick(now, sink);

        if self.open != Some(GroupKind::Nudge) {
            self.close(sink);
            log::debug!("history group opened for nudge burst");
            sink.begin_history_group();
            self.open = Some(GroupKind::Nudge);
        }
        self.nudge_timer.schedule(now, self.idle_ms);
    }

    /// Close an idle nudge burst whose deadline has passed.
    pub fn tick(&mut self, now: u64, sink: &mut dyn AnnotationSink) {
        if self.nudge_timer.fire_if_due(now) && self.open == Some(GroupKind::Nudge) {
            log::debug!("nudge burst idle, closing history group");
            self.open = None;
            sink.end_history_group();
        }
    }

    /// Close whatever group is open.
    pub fn close(&mut self, sink: &mut dyn AnnotationSink) {
        self.nudge_timer.cancel();
        if self.open.take().is_some() {
            sink.end_history_group();
        }
    }
}
