use crate::models::settings::DEFAULT_TOUCH_DRAG_THRESHOLD_PX;
use crate::models::task::Task;
use crate::services::scheduling::placement::SlotKey;

use super::target::{resolve_drop_target, DropTarget, Element};
use super::DragError;

/// Screen coordinates in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The task being dragged, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    Unplaced(Task),
    Placed(Task, SlotKey),
}

impl DragSource {
    pub fn task(&self) -> &Task {
        match self {
            DragSource::Unplaced(task) | DragSource::Placed(task, _) => task,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task().id
    }

    pub fn origin(&self) -> Option<SlotKey> {
        match self {
            DragSource::Unplaced(_) => None,
            DragSource::Placed(_, key) => Some(*key),
        }
    }
}

/// What a finished gesture asks the scheduler to do.
///
/// Both input modalities produce this; `target` is `None` when the pointer
/// was released outside any drop zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    pub source: DragSource,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Pointer,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Dragging,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: DragSource,
    pub modality: Modality,
    pub start: Point,
    pub current: Point,
    pub hovered: Option<DropTarget>,
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Armed(DragSession),
    Dragging(DragSession),
}

/// Result of releasing a touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Movement never passed the threshold; the host handles it as a click.
    Tap,
    Drop(DropIntent),
}

/// Presentation hooks the touch emulation needs.
pub trait DragHost {
    /// Elements under `point`, innermost first.
    fn element_path_at(&self, point: Point) -> Vec<Element>;
    fn create_ghost(&mut self, source: &DragSource, at: Point);
    fn move_ghost(&mut self, to: Point);
    fn set_ghost_visible(&mut self, visible: bool);
    fn remove_ghost(&mut self);
    fn dim_source(&mut self, source: &DragSource);
    fn restore_source(&mut self, source: &DragSource);
    fn highlight(&mut self, target: Option<&DropTarget>);
}

/// At most one drag at a time, from either modality.
///
/// A start while another session is armed or dragging is refused with
/// `DragError::SessionActive`; the running session is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DragTracker {
    state: DragState,
    threshold: f64,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_DRAG_THRESHOLD_PX)
    }
}

impl DragTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: DragState::Idle,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn phase(&self) -> DragPhase {
        match self.state {
            DragState::Idle => DragPhase::Idle,
            DragState::Armed(_) => DragPhase::Armed,
            DragState::Dragging(_) => DragPhase::Dragging,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed(session) | DragState::Dragging(session) => Some(session),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    pub fn hovered(&self) -> Option<&DropTarget> {
        self.session().and_then(|session| session.hovered.as_ref())
    }

    // Native pointer drag. The platform already told tap from drag apart.

    pub fn native_start(&mut self, source: DragSource) -> Result<(), DragError> {
        self.ensure_idle(&source)?;
        log::debug!("Pointer drag started for task {}", source.task_id());
        self.state = DragState::Dragging(DragSession {
            source,
            modality: Modality::Pointer,
            start: Point::default(),
            current: Point::default(),
            hovered: None,
        });
        Ok(())
    }

    /// Pointer entered the element path `path`; returns the hovered zone.
    pub fn native_enter(&mut self, path: &[Element]) -> Option<DropTarget> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        session.hovered = resolve_drop_target(path).ok().flatten();
        session.hovered
    }

    pub fn native_leave(&mut self) {
        if let DragState::Dragging(session) = &mut self.state {
            session.hovered = None;
        }
    }

    pub fn native_drop(&mut self, path: &[Element]) -> Result<DropIntent, DragError> {
        let session = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(session) if session.modality == Modality::Pointer => session,
            other => {
                self.state = other;
                return Err(DragError::NoActiveSession);
            }
        };

        let target = resolve_drop_target(path)?;
        Ok(DropIntent {
            source: session.source,
            target,
        })
    }

    /// `dragend`: fires after a drop as well, so it is a no-op when idle.
    pub fn native_end(&mut self) {
        if let Some(session) = self.session() {
            if session.modality == Modality::Pointer {
                log::debug!("Pointer drag for task {} ended", session.source.task_id());
                self.state = DragState::Idle;
            }
        }
    }

    // Emulated touch drag.

    pub fn touch_start(&mut self, source: DragSource, at: Point) -> Result<(), DragError> {
        self.ensure_idle(&source)?;
        self.state = DragState::Armed(DragSession {
            source,
            modality: Modality::Touch,
            start: at,
            current: at,
            hovered: None,
        });
        Ok(())
    }

    pub fn touch_move(&mut self, to: Point, host: &mut dyn DragHost) -> Result<(), DragError> {
        let threshold = self.threshold;
        match &mut self.state {
            DragState::Idle => Err(DragError::NoActiveSession),
            DragState::Armed(session) => {
                session.current = to;
                if session.start.distance_to(to) <= threshold {
                    return Ok(());
                }

                let mut session = session.clone();
                log::debug!("Touch drag started for task {}", session.source.task_id());
                host.create_ghost(&session.source, to);
                host.dim_source(&session.source);
                update_hover(&mut session, to, host);
                self.state = DragState::Dragging(session);
                Ok(())
            }
            DragState::Dragging(session) if session.modality == Modality::Touch => {
                session.current = to;
                host.move_ghost(to);
                update_hover(session, to, host);
                Ok(())
            }
            DragState::Dragging(_) => Err(DragError::NoActiveSession),
        }
    }

    /// Release the touch at `at`.
    ///
    /// The ghost is hidden before hit-testing so the element beneath the
    /// finger is found, then removed. The tracker is idle afterwards even
    /// when the zone under the finger is malformed.
    pub fn touch_end(&mut self, at: Point, host: &mut dyn DragHost) -> Result<TouchOutcome, DragError> {
        let session = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Armed(_) => return Ok(TouchOutcome::Tap),
            DragState::Dragging(session) if session.modality == Modality::Touch => session,
            other => {
                self.state = other;
                return Err(DragError::NoActiveSession);
            }
        };

        host.set_ghost_visible(false);
        let path = host.element_path_at(at);
        host.remove_ghost();
        host.restore_source(&session.source);
        host.highlight(None);

        let target = resolve_drop_target(&path)?;
        Ok(TouchOutcome::Drop(DropIntent {
            source: session.source,
            target,
        }))
    }

    /// `touchcancel`: tear down without dropping. Returns whether anything
    /// was active.
    pub fn touch_cancel(&mut self, host: &mut dyn DragHost) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => false,
            DragState::Armed(session) if session.modality == Modality::Touch => true,
            DragState::Dragging(session) if session.modality == Modality::Touch => {
                host.remove_ghost();
                host.restore_source(&session.source);
                host.highlight(None);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    fn ensure_idle(&self, incoming: &DragSource) -> Result<(), DragError> {
        match self.session() {
            Some(active) => {
                log::warn!(
                    "Ignoring drag of task {} while task {} is still being dragged",
                    incoming.task_id(),
                    active.source.task_id()
                );
                Err(DragError::SessionActive)
            }
            None => Ok(()),
        }
    }
}

fn update_hover(session: &mut DragSession, at: Point, host: &mut dyn DragHost) {
    host.set_ghost_visible(false);
    let hovered = resolve_drop_target(&host.element_path_at(at)).ok().flatten();
    host.set_ghost_visible(true);

    if hovered != session.hovered {
        host.highlight(hovered.as_ref());
        session.hovered = hovered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::TimeSlot;
    use chrono::NaiveDate;
    use std::cell::Cell;

    #[derive(Default)]
    struct RecordingHost {
        path: Vec<Element>,
        ghost: bool,
        ghost_visible: bool,
        occluded_hit_tests: Cell<usize>,
        dimmed: bool,
        highlighted: Option<DropTarget>,
    }

    impl DragHost for RecordingHost {
        fn element_path_at(&self, _point: Point) -> Vec<Element> {
            if self.ghost && self.ghost_visible {
                self.occluded_hit_tests.set(self.occluded_hit_tests.get() + 1);
            }
            self.path.clone()
        }
        fn create_ghost(&mut self, _source: &DragSource, _at: Point) {
            self.ghost = true;
            self.ghost_visible = true;
        }
        fn move_ghost(&mut self, _to: Point) {}
        fn set_ghost_visible(&mut self, visible: bool) {
            self.ghost_visible = visible;
        }
        fn remove_ghost(&mut self) {
            self.ghost = false;
        }
        fn dim_source(&mut self, _source: &DragSource) {
            self.dimmed = true;
        }
        fn restore_source(&mut self, _source: &DragSource) {
            self.dimmed = false;
        }
        fn highlight(&mut self, target: Option<&DropTarget>) {
            self.highlighted = target.copied();
        }
    }

    fn source() -> DragSource {
        DragSource::Unplaced(Task::new("42", "Write report").unwrap())
    }

    fn slot(day: u32, hour: u32) -> SlotKey {
        SlotKey::new(
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            TimeSlot::new(hour, 0).unwrap(),
        )
    }

    #[test]
    fn test_movement_at_threshold_is_a_tap() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost::default();

        tracker.touch_start(source(), Point::new(0.0, 0.0)).unwrap();
        tracker.touch_move(Point::new(6.0, 8.0), &mut host).unwrap();
        assert_eq!(tracker.phase(), DragPhase::Armed);
        assert!(!host.ghost);

        let outcome = tracker.touch_end(Point::new(6.0, 8.0), &mut host).unwrap();
        assert_eq!(outcome, TouchOutcome::Tap);
        assert_eq!(tracker.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_movement_past_threshold_drags_and_drops() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost {
            path: vec![Element::other(), Element::time_slot("2024-06-10", "10:00 AM")],
            ..Default::default()
        };

        tracker.touch_start(source(), Point::new(0.0, 0.0)).unwrap();
        tracker.touch_move(Point::new(10.5, 0.0), &mut host).unwrap();
        assert_eq!(tracker.phase(), DragPhase::Dragging);
        assert!(host.ghost);
        assert!(host.dimmed);
        assert_eq!(host.highlighted, Some(DropTarget::Slot(slot(10, 10))));

        let outcome = tracker.touch_end(Point::new(10.5, 0.0), &mut host).unwrap();
        assert_eq!(
            outcome,
            TouchOutcome::Drop(DropIntent {
                source: source(),
                target: Some(DropTarget::Slot(slot(10, 10))),
            })
        );
        assert!(!host.ghost);
        assert!(!host.dimmed);
        assert_eq!(host.highlighted, None);
        assert_eq!(host.occluded_hit_tests.get(), 0);
    }

    #[test]
    fn test_movement_is_measured_from_start_not_last_move() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost::default();

        tracker.touch_start(source(), Point::new(100.0, 100.0)).unwrap();
        for step in 1..=4 {
            let offset = step as f64 * 3.0;
            tracker
                .touch_move(Point::new(100.0 + offset, 100.0), &mut host)
                .unwrap();
        }
        assert_eq!(tracker.phase(), DragPhase::Dragging);
    }

    #[test]
    fn test_second_start_is_ignored() {
        let mut tracker = DragTracker::default();
        tracker.native_start(source()).unwrap();

        let other = DragSource::Placed(Task::new("7", "Other").unwrap(), slot(10, 9));
        assert_eq!(
            tracker.touch_start(other.clone(), Point::default()),
            Err(DragError::SessionActive)
        );
        assert_eq!(tracker.native_start(other), Err(DragError::SessionActive));
        assert_eq!(tracker.session().unwrap().source, source());
    }

    #[test]
    fn test_native_drop_resolves_enclosing_zone() {
        let mut tracker = DragTracker::default();
        let placed = DragSource::Placed(Task::new("42", "Write report").unwrap(), slot(10, 9));
        tracker.native_start(placed.clone()).unwrap();

        let hovered = tracker.native_enter(&[Element::month_day("2024-06-11")]);
        assert!(matches!(hovered, Some(DropTarget::Day(_))));
        tracker.native_leave();
        assert!(tracker.hovered().is_none());

        let intent = tracker
            .native_drop(&[Element::other(), Element::tray()])
            .unwrap();
        assert_eq!(intent.source, placed);
        assert_eq!(intent.target, Some(DropTarget::Unplaced));
        assert!(!tracker.is_active());

        tracker.native_end();
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_drop_without_session_is_a_precondition_error() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost::default();
        assert_eq!(
            tracker.native_drop(&[Element::tray()]),
            Err(DragError::NoActiveSession)
        );
        assert_eq!(
            tracker.touch_end(Point::default(), &mut host),
            Err(DragError::NoActiveSession)
        );
    }

    #[test]
    fn test_malformed_zone_still_tears_down() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost::default();

        tracker.touch_start(source(), Point::new(0.0, 0.0)).unwrap();
        tracker.touch_move(Point::new(50.0, 0.0), &mut host).unwrap();

        host.path = vec![Element::month_day("")];
        let result = tracker.touch_end(Point::new(50.0, 0.0), &mut host);

        assert_eq!(result, Err(DragError::MissingAttribute("date")));
        assert!(!tracker.is_active());
        assert!(!host.ghost);
    }

    #[test]
    fn test_touch_cancel_restores_source() {
        let mut tracker = DragTracker::default();
        let mut host = RecordingHost::default();

        assert!(!tracker.touch_cancel(&mut host));
        tracker.touch_start(source(), Point::new(0.0, 0.0)).unwrap();
        tracker.touch_move(Point::new(0.0, 30.0), &mut host).unwrap();

        assert!(tracker.touch_cancel(&mut host));
        assert!(!host.ghost);
        assert!(!host.dimmed);
        assert_eq!(tracker.phase(), DragPhase::Idle);
    }
}
