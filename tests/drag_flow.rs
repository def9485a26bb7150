// Integration tests for pointer and touch gestures feeding the scheduler

mod fixtures;

use pretty_assertions::assert_eq;

use fixtures::dates::{june, slot};
use fixtures::items::{due_at, item};
use fixtures::{loaded_scheduler, FakeBackend};
use task_calendar::services::drag::{
    DragError, DragHost, DragPhase, DragSource, DropTarget, Element, Point, TouchOutcome,
};
use task_calendar::services::scheduling::{DropOutcome, Scheduler};

/// Screen stand-in: a fixed element path for each point, plus a log of
/// presentation calls.
#[derive(Default)]
struct FakeScreen {
    regions: Vec<(Point, Vec<Element>)>,
    ghost: Option<Point>,
    ghost_visible: bool,
    dimmed: Vec<String>,
    highlighted: Option<DropTarget>,
    removed_while_visible: bool,
}

impl FakeScreen {
    fn region(mut self, at: Point, path: Vec<Element>) -> Self {
        self.regions.push((at, path));
        self
    }
}

impl DragHost for FakeScreen {
    fn element_path_at(&self, point: Point) -> Vec<Element> {
        if self.ghost.is_some() && self.ghost_visible {
            // The ghost sits under the finger and would swallow the hit test.
            return vec![Element::other()];
        }
        self.regions
            .iter()
            .find(|(at, _)| *at == point)
            .map(|(_, path)| path.clone())
            .unwrap_or_default()
    }

    fn create_ghost(&mut self, _source: &DragSource, at: Point) {
        self.ghost = Some(at);
        self.ghost_visible = true;
    }

    fn move_ghost(&mut self, to: Point) {
        self.ghost = Some(to);
    }

    fn set_ghost_visible(&mut self, visible: bool) {
        self.ghost_visible = visible;
    }

    fn remove_ghost(&mut self) {
        self.removed_while_visible |= self.ghost_visible && self.ghost.is_some();
        self.ghost = None;
    }

    fn dim_source(&mut self, source: &DragSource) {
        self.dimmed.push(source.task_id().to_string());
    }

    fn restore_source(&mut self, source: &DragSource) {
        self.dimmed.retain(|id| id != source.task_id());
    }

    fn highlight(&mut self, target: Option<&DropTarget>) {
        self.highlighted = target.copied();
    }
}

fn tray_source(scheduler: &Scheduler<FakeBackend>, id: &str) -> DragSource {
    DragSource::Unplaced(scheduler.board().task(id).cloned().unwrap())
}

#[tokio::test]
async fn test_touch_within_threshold_is_a_tap() {
    let backend = FakeBackend::with_items(vec![item("42", "Write report")]);
    let mut scheduler = loaded_scheduler(backend).await;
    let mut screen = FakeScreen::default();

    let source = tray_source(&scheduler, "42");
    let drag = scheduler.drag_mut();
    drag.touch_start(source, Point::new(100.0, 100.0)).unwrap();
    // 6-8-10 triangle: exactly on the threshold
    drag.touch_move(Point::new(106.0, 108.0), &mut screen).unwrap();
    assert_eq!(drag.phase(), DragPhase::Armed);

    let outcome = drag.touch_end(Point::new(106.0, 108.0), &mut screen).unwrap();
    assert_eq!(outcome, TouchOutcome::Tap);
    assert!(screen.ghost.is_none());
    assert!(screen.dimmed.is_empty());
    assert!(!scheduler.drag().is_active());
    assert!(scheduler.backend().commands().is_empty());
}

#[tokio::test]
async fn test_touch_drag_past_threshold_schedules() {
    let backend = FakeBackend::with_items(vec![item("42", "Write report")]);
    let mut scheduler = loaded_scheduler(backend).await;
    let drop_point = Point::new(300.0, 420.0);
    let mut screen = FakeScreen::default().region(
        drop_point,
        vec![
            Element::other(),
            Element::time_slot("2024-06-10", "10:00 AM"),
        ],
    );

    let source = tray_source(&scheduler, "42");
    let drag = scheduler.drag_mut();
    drag.touch_start(source, Point::new(100.0, 100.0)).unwrap();
    drag.touch_move(Point::new(110.5, 100.0), &mut screen).unwrap();
    assert_eq!(drag.phase(), DragPhase::Dragging);
    assert_eq!(screen.dimmed, vec!["42".to_string()]);

    drag.touch_move(drop_point, &mut screen).unwrap();
    assert_eq!(screen.ghost, Some(drop_point));

    let TouchOutcome::Drop(intent) = drag.touch_end(drop_point, &mut screen).unwrap() else {
        panic!("expected a drop");
    };
    assert!(!screen.removed_while_visible);
    assert!(screen.ghost.is_none());
    assert!(screen.dimmed.is_empty());
    assert_eq!(screen.highlighted, None);

    let outcome = scheduler.handle_drop(intent).await.unwrap();
    assert_eq!(outcome, DropOutcome::Scheduled(slot(10, 10)));
    assert_eq!(
        scheduler.backend().commands()[0].args["due"]["date"],
        "2024-06-10T14:00:00Z"
    );
}

#[tokio::test]
async fn test_touch_drop_on_month_day_uses_free_slot() {
    let backend = FakeBackend::with_items(vec![
        due_at(item("1", "Standup"), "2024-06-14T09:00:00"),
        item("42", "Write report"),
    ]);
    let mut scheduler = loaded_scheduler(backend).await;
    let drop_point = Point::new(50.0, 60.0);
    let mut screen = FakeScreen::default().region(drop_point, vec![Element::month_day("2024-06-14")]);

    let source = tray_source(&scheduler, "42");
    let drag = scheduler.drag_mut();
    drag.touch_start(source, Point::new(0.0, 0.0)).unwrap();
    drag.touch_move(drop_point, &mut screen).unwrap();
    assert_eq!(
        screen.highlighted,
        Some(DropTarget::Day(june(14)))
    );

    let TouchOutcome::Drop(intent) = drag.touch_end(drop_point, &mut screen).unwrap() else {
        panic!("expected a drop");
    };
    let outcome = scheduler.handle_drop(intent).await.unwrap();
    assert_eq!(outcome, DropOutcome::Scheduled(slot(14, 10)));
}

#[tokio::test]
async fn test_touch_drop_on_malformed_zone_tears_down() {
    let backend = FakeBackend::with_items(vec![item("42", "Write report")]);
    let mut scheduler = loaded_scheduler(backend).await;
    let drop_point = Point::new(40.0, 40.0);
    let mut screen = FakeScreen::default().region(
        drop_point,
        vec![Element::time_slot("2024-06-10", "10:00 AM").with_time("teatime")],
    );

    let source = tray_source(&scheduler, "42");
    let drag = scheduler.drag_mut();
    drag.touch_start(source, Point::new(0.0, 0.0)).unwrap();
    drag.touch_move(drop_point, &mut screen).unwrap();
    let err = drag.touch_end(drop_point, &mut screen).unwrap_err();

    assert!(matches!(err, DragError::InvalidAttribute { attribute: "time", .. }));
    assert_eq!(drag.phase(), DragPhase::Idle);
    assert!(screen.ghost.is_none());
    assert!(screen.dimmed.is_empty());
    assert!(scheduler.backend().commands().is_empty());
}

#[tokio::test]
async fn test_touch_cancel_leaves_board_alone() {
    let backend = FakeBackend::with_items(vec![due_at(item("42", "Write report"), "2024-06-10T09:00:00")]);
    let mut scheduler = loaded_scheduler(backend).await;
    let mut screen = FakeScreen::default();

    let source = DragSource::Placed(scheduler.board().task("42").cloned().unwrap(), slot(10, 9));
    let drag = scheduler.drag_mut();
    drag.touch_start(source, Point::new(0.0, 0.0)).unwrap();
    drag.touch_move(Point::new(0.0, 30.0), &mut screen).unwrap();

    assert!(drag.touch_cancel(&mut screen));
    assert!(!drag.touch_cancel(&mut screen));
    assert!(screen.ghost.is_none());
    assert_eq!(
        scheduler.board().locate("42").unwrap().slot(),
        Some(slot(10, 9))
    );
}

#[tokio::test]
async fn test_second_drag_is_refused_while_one_is_active() {
    let backend = FakeBackend::with_items(vec![item("1", "One"), item("2", "Two")]);
    let mut scheduler = loaded_scheduler(backend).await;
    let mut screen = FakeScreen::default();

    let first = tray_source(&scheduler, "1");
    let second = tray_source(&scheduler, "2");
    let drag = scheduler.drag_mut();
    drag.touch_start(first, Point::new(0.0, 0.0)).unwrap();
    drag.touch_move(Point::new(0.0, 20.0), &mut screen).unwrap();

    assert_eq!(drag.native_start(second.clone()), Err(DragError::SessionActive));
    assert_eq!(
        drag.touch_start(second, Point::new(5.0, 5.0)),
        Err(DragError::SessionActive)
    );
    assert_eq!(drag.session().unwrap().source.task_id(), "1");
}

#[tokio::test]
async fn test_native_drop_on_time_label_is_ignored() {
    let backend = FakeBackend::with_items(vec![item("42", "Write report")]);
    let mut scheduler = loaded_scheduler(backend).await;

    let source = tray_source(&scheduler, "42");
    let drag = scheduler.drag_mut();
    drag.native_start(source).unwrap();
    assert_eq!(
        drag.native_enter(&[Element::time_slot("2024-06-10", "9:00 AM")]),
        Some(DropTarget::Slot(slot(10, 9)))
    );
    drag.native_leave();
    assert_eq!(drag.hovered(), None);

    let intent = drag.native_drop(&[Element::time_label("9:00 AM")]).unwrap();
    drag.native_end();
    assert_eq!(intent.target, None);

    assert_eq!(
        scheduler.handle_drop(intent).await.unwrap(),
        DropOutcome::Ignored
    );
    assert_eq!(scheduler.board().unplaced().len(), 1);
    assert!(scheduler.backend().commands().is_empty());
}

#[tokio::test]
async fn test_native_drag_back_to_tray_unschedules() {
    let backend = FakeBackend::with_items(vec![due_at(item("42", "Write report"), "2024-06-10T09:00:00")]);
    let mut scheduler = loaded_scheduler(backend).await;

    let source = DragSource::Placed(scheduler.board().task("42").cloned().unwrap(), slot(10, 9));
    let drag = scheduler.drag_mut();
    drag.native_start(source).unwrap();
    let intent = drag
        .native_drop(&[Element::other(), Element::tray()])
        .unwrap();

    assert_eq!(
        scheduler.handle_drop(intent).await.unwrap(),
        DropOutcome::Unscheduled
    );
    assert_eq!(scheduler.board().unplaced()[0].id, "42");
    assert!(scheduler.board().placements().is_empty());
}
