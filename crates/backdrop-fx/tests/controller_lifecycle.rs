//! End-to-end mount/unmount behaviour against a container that records
//! every child operation.

use std::cell::RefCell;
use std::rc::Rc;

use backdrop_engine::coords::Extent;
use backdrop_engine::paint::Palette;
use backdrop_engine::surface::{Container, ElementId, SurfaceOptions};
use backdrop_engine::time::DEFAULT_FRAME_INTERVAL_MS;
use backdrop_fx::flag::{AnimationSetting, CachedFlag, StaticFlag};
use backdrop_fx::{ControllerState, EffectConfig, EffectController, EffectKind};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Append(ElementId),
    Remove(ElementId),
}

/// Children and operations, shared so they stay readable after the
/// controller owning the container is gone.
#[derive(Debug, Default)]
struct Record {
    children: Vec<ElementId>,
    ops: Vec<Op>,
}

#[derive(Debug, Default)]
struct RecordingContainer {
    size: Extent,
    record: Rc<RefCell<Record>>,
}

impl RecordingContainer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: Extent::new(width, height),
            ..Default::default()
        }
    }

    fn record(&self) -> Rc<RefCell<Record>> {
        Rc::clone(&self.record)
    }

    fn ops(&self) -> Vec<Op> {
        self.record.borrow().ops.clone()
    }
}

impl Container for RecordingContainer {
    fn content_size(&self) -> Extent {
        self.size
    }

    fn append_child(&mut self, element: ElementId) {
        let mut record = self.record.borrow_mut();
        record.ops.push(Op::Append(element));
        record.children.push(element);
    }

    fn remove_child(&mut self, element: ElementId) -> bool {
        let mut record = self.record.borrow_mut();
        record.ops.push(Op::Remove(element));
        let before = record.children.len();
        record.children.retain(|&e| e != element);
        before != record.children.len()
    }

    fn child_count(&self) -> usize {
        self.record.borrow().children.len()
    }
}

fn raster_only() -> SurfaceOptions {
    SurfaceOptions {
        allow_gpu: false,
        ..Default::default()
    }
}

fn controller(kind: EffectKind) -> EffectController<RecordingContainer> {
    EffectController::new(
        RecordingContainer::new(800, 450),
        kind,
        EffectConfig::defaults(kind),
        Palette::default(),
        raster_only(),
    )
}

// ── mount / unmount ──────────────────────────────────────────────────────

#[test]
fn enabled_mount_runs_and_unmount_cleans_up() {
    for kind in [EffectKind::Gemini, EffectKind::Beams, EffectKind::Boxes] {
        let mut c = controller(kind);
        c.mount(true, false);
        assert_eq!(c.state(), ControllerState::Running, "{kind}");

        // At least one frame within two scheduler intervals.
        let mut rendered = 0;
        let mut now = 1_000.0;
        while now <= 1_000.0 + 2.0 * DEFAULT_FRAME_INTERVAL_MS {
            if c.on_host_frame(now) {
                rendered += 1;
            }
            now += 16.0;
        }
        assert!(rendered >= 1, "{kind}: no frame rendered");

        c.unmount();
        assert_eq!(c.state(), ControllerState::Disabled);
        assert_eq!(c.container().child_count(), 0);

        let ops = c.container().ops();
        assert_eq!(ops.len(), 2, "{kind}: {ops:?}");
        match (&ops[0], &ops[1]) {
            (Op::Append(a), Op::Remove(r)) => assert_eq!(a, r),
            other => panic!("unexpected ops {other:?}"),
        }
    }
}

#[test]
fn disabled_mount_never_creates_a_context() {
    let mut c = controller(EffectKind::Gemini);
    c.mount(false, false);
    for i in 0..10 {
        assert!(!c.on_host_frame(i as f64 * 40.0));
    }
    assert_eq!(c.state(), ControllerState::Disabled);
    assert!(c.surface().is_none());
    assert!(c.container().ops().is_empty());
}

#[test]
fn gpu_acquisition_failure_degrades_to_disabled() {
    let mut c = controller(EffectKind::Aurora);
    c.mount(true, false);
    assert_eq!(c.state(), ControllerState::Disabled);
    assert!(c.container().ops().is_empty());
    c.unmount();
}

#[test]
fn dropping_a_mounted_controller_releases_its_surface() {
    let mut c = controller(EffectKind::Beams);
    c.mount(true, false);
    let record = c.container().record();
    let element = c.surface().map(|s| s.element()).unwrap();
    assert_eq!(record.borrow().children, vec![element]);

    drop(c);

    let record = record.borrow();
    assert!(record.children.is_empty());
    assert_eq!(record.ops.last(), Some(&Op::Remove(element)));
}

// ── flag ─────────────────────────────────────────────────────────────────

#[test]
fn failing_flag_source_keeps_the_effect_off() {
    let mut flag = CachedFlag::new(|| -> anyhow::Result<AnimationSetting> {
        anyhow::bail!("503 service unavailable")
    });
    let mut c = controller(EffectKind::Boxes);
    c.mount(false, false);
    c.refresh_flag(&mut flag);
    assert_eq!(c.state(), ControllerState::Disabled);
}

#[test]
fn enabled_flag_activates_a_mounted_controller() {
    let mut flag = CachedFlag::new(StaticFlag(true));
    let mut c = controller(EffectKind::Boxes);
    c.mount(false, false);
    c.refresh_flag(&mut flag);
    assert_eq!(c.state(), ControllerState::Running);
    assert_eq!(c.container().child_count(), 1);
}

// ── resize ───────────────────────────────────────────────────────────────

#[test]
fn resize_is_visible_to_the_next_frame() {
    let mut c = controller(EffectKind::Gemini);
    c.mount(true, false);
    assert!(c.on_host_frame(0.0));

    c.container_mut().size = Extent::new(1024, 600);
    c.resize(1024, 600);
    assert!(c.on_host_frame(40.0));
    let surface = c.surface().unwrap();
    assert_eq!(surface.size(), Extent::new(1024, 600));
    assert_eq!(surface.raster().unwrap().size(), Extent::new(1024, 600));
}
