//! Scripted end-to-end run of a Vitrail panel, no GPU or headset required.
//!
//! A toy rasterizer turns line-based markup into colored bands and anchor
//! rows. A scripted right hand then clicks through the menu, drags the mod
//! list, and navigates back — printing every dispatched action on the way.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Quat;
use serde_json::json;
use web_time::{Duration, Instant};

use vitrail_core::raster::{JobId, RasterFrame, RasterStatus, Rasterizer};
use vitrail_core::{
    Anchor, Bitmap, Hand, InputEvent, InputKind, LayerSpec, PushOptions, Rect, Snapshot,
    SurfacePose, Ui, UiConfig, ViewFn,
};
use vitrail_spatial::{ControllerPose, Interaction, surface_point};

const ROW_HEIGHT: u32 = 96;

/// Line-based markup: every `@action` line becomes a full-width anchor row,
/// plain lines are inert text bands. Renders synchronously but still goes
/// through the async polling contract like a real layout engine would.
#[derive(Default)]
struct BandRasterizer {
    next: Cell<u64>,
    jobs: RefCell<Vec<(JobId, String, u32, u32)>>,
}

impl Rasterizer for BandRasterizer {
    fn submit(&self, markup: &str, width: u32, height: u32) -> JobId {
        self.next.set(self.next.get() + 1);
        let job = JobId(self.next.get());
        self.jobs
            .borrow_mut()
            .push((job, markup.to_string(), width, height));
        job
    }

    fn poll(&self, job: JobId) -> RasterStatus {
        let jobs = self.jobs.borrow();
        let Some((_, markup, width, height)) = jobs.iter().find(|(j, ..)| *j == job) else {
            return RasterStatus::Pending;
        };
        let lines: Vec<&str> = markup.lines().filter(|l| !l.trim().is_empty()).collect();
        let content_height = (lines.len() as u32 * ROW_HEIGHT).max(*height);

        let mut pixels = vec![0u8; (*width * content_height * 4) as usize];
        let mut anchors = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            let shade = 40 + ((row * 37) % 160) as u8;
            let y0 = row as u32 * ROW_HEIGHT;
            for y in y0..(y0 + ROW_HEIGHT).min(content_height) {
                for x in 0..*width {
                    let i = ((y * width + x) * 4) as usize;
                    pixels[i..i + 4].copy_from_slice(&[shade, shade, 90, 255]);
                }
            }
            if let Some(action) = line.trim().strip_prefix('@') {
                anchors.push(Anchor::click(
                    Rect::new(0.0, y0 as f32, *width as f32, ROW_HEIGHT as f32),
                    action.trim(),
                ));
            }
        }

        RasterStatus::Ready(RasterFrame {
            bitmap: Bitmap::new(*width, content_height, pixels),
            content_height,
            anchors,
        })
    }
}

fn menu_view() -> ViewFn {
    Rc::new(|snap: &Snapshot| {
        let world = snap["world"].as_str().unwrap_or("unnamed");
        vec![LayerSpec::markup(format!(
            "world: {world}\n@mods:open\n@settings:open\n@world:disconnect"
        ))]
    })
}

fn mods_view() -> ViewFn {
    Rc::new(|snap: &Snapshot| {
        let mods = snap["mods"].as_array().cloned().unwrap_or_default();
        let rows: Vec<String> = mods
            .iter()
            .map(|m| format!("@mod:toggle:{}", m.as_str().unwrap_or("?")))
            .collect();
        vec![LayerSpec::scrollable_markup(rows.join("\n"))]
    })
}

/// Aim the right hand at a surface pixel from half a world unit out.
fn aim(ui: &Ui, pose: &SurfacePose, x: f32, y: f32) -> ControllerPose {
    ControllerPose {
        position: surface_point(pose, ui.metrics(), x, y, 0.5),
        orientation: pose.rotation,
    }
}

struct Sim {
    ui: Ui,
    interaction: Interaction,
    pose: SurfacePose,
    now: Instant,
    world_time: Duration,
}

impl Sim {
    /// One cooperative frame at ~90 Hz.
    fn step(&mut self, controller: Option<ControllerPose>) {
        let dt = Duration::from_millis(11);
        self.now += dt;
        self.world_time += dt;
        if let Err(err) = self.ui.frame(self.now, self.world_time) {
            log::error!("compositor refresh failed: {err}");
        }
        let actions = self
            .interaction
            .frame(&mut self.ui, &self.pose, [None, controller]);
        for action in &actions {
            log::info!(
                "action dispatched: {} (value {:.2}, {:?})",
                action.action,
                action.value,
                action.hand
            );
        }
    }

    fn click(&mut self, at: ControllerPose) {
        self.step(Some(at));
        self.interaction.push_event(InputEvent {
            hand: Hand::Right,
            kind: InputKind::Click,
        });
        self.step(Some(at));
    }

    fn settle(&mut self, frames: usize, controller: Option<ControllerPose>) {
        for _ in 0..frames {
            self.step(controller);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raster = Rc::new(BandRasterizer::default());
    let mut sim = Sim {
        ui: Ui::new(UiConfig::default(), raster),
        interaction: Interaction::new(),
        pose: SurfacePose::new(glam::Vec3::new(0.0, 1.2, -1.0), Quat::IDENTITY),
        now: Instant::now(),
        world_time: Duration::ZERO,
    };
    let t0 = sim.now;

    sim.ui
        .push_page(
            menu_view(),
            Some("menu".into()),
            &json!({"world": "atrium"}),
            PushOptions::default(),
            sim.now,
            Some(Box::new(|| log::info!("menu page visible"))),
        )
        .expect("stack has room for the first page");
    sim.settle(3, None);

    // Hover the second row ("@mods:open" renders at rows 96..192) and click.
    let mods_row = aim(&sim.ui, &sim.pose, 1024.0, 150.0);
    sim.click(mods_row);

    // The click handler in a real host would do this routing; the sim plays
    // that role itself.
    sim.ui
        .push_page(
            mods_view(),
            Some("mods".into()),
            &json!({"mods": (0..24).map(|i| format!("mod-{i:02}")).collect::<Vec<_>>()}),
            PushOptions::default(),
            sim.now,
            Some(Box::new(|| log::info!("mod list visible"))),
        )
        .expect("stack has room for the mod list");
    // Let the slide play out.
    sim.settle(100, Some(mods_row));

    let top = sim.ui.stack().top().map(|p| p.tag().map(str::to_string));
    log::info!("stack depth {} (top: {top:?})", sim.ui.stack().depth());

    // Drag the list up by ~600 px and release.
    let grab = aim(&sim.ui, &sim.pose, 1024.0, 1100.0);
    sim.step(Some(grab));
    sim.interaction.push_event(InputEvent {
        hand: Hand::Right,
        kind: InputKind::Press,
    });
    sim.step(Some(grab));
    for i in 1..=10 {
        let dragged = aim(&sim.ui, &sim.pose, 1024.0, 1100.0 - 60.0 * i as f32);
        sim.step(Some(dragged));
    }
    sim.interaction.push_event(InputEvent {
        hand: Hand::Right,
        kind: InputKind::Release,
    });
    let released = aim(&sim.ui, &sim.pose, 1024.0, 500.0);
    sim.step(Some(released));

    if let Some((_, layer)) = sim.ui.stack().visible_layers().find(|(_, l)| l.scrollable) {
        log::info!(
            "mod list scrolled to {:.0}/{:.0} px",
            layer.scroll_top(),
            layer.max_scroll()
        );
    }

    // Same snapshot again: the idempotence check makes this free.
    sim.ui.update_pages(
        "mods",
        &json!({"mods": (0..24).map(|i| format!("mod-{i:02}")).collect::<Vec<_>>()}),
        sim.now,
    );

    // Back to the menu.
    sim.ui.pop_page(
        Default::default(),
        sim.now,
        Some(Box::new(|| log::info!("back at the menu"))),
    );
    sim.settle(100, None);

    log::info!(
        "simulation done after {:?}: depth {}, {} layer(s) visible",
        sim.now - t0,
        sim.ui.stack().depth(),
        sim.ui.stack().visible_layers().count()
    );
}
