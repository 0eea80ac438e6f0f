use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

use crate::error::RasterError;
use crate::geometry::Vec2;
use crate::layer::{Layer, LayerSpec};
use crate::raster::{JobId, RasterFrame, RasterStatus, Rasterizer};

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageId(pub u64);

/// Immutable data a view renders from. Snapshots are compared by their
/// serialized form, so two structurally equal values are one render.
pub type Snapshot = serde_json::Value;

/// View function: data snapshot in, ordered layer specs out.
pub type ViewFn = Rc<dyn Fn(&Snapshot) -> Vec<LayerSpec>>;

/// How an update finished. Every callback fires exactly once with one of
/// these; a superseded or failed request is reported, never dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Layers were re-rendered and swapped in.
    Rendered,
    /// The snapshot was structurally equal to the previous one; nothing ran.
    Unchanged,
    /// A newer `update` replaced this request before it finished.
    Superseded,
    /// A rasterization failed or timed out; the page keeps its old layers.
    Failed,
}

pub type UpdateCallback = Box<dyn FnOnce(RenderOutcome)>;

enum PendingSlot {
    /// Image specs (and finished raster jobs) — layers ready to swap in.
    Ready(Vec<Layer>),
    Raster {
        job: JobId,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        scrollable: bool,
    },
}

struct PendingRender {
    slots: Vec<PendingSlot>,
    started: Instant,
    timeout: Duration,
    on_complete: Option<UpdateCallback>,
}

/// An ordered set of layers rendered from one data snapshot.
///
/// Updates are asynchronous (rasterization) but atomic: the layer list is
/// replaced only when every spec of the newest request has finished, so a
/// page never exposes a mix of two renders.
pub struct Page {
    id: PageId,
    view: ViewFn,
    tag: Option<String>,
    pub(crate) layers: Vec<Layer>,
    /// Transition offset in page units (-1..1 across the surface).
    pub offset: Vec2,
    last_snapshot: String,
    pending: Option<PendingRender>,
    surface_w: f32,
    surface_h: f32,
    raster_timeout: Duration,
}

impl Page {
    pub fn new(
        view: ViewFn,
        tag: Option<String>,
        surface: (f32, f32),
        raster_timeout: Duration,
    ) -> Self {
        Self {
            id: PageId(NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed)),
            view,
            tag,
            layers: Vec::new(),
            offset: Vec2::ZERO,
            last_snapshot: String::new(),
            pending: None,
            surface_w: surface.0,
            surface_h: surface.1,
            raster_timeout,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_rendering(&self) -> bool {
        self.pending.is_some()
    }

    /// Re-render from `snapshot`.
    ///
    /// Structurally equal snapshots short-circuit with
    /// [`RenderOutcome::Unchanged`] and no rasterizer traffic. Otherwise one
    /// request per markup spec fans out; the join completes on a later
    /// [`Page::pump`]. A still-running previous request is superseded whole —
    /// last writer wins at the page level, so stale layers can never mix into
    /// the new set.
    pub fn update(
        &mut self,
        snapshot: &Snapshot,
        rasterizer: &dyn Rasterizer,
        now: Instant,
        on_complete: UpdateCallback,
    ) {
        let serialized = snapshot.to_string();
        if serialized == self.last_snapshot {
            on_complete(RenderOutcome::Unchanged);
            return;
        }
        self.last_snapshot = serialized;

        if let Some(mut stale) = self.pending.take() {
            log::debug!("page {:?}: superseding in-flight render", self.id);
            if let Some(cb) = stale.on_complete.take() {
                cb(RenderOutcome::Superseded);
            }
        }

        let specs = (self.view)(snapshot);
        if specs.is_empty() {
            self.layers.clear();
            on_complete(RenderOutcome::Rendered);
            return;
        }

        let full_w = |w: Option<f32>, m: f32| w.unwrap_or(m);
        let slots = specs
            .into_iter()
            .map(|spec| match spec {
                LayerSpec::Markup {
                    source,
                    x,
                    y,
                    w,
                    h,
                    scrollable,
                } => {
                    let w = full_w(w, self.surface_w);
                    let h = full_w(h, self.surface_h);
                    let job = rasterizer.submit(&source, w as u32, h as u32);
                    PendingSlot::Raster {
                        job,
                        x,
                        y,
                        w,
                        h,
                        scrollable,
                    }
                }
                LayerSpec::Image {
                    frames,
                    x,
                    y,
                    w,
                    h,
                    frame_duration,
                    pixelated,
                } => {
                    let w = full_w(w, self.surface_w);
                    let h = full_w(h, self.surface_h);
                    let count = frames.len() as u32;
                    let layers = frames
                        .into_iter()
                        .enumerate()
                        .map(|(i, bitmap)| {
                            let mut layer = Layer::new(Rc::new(bitmap), x, y, w, h);
                            layer.frame_count = count;
                            layer.frame_index = i as u32;
                            layer.frame_duration = frame_duration;
                            layer.pixelated = pixelated;
                            layer
                        })
                        .collect();
                    PendingSlot::Ready(layers)
                }
            })
            .collect();

        self.pending = Some(PendingRender {
            slots,
            started: now,
            timeout: self.raster_timeout,
            on_complete: Some(on_complete),
        });
    }

    /// Poll in-flight rasterizations; swap the layer list in when the whole
    /// set is ready. Called once per frame by the stack.
    pub fn pump(&mut self, rasterizer: &dyn Rasterizer, now: Instant) {
        let Some(pending) = &mut self.pending else {
            return;
        };

        let mut failed: Option<RasterError> = None;
        for slot in &mut pending.slots {
            let PendingSlot::Raster {
                job,
                x,
                y,
                w,
                h,
                scrollable,
            } = *slot
            else {
                continue;
            };
            match rasterizer.poll(job) {
                RasterStatus::Pending => {}
                RasterStatus::Ready(frame) => {
                    *slot = PendingSlot::Ready(vec![layer_from_frame(frame, x, y, w, h, scrollable)]);
                }
                RasterStatus::Failed(err) => {
                    failed = Some(err);
                }
            }
        }

        if let Some(err) = failed {
            log::warn!("page {:?}: rasterization failed: {err}", self.id);
            self.finish(RenderOutcome::Failed);
            return;
        }

        let outstanding = pending
            .slots
            .iter()
            .any(|s| matches!(s, PendingSlot::Raster { .. }));
        if outstanding {
            if now.saturating_duration_since(pending.started) > pending.timeout {
                log::warn!(
                    "page {:?}: rasterization timed out after {:?}",
                    self.id,
                    pending.timeout
                );
                self.finish(RenderOutcome::Failed);
            }
            return;
        }

        if let Some(pending) = self.pending.take() {
            self.layers = pending
                .slots
                .into_iter()
                .flat_map(|s| match s {
                    PendingSlot::Ready(layers) => layers,
                    PendingSlot::Raster { .. } => unreachable!("no outstanding slots"),
                })
                .collect();
            if let Some(cb) = pending.on_complete {
                cb(RenderOutcome::Rendered);
            }
        }
    }

    fn finish(&mut self, outcome: RenderOutcome) {
        if let Some(mut pending) = self.pending.take()
            && let Some(cb) = pending.on_complete.take()
        {
            cb(outcome);
        }
    }
}

fn layer_from_frame(frame: RasterFrame, x: f32, y: f32, w: f32, h: f32, scrollable: bool) -> Layer {
    let RasterFrame {
        bitmap,
        content_height,
        anchors,
    } = frame;
    let mut layer = Layer::new(Rc::new(bitmap), x, y, w, h);
    layer.scroll_height = (content_height as f32).max(h);
    layer.scrollable = scrollable;
    layer.anchors = anchors.into();
    layer
}
