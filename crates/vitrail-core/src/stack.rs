use web_time::{Duration, Instant};

use crate::animation::TransitionSpec;
use crate::error::StackError;
use crate::geometry::Vec2;
use crate::layer::{Layer, LayerId};
use crate::page::{Page, Snapshot, ViewFn};
use crate::raster::Rasterizer;

pub const DEFAULT_STACK_CAPACITY: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionDir {
    Forward,
    Backward,
}

pub type DoneCallback = Box<dyn FnOnce()>;

#[derive(Clone, Copy)]
struct Slide {
    start: f32,
    end: f32,
}

/// An in-flight slide between the two topmost pages. At most one exists at a
/// time; starting a new one cancels the old one first (offsets snap to their
/// end values and the old completion callback still fires).
struct Transition {
    dir: TransitionDir,
    started: Instant,
    spec: TransitionSpec,
    below: Slide,
    top: Slide,
    /// Backward slides remove the departing top page on completion.
    pop_on_complete: bool,
    on_complete: Option<DoneCallback>,
}

impl Transition {
    fn forward(started: Instant, spec: TransitionSpec, on_complete: Option<DoneCallback>) -> Self {
        Self {
            dir: TransitionDir::Forward,
            started,
            spec,
            below: Slide {
                start: 0.0,
                end: -1.0,
            },
            top: Slide {
                start: 1.0,
                end: 0.0,
            },
            pop_on_complete: false,
            on_complete,
        }
    }

    fn backward(started: Instant, spec: TransitionSpec, on_complete: Option<DoneCallback>) -> Self {
        Self {
            dir: TransitionDir::Backward,
            started,
            spec,
            below: Slide {
                start: -1.0,
                end: 0.0,
            },
            top: Slide {
                start: 0.0,
                end: 1.0,
            },
            pop_on_complete: true,
            on_complete,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PushOptions {
    /// Skip the slide and show the page as soon as it has rendered.
    pub immediate: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PopOptions {
    pub immediate: bool,
}

enum StagedMode {
    Push { immediate: bool },
    Replace,
}

/// A page rendering off-stack. It joins the stack only once its full layer
/// set exists, so a half-rendered page is never composited.
struct Staged {
    page: Page,
    mode: StagedMode,
    on_done: Option<DoneCallback>,
}

/// Navigable stack of pages with slide transitions.
///
/// Depth is bounded: pushing past `capacity` is rejected with
/// [`StackError::CapacityExceeded`] rather than silently dropped, and callers
/// that want the browser-like behavior pop first. Popping the last page is a
/// no-op.
pub struct PageStack {
    pages: Vec<Page>,
    staged: Option<Staged>,
    transition: Option<Transition>,
    transition_spec: TransitionSpec,
    capacity: usize,
    surface: (f32, f32),
    raster_timeout: Duration,
}

impl PageStack {
    pub fn new(
        capacity: usize,
        transition_spec: TransitionSpec,
        surface: (f32, f32),
        raster_timeout: Duration,
    ) -> Self {
        Self {
            pages: Vec::new(),
            staged: None,
            transition: None,
            transition_spec,
            capacity,
            surface,
            raster_timeout,
        }
    }

    pub fn depth(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn top(&self) -> Option<&Page> {
        self.pages.last()
    }

    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Visible layers bottom-to-top, each with its page's transition offset.
    /// This order is the declaration order every consumer (compositor slot
    /// assignment, hit-test tie-breaks) keys on.
    pub fn visible_layers(&self) -> impl Iterator<Item = (Vec2, &Layer)> {
        self.pages
            .iter()
            .flat_map(|page| page.layers.iter().map(move |layer| (page.offset, layer)))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.pages
            .iter()
            .flat_map(|p| p.layers.iter())
            .find(|l| l.id() == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.layers.iter_mut())
            .find(|l| l.id() == id)
    }

    /// Stage a new page. It renders off-stack and becomes visible on a later
    /// [`PageStack::pump`]; unless `immediate` (or the stack was empty), a
    /// forward slide runs against the previous top. `on_done` fires once the
    /// page is fully visible.
    pub fn push(
        &mut self,
        view: ViewFn,
        tag: Option<String>,
        snapshot: &Snapshot,
        opts: PushOptions,
        rasterizer: &dyn Rasterizer,
        now: Instant,
        on_done: Option<DoneCallback>,
    ) -> Result<(), StackError> {
        let staged_pushes = matches!(
            self.staged,
            Some(Staged {
                mode: StagedMode::Push { .. },
                ..
            })
        ) as usize;
        if self.pages.len() + staged_pushes >= self.capacity {
            let err = StackError::CapacityExceeded {
                depth: self.pages.len(),
                capacity: self.capacity,
            };
            log::warn!("push rejected: {err}");
            return Err(err);
        }

        if opts.immediate {
            self.cancel_transition();
        }
        self.stage(
            view,
            tag,
            snapshot,
            StagedMode::Push {
                immediate: opts.immediate,
            },
            rasterizer,
            now,
            on_done,
        );
        Ok(())
    }

    /// Pop the top page. No-op (beyond the callback) when one or zero pages
    /// remain. The page is removed only once the backward slide completes;
    /// `immediate` snaps.
    pub fn pop(&mut self, opts: PopOptions, now: Instant, on_done: Option<DoneCallback>) {
        if self.pages.len() <= 1 {
            log::debug!("pop on a stack of {} pages: no-op", self.pages.len());
            if let Some(cb) = on_done {
                cb();
            }
            return;
        }

        self.cancel_transition();
        if opts.immediate {
            self.pages.pop();
            if let Some(top) = self.pages.last_mut() {
                top.offset = Vec2::ZERO;
            }
            if let Some(cb) = on_done {
                cb();
            }
        } else {
            self.start_transition(Transition::backward(now, self.transition_spec, on_done));
        }
    }

    /// Replace the top page: a pop immediately followed by an immediate push,
    /// applied as one step once the replacement has rendered. No slide.
    pub fn replace(
        &mut self,
        view: ViewFn,
        tag: Option<String>,
        snapshot: &Snapshot,
        rasterizer: &dyn Rasterizer,
        now: Instant,
        on_done: Option<DoneCallback>,
    ) {
        self.stage(
            view,
            tag,
            snapshot,
            StagedMode::Replace,
            rasterizer,
            now,
            on_done,
        );
    }

    fn stage(
        &mut self,
        view: ViewFn,
        tag: Option<String>,
        snapshot: &Snapshot,
        mode: StagedMode,
        rasterizer: &dyn Rasterizer,
        now: Instant,
        on_done: Option<DoneCallback>,
    ) {
        if let Some(mut old) = self.staged.take() {
            // Last writer wins; the dropped request's callback still fires.
            log::debug!("staged page superseded before it became visible");
            if let Some(cb) = old.on_done.take() {
                cb();
            }
        }

        let mut page = Page::new(view, tag, self.surface, self.raster_timeout);
        page.update(snapshot, rasterizer, now, Box::new(|_| {}));
        self.staged = Some(Staged {
            page,
            mode,
            on_done,
        });
    }

    /// Route a data update to every page carrying `tag`.
    pub fn update_pages(
        &mut self,
        tag: &str,
        snapshot: &Snapshot,
        rasterizer: &dyn Rasterizer,
        now: Instant,
    ) {
        for page in &mut self.pages {
            if page.tag() == Some(tag) {
                page.update(snapshot, rasterizer, now, Box::new(|_| {}));
            }
        }
        if let Some(staged) = &mut self.staged
            && staged.page.tag() == Some(tag)
        {
            staged.page.update(snapshot, rasterizer, now, Box::new(|_| {}));
        }
    }

    /// Per-frame poll: drive page renders and activate a staged page whose
    /// layer set is complete.
    pub fn pump(&mut self, rasterizer: &dyn Rasterizer, now: Instant) {
        for page in &mut self.pages {
            page.pump(rasterizer, now);
        }

        let staged_ready = if let Some(staged) = &mut self.staged {
            staged.page.pump(rasterizer, now);
            !staged.page.is_rendering()
        } else {
            false
        };
        if staged_ready
            && let Some(staged) = self.staged.take()
        {
            self.activate(staged, now);
        }
    }

    fn activate(&mut self, staged: Staged, now: Instant) {
        let Staged {
            mut page,
            mode,
            on_done,
        } = staged;
        match mode {
            StagedMode::Replace => {
                self.cancel_transition();
                if !self.pages.is_empty() {
                    self.pages.pop();
                }
                page.offset = Vec2::ZERO;
                self.pages.push(page);
                if let Some(cb) = on_done {
                    cb();
                }
            }
            StagedMode::Push { immediate } => {
                self.cancel_transition();
                let slide = !immediate && !self.pages.is_empty();
                page.offset = if slide {
                    Vec2::new(1.0, 0.0)
                } else {
                    Vec2::ZERO
                };
                self.pages.push(page);
                if slide {
                    self.start_transition(Transition::forward(now, self.transition_spec, on_done));
                } else if let Some(cb) = on_done {
                    cb();
                }
            }
        }
    }

    fn start_transition(&mut self, t: Transition) {
        self.cancel_transition();
        log::debug!("transition start: {:?}", t.dir);
        self.apply_offsets(t.below.start, t.top.start);
        self.transition = Some(t);
    }

    /// Snap the in-flight transition to its end state. The completion
    /// callback fires exactly once, cancelled or not.
    pub fn cancel_transition(&mut self) {
        if let Some(t) = self.transition.take() {
            log::debug!("transition cancelled: {:?}", t.dir);
            self.finish_transition(t);
        }
    }

    /// Advance the in-flight transition by wall-clock sampling. Progress is
    /// `elapsed / duration` clamped to [0, 1]; a paused frame loop therefore
    /// pauses the slide without accumulating drift.
    pub fn tick(&mut self, now: Instant) {
        let (started, spec, below, top) = match &self.transition {
            Some(t) => (t.started, t.spec, t.below, t.top),
            None => return,
        };
        let p = if spec.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(started).as_secs_f32() / spec.duration.as_secs_f32())
                .clamp(0.0, 1.0)
        };
        let eased = spec.easing.interpolate(p);
        self.apply_offsets(
            crate::animation::lerp(below.start, below.end, eased),
            crate::animation::lerp(top.start, top.end, eased),
        );

        if p >= 1.0
            && let Some(t) = self.transition.take()
        {
            self.finish_transition(t);
        }
    }

    fn finish_transition(&mut self, mut t: Transition) {
        self.apply_offsets(t.below.end, t.top.end);
        if t.pop_on_complete {
            self.pages.pop();
        }
        if let Some(top) = self.pages.last_mut() {
            top.offset = Vec2::ZERO;
        }
        if let Some(cb) = t.on_complete.take() {
            cb();
        }
    }

    /// Offsets apply to the two topmost pages; deeper pages are parked
    /// off-screen by the slides that buried them.
    fn apply_offsets(&mut self, below: f32, top: f32) {
        let n = self.pages.len();
        if n >= 2 {
            self.pages[n - 2].offset = Vec2::new(below, 0.0);
        }
        if n >= 1 {
            self.pages[n - 1].offset = Vec2::new(top, 0.0);
        }
    }
}
