use std::rc::Rc;

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::animation::TransitionSpec;
use crate::atlas::TextureAtlas;
use crate::error::{AtlasError, StackError};
use crate::geometry::SurfaceMetrics;
use crate::layer::{Layer, LayerId};
use crate::page::{Snapshot, ViewFn};
use crate::raster::Rasterizer;
use crate::stack::{DoneCallback, PageStack, PopOptions, PushOptions};

/// Panel configuration; serializable so hosts can keep it in their world
/// settings files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UiConfig {
    /// Layout resolution the rasterizer renders at.
    pub width: u32,
    pub height: u32,
    /// The quad's extent in scene units.
    pub world_width: f32,
    pub world_height: f32,
    /// Half-thickness of pickable layer volumes.
    pub world_depth: f32,
    pub stack_capacity: usize,
    pub transition: TransitionSpec,
    pub raster_timeout: Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        let width = 2 * 1024;
        let height = (width as f32 / 1.5) as u32;
        let world_width = 2.0;
        Self {
            width,
            height,
            world_width,
            world_height: world_width / 1.5,
            world_depth: world_width / 50.0,
            stack_capacity: crate::stack::DEFAULT_STACK_CAPACITY,
            transition: TransitionSpec::default(),
            raster_timeout: Duration::from_secs(10),
        }
    }
}

/// One panel surface: metrics, rasterizer handle, page stack, and the slot
/// table the render backend reads. Instantiate one per surface — there are no
/// module-level singletons, and two `Ui` values never share state.
pub struct Ui {
    metrics: SurfaceMetrics,
    rasterizer: Rc<dyn Rasterizer>,
    stack: PageStack,
    atlas: TextureAtlas,
}

impl Ui {
    pub fn new(config: UiConfig, rasterizer: Rc<dyn Rasterizer>) -> Self {
        let metrics = SurfaceMetrics {
            width: config.width as f32,
            height: config.height as f32,
            world_width: config.world_width,
            world_height: config.world_height,
            world_depth: config.world_depth,
        };
        let stack = PageStack::new(
            config.stack_capacity,
            config.transition,
            (metrics.width, metrics.height),
            config.raster_timeout,
        );
        Self {
            metrics,
            rasterizer,
            stack,
            atlas: TextureAtlas::new(),
        }
    }

    pub fn metrics(&self) -> &SurfaceMetrics {
        &self.metrics
    }

    pub fn stack(&self) -> &PageStack {
        &self.stack
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut TextureAtlas {
        &mut self.atlas
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.stack.layer(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.stack.layer_mut(id)
    }

    pub fn push_page(
        &mut self,
        view: ViewFn,
        tag: Option<String>,
        snapshot: &Snapshot,
        opts: PushOptions,
        now: Instant,
        on_done: Option<DoneCallback>,
    ) -> Result<(), StackError> {
        self.stack.push(
            view,
            tag,
            snapshot,
            opts,
            self.rasterizer.as_ref(),
            now,
            on_done,
        )
    }

    pub fn pop_page(&mut self, opts: PopOptions, now: Instant, on_done: Option<DoneCallback>) {
        self.stack.pop(opts, now, on_done);
    }

    pub fn replace_page(
        &mut self,
        view: ViewFn,
        tag: Option<String>,
        snapshot: &Snapshot,
        now: Instant,
        on_done: Option<DoneCallback>,
    ) {
        self.stack
            .replace(view, tag, snapshot, self.rasterizer.as_ref(), now, on_done);
    }

    /// Snap an in-flight slide to its end state.
    pub fn cancel_transition(&mut self) {
        self.stack.cancel_transition();
    }

    /// Route a data change to every page carrying `tag`. Unchanged snapshots
    /// are free: the page's idempotence check short-circuits them.
    pub fn update_pages(&mut self, tag: &str, snapshot: &Snapshot, now: Instant) {
        self.stack
            .update_pages(tag, snapshot, self.rasterizer.as_ref(), now);
    }

    /// The per-frame driver: poll rasterizations, advance the slide, refresh
    /// the slot table. `now` feeds transitions and timeouts; `world_time`
    /// selects animation frames.
    pub fn frame(&mut self, now: Instant, world_time: Duration) -> Result<(), AtlasError> {
        self.stack.pump(self.rasterizer.as_ref(), now);
        self.stack.tick(now);
        self.atlas.refresh(&self.stack, &self.metrics, world_time)
    }
}
