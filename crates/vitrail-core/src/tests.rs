#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use serde_json::json;
    use web_time::{Duration, Instant};

    use crate::error::{AtlasError, StackError};
    use crate::layer::{Anchor, Bitmap, Layer, LayerSpec};
    use crate::page::{Page, RenderOutcome, Snapshot, ViewFn};
    use crate::raster::{JobId, RasterFrame, RasterStatus, Rasterizer};
    use crate::stack::{PopOptions, PushOptions};
    use crate::ui::{Ui, UiConfig};
    use crate::{EventQueue, Rect, Vec2};

    fn bitmap(w: u32, h: u32) -> Bitmap {
        Bitmap::new(w, h, vec![0u8; (w * h * 4) as usize])
    }

    /// Jobs stay pending until the test resolves them explicitly.
    #[derive(Default)]
    struct StubRasterizer {
        inner: RefCell<StubInner>,
    }

    #[derive(Default)]
    struct StubInner {
        next: u64,
        submitted: Vec<(JobId, String, u32, u32)>,
        results: HashMap<JobId, RasterStatus>,
    }

    impl StubRasterizer {
        fn submit_count(&self) -> usize {
            self.inner.borrow().submitted.len()
        }

        fn complete_all(&self) {
            let mut inner = self.inner.borrow_mut();
            let jobs: Vec<_> = inner.submitted.clone();
            for (job, _, w, h) in jobs {
                inner.results.insert(
                    job,
                    RasterStatus::Ready(RasterFrame {
                        bitmap: bitmap(w, h),
                        content_height: h,
                        anchors: vec![],
                    }),
                );
            }
        }

        fn complete_where(&self, f: impl Fn(&str) -> Option<RasterFrame>) {
            let mut inner = self.inner.borrow_mut();
            let jobs: Vec<_> = inner.submitted.clone();
            for (job, markup, _, _) in jobs {
                if let Some(frame) = f(&markup) {
                    inner.results.insert(job, RasterStatus::Ready(frame));
                }
            }
        }

        fn fail_all(&self) {
            let mut inner = self.inner.borrow_mut();
            let jobs: Vec<_> = inner.submitted.iter().map(|(j, ..)| *j).collect();
            for job in jobs {
                inner.results.insert(
                    job,
                    RasterStatus::Failed(crate::error::RasterError::Render("boom".into())),
                );
            }
        }
    }

    impl Rasterizer for StubRasterizer {
        fn submit(&self, markup: &str, width: u32, height: u32) -> JobId {
            let mut inner = self.inner.borrow_mut();
            inner.next += 1;
            let job = JobId(inner.next);
            inner.submitted.push((job, markup.to_string(), width, height));
            job
        }

        fn poll(&self, job: JobId) -> RasterStatus {
            self.inner
                .borrow()
                .results
                .get(&job)
                .cloned()
                .unwrap_or(RasterStatus::Pending)
        }
    }

    fn config() -> UiConfig {
        UiConfig {
            width: 200,
            height: 100,
            world_width: 2.0,
            world_height: 1.0,
            world_depth: 0.04,
            raster_timeout: Duration::from_secs(10),
            ..UiConfig::default()
        }
    }

    fn markup_view() -> ViewFn {
        Rc::new(|snap: &Snapshot| vec![LayerSpec::markup(format!("menu {snap}"))])
    }

    fn image_view() -> ViewFn {
        Rc::new(|_: &Snapshot| {
            vec![LayerSpec::Image {
                frames: vec![bitmap(200, 100)],
                x: 0.0,
                y: 0.0,
                w: None,
                h: None,
                frame_duration: Duration::ZERO,
                pixelated: false,
            }]
        })
    }

    fn record(log: &Rc<RefCell<Vec<RenderOutcome>>>) -> crate::page::UpdateCallback {
        let log = log.clone();
        Box::new(move |o| log.borrow_mut().push(o))
    }

    #[test]
    fn page_update_is_idempotent() {
        let raster = StubRasterizer::default();
        let log = Rc::new(RefCell::new(vec![]));
        let now = Instant::now();
        let mut page = Page::new(markup_view(), None, (200.0, 100.0), Duration::from_secs(10));

        page.update(&json!({"count": 1}), &raster, now, record(&log));
        assert_eq!(raster.submit_count(), 1);

        raster.complete_all();
        page.pump(&raster, now);
        assert_eq!(page.layers().len(), 1);
        assert_eq!(log.borrow().as_slice(), &[RenderOutcome::Rendered]);

        // Structurally equal snapshot: no new rasterization, synchronous done.
        page.update(&json!({"count": 1}), &raster, now, record(&log));
        assert_eq!(raster.submit_count(), 1);
        assert_eq!(
            log.borrow().as_slice(),
            &[RenderOutcome::Rendered, RenderOutcome::Unchanged]
        );
    }

    #[test]
    fn page_swaps_layer_set_atomically() {
        let raster = StubRasterizer::default();
        let log: Rc<RefCell<Vec<RenderOutcome>>> = Rc::new(RefCell::new(vec![]));
        let now = Instant::now();
        let view: ViewFn = Rc::new(|_| {
            vec![
                LayerSpec::markup("first"),
                LayerSpec::markup("second"),
            ]
        });
        let mut page = Page::new(view, None, (200.0, 100.0), Duration::from_secs(10));
        page.update(&json!(1), &raster, now, record(&log));

        // Only one of the two rasterizations has finished: nothing visible.
        raster.complete_where(|markup| {
            (markup == "first").then(|| RasterFrame {
                bitmap: bitmap(200, 100),
                content_height: 100,
                anchors: vec![],
            })
        });
        page.pump(&raster, now);
        assert!(page.layers().is_empty());
        assert!(page.is_rendering());

        raster.complete_all();
        page.pump(&raster, now);
        assert_eq!(page.layers().len(), 2);
    }

    #[test]
    fn newer_update_supersedes_in_flight_render() {
        let raster = StubRasterizer::default();
        let log = Rc::new(RefCell::new(vec![]));
        let now = Instant::now();
        let mut page = Page::new(markup_view(), None, (200.0, 100.0), Duration::from_secs(10));

        page.update(&json!({"v": 1}), &raster, now, record(&log));
        page.update(&json!({"v": 2}), &raster, now, record(&log));
        assert_eq!(log.borrow().as_slice(), &[RenderOutcome::Superseded]);

        // Resolving the stale job must not make its layers visible.
        raster.complete_where(|markup| {
            markup.contains("\"v\":1").then(|| RasterFrame {
                bitmap: bitmap(200, 100),
                content_height: 100,
                anchors: vec![],
            })
        });
        page.pump(&raster, now);
        assert!(page.layers().is_empty());

        raster.complete_all();
        page.pump(&raster, now);
        assert_eq!(page.layers().len(), 1);
        assert_eq!(
            log.borrow().as_slice(),
            &[RenderOutcome::Superseded, RenderOutcome::Rendered]
        );
    }

    #[test]
    fn raster_failure_completes_and_keeps_old_layers() {
        let raster = StubRasterizer::default();
        let log = Rc::new(RefCell::new(vec![]));
        let now = Instant::now();
        let mut page = Page::new(markup_view(), None, (200.0, 100.0), Duration::from_secs(10));

        page.update(&json!(1), &raster, now, record(&log));
        raster.complete_all();
        page.pump(&raster, now);
        let kept = page.layers()[0].id();

        page.update(&json!(2), &raster, now, record(&log));
        raster.fail_all();
        page.pump(&raster, now);
        assert_eq!(page.layers().len(), 1);
        assert_eq!(page.layers()[0].id(), kept);
        assert_eq!(log.borrow().last(), Some(&RenderOutcome::Failed));
    }

    #[test]
    fn raster_timeout_completes_with_failure() {
        let raster = StubRasterizer::default();
        let log = Rc::new(RefCell::new(vec![]));
        let now = Instant::now();
        let mut page = Page::new(markup_view(), None, (200.0, 100.0), Duration::from_secs(5));

        page.update(&json!(1), &raster, now, record(&log));
        page.pump(&raster, now + Duration::from_secs(4));
        assert!(page.is_rendering());

        page.pump(&raster, now + Duration::from_secs(6));
        assert!(!page.is_rendering());
        assert_eq!(log.borrow().as_slice(), &[RenderOutcome::Failed]);
    }

    #[test]
    fn push_slides_and_completes_exactly_once() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster.clone());
        let t0 = Instant::now();

        ui.push_page(image_view(), None, &json!("home"), PushOptions::default(), t0, None)
            .unwrap();
        ui.frame(t0, Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 1);
        assert_eq!(ui.stack().pages()[0].offset, Vec2::ZERO);

        let done = Rc::new(RefCell::new(0));
        let done2 = done.clone();
        ui.push_page(
            image_view(),
            None,
            &json!("detail"),
            PushOptions::default(),
            t0,
            Some(Box::new(move || *done2.borrow_mut() += 1)),
        )
        .unwrap();
        ui.frame(t0, Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 2);
        assert!(ui.stack().in_transition());
        assert_eq!(ui.stack().pages()[1].offset.x, 1.0);

        ui.frame(t0 + Duration::from_millis(500), Duration::ZERO).unwrap();
        let mid = ui.stack().pages()[1].offset.x;
        assert!(mid > 0.0 && mid < 1.0, "mid-slide offset was {mid}");

        ui.frame(t0 + Duration::from_millis(1100), Duration::ZERO).unwrap();
        assert!(!ui.stack().in_transition());
        assert_eq!(ui.stack().pages()[1].offset, Vec2::ZERO);
        assert_eq!(ui.stack().pages()[0].offset.x, -1.0);
        assert_eq!(*done.borrow(), 1);

        // A later frame must not re-fire the callback.
        ui.frame(t0 + Duration::from_millis(2000), Duration::ZERO).unwrap();
        assert_eq!(*done.borrow(), 1);
    }

    #[test]
    fn pop_removes_page_after_slide() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        for name in ["a", "b"] {
            ui.push_page(
                image_view(),
                None,
                &json!(name),
                PushOptions { immediate: true },
                t0,
                None,
            )
            .unwrap();
            ui.frame(t0, Duration::ZERO).unwrap();
        }
        assert_eq!(ui.stack().depth(), 2);

        ui.pop_page(PopOptions::default(), t0, None);
        ui.frame(t0 + Duration::from_millis(200), Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 2, "page leaves only at completion");

        ui.frame(t0 + Duration::from_millis(1200), Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 1);
        assert_eq!(ui.stack().pages()[0].offset, Vec2::ZERO);
    }

    #[test]
    fn pop_on_last_page_is_a_noop() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        ui.push_page(
            image_view(),
            None,
            &json!("only"),
            PushOptions { immediate: true },
            t0,
            None,
        )
        .unwrap();
        ui.frame(t0, Duration::ZERO).unwrap();

        let called = Rc::new(RefCell::new(false));
        let called2 = called.clone();
        ui.pop_page(
            PopOptions::default(),
            t0,
            Some(Box::new(move || *called2.borrow_mut() = true)),
        );
        ui.frame(t0 + Duration::from_millis(1200), Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 1);
        assert!(*called.borrow());
    }

    #[test]
    fn push_during_pop_cancels_then_pushes() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        for name in ["a", "b"] {
            ui.push_page(
                image_view(),
                Some(name.to_string()),
                &json!(name),
                PushOptions { immediate: true },
                t0,
                None,
            )
            .unwrap();
            ui.frame(t0, Duration::ZERO).unwrap();
        }

        let pop_done = Rc::new(RefCell::new(0));
        let pd = pop_done.clone();
        ui.pop_page(
            PopOptions::default(),
            t0,
            Some(Box::new(move || *pd.borrow_mut() += 1)),
        );
        // Halfway through the pop slide, a push arrives.
        let mid = t0 + Duration::from_millis(500);
        ui.frame(mid, Duration::ZERO).unwrap();
        assert!(ui.stack().in_transition());

        ui.push_page(
            image_view(),
            Some("c".to_string()),
            &json!("c"),
            PushOptions::default(),
            mid,
            None,
        )
        .unwrap();
        ui.frame(mid, Duration::ZERO).unwrap();

        // The pop finalized (callback fired, "b" gone) before the push slid in.
        assert_eq!(*pop_done.borrow(), 1);
        assert_eq!(ui.stack().depth(), 2);
        assert_eq!(ui.stack().pages()[0].tag(), Some("a"));
        assert_eq!(ui.stack().pages()[1].tag(), Some("c"));
        assert!(ui.stack().in_transition());

        ui.frame(mid + Duration::from_millis(1100), Duration::ZERO).unwrap();
        assert!(!ui.stack().in_transition());
        assert_eq!(ui.stack().pages()[1].offset, Vec2::ZERO);
    }

    #[test]
    fn replace_is_atomic_and_unanimated() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        for name in ["a", "b"] {
            ui.push_page(
                image_view(),
                Some(name.to_string()),
                &json!(name),
                PushOptions { immediate: true },
                t0,
                None,
            )
            .unwrap();
            ui.frame(t0, Duration::ZERO).unwrap();
        }

        ui.replace_page(image_view(), Some("b2".to_string()), &json!("b2"), t0, None);
        ui.frame(t0, Duration::ZERO).unwrap();
        assert_eq!(ui.stack().depth(), 2);
        assert_eq!(ui.stack().pages()[1].tag(), Some("b2"));
        assert!(!ui.stack().in_transition());
    }

    #[test]
    fn push_beyond_capacity_is_rejected() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        for i in 0..3 {
            ui.push_page(
                image_view(),
                None,
                &json!(i),
                PushOptions { immediate: true },
                t0,
                None,
            )
            .unwrap();
            ui.frame(t0, Duration::ZERO).unwrap();
        }
        let err = ui
            .push_page(image_view(), None, &json!(3), PushOptions::default(), t0, None)
            .unwrap_err();
        assert!(matches!(err, StackError::CapacityExceeded { depth: 3, capacity: 3 }));
        assert_eq!(ui.stack().depth(), 3);
    }

    #[test]
    fn update_pages_routes_by_tag() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster.clone());
        let t0 = Instant::now();
        for tag in ["status", "config"] {
            ui.push_page(
                markup_view(),
                Some(tag.to_string()),
                &json!(tag),
                PushOptions { immediate: true },
                t0,
                None,
            )
            .unwrap();
            raster.complete_all();
            ui.frame(t0, Duration::ZERO).unwrap();
        }
        let before = raster.submit_count();

        ui.update_pages("config", &json!({"volume": 7}), t0);
        assert_eq!(raster.submit_count(), before + 1);

        // Same snapshot again: idempotent, no extra rasterization.
        ui.update_pages("config", &json!({"volume": 7}), t0);
        assert_eq!(raster.submit_count(), before + 1);
    }

    #[test]
    fn atlas_maps_layers_in_declaration_order() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        let view: ViewFn = Rc::new(|_| {
            vec![LayerSpec::Image {
                frames: vec![bitmap(100, 50)],
                x: 50.0,
                y: 25.0,
                w: Some(100.0),
                h: Some(50.0),
                frame_duration: Duration::ZERO,
                pixelated: false,
            }]
        });
        ui.push_page(view, None, &json!(0), PushOptions { immediate: true }, t0, None)
            .unwrap();
        ui.frame(t0, Duration::ZERO).unwrap();

        let uniforms = ui.atlas().uniforms();
        assert!(uniforms[0].active);
        assert_eq!(uniforms[0].position, [0.25, 0.25]);
        assert_eq!(uniforms[0].size, [0.5, 0.5]);
        assert!(!uniforms[1].active);

        let uploads = ui.atlas().pending_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].slot, 0);
        let id = uploads[0].bitmap.id();
        ui.atlas_mut().mark_uploaded(0, id);
        assert!(ui.atlas().pending_uploads().is_empty());
    }

    #[test]
    fn atlas_rejects_layers_beyond_capacity() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        let view: ViewFn = Rc::new(|_| {
            (0..17)
                .map(|i| LayerSpec::Image {
                    frames: vec![bitmap(10, 10)],
                    x: i as f32,
                    y: 0.0,
                    w: Some(10.0),
                    h: Some(10.0),
                    frame_duration: Duration::ZERO,
                    pixelated: false,
                })
                .collect()
        });
        ui.push_page(view, None, &json!(0), PushOptions { immediate: true }, t0, None)
            .unwrap();
        let err = ui.frame(t0, Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            AtlasError::CapacityExceeded { visible: 17, max: 16 }
        ));
        // The first sixteen still mapped deterministically.
        assert!(ui.atlas().uniforms()[15].active);
    }

    #[test]
    fn animated_layers_take_turns_in_their_slot() {
        let raster = Rc::new(StubRasterizer::default());
        let mut ui = Ui::new(config(), raster);
        let t0 = Instant::now();
        let view: ViewFn = Rc::new(|_| {
            vec![LayerSpec::Image {
                frames: vec![bitmap(10, 10), bitmap(10, 10), bitmap(10, 10)],
                x: 0.0,
                y: 0.0,
                w: Some(10.0),
                h: Some(10.0),
                frame_duration: Duration::from_millis(100),
                pixelated: true,
            }]
        });
        ui.push_page(view, None, &json!(0), PushOptions { immediate: true }, t0, None)
            .unwrap();

        ui.frame(t0, Duration::from_millis(0)).unwrap();
        let u = ui.atlas().uniforms();
        assert!(u[0].active && !u[1].active && !u[2].active);

        ui.frame(t0, Duration::from_millis(150)).unwrap();
        let u = ui.atlas().uniforms();
        assert!(!u[0].active && u[1].active && !u[2].active);

        // The cycle wraps.
        ui.frame(t0, Duration::from_millis(320)).unwrap();
        let u = ui.atlas().uniforms();
        assert!(u[0].active && !u[1].active && !u[2].active);
    }

    #[test]
    fn scroll_offset_saturates_at_both_ends() {
        let mut layer = Layer::new(Rc::new(bitmap(10, 10)), 0.0, 0.0, 400.0, 400.0);
        layer.scroll_height = 1000.0;
        layer.scrollable = true;

        layer.scroll_to(300.0);
        assert_eq!(layer.scroll_top(), 300.0);

        layer.scroll_to(300.0 + 1000.0);
        assert_eq!(layer.scroll_top(), 600.0);

        layer.scroll_to(-50.0);
        assert_eq!(layer.scroll_top(), 0.0);
    }

    #[test]
    fn anchor_rects_clamp_to_their_layer() {
        let m = crate::SurfaceMetrics {
            width: 200.0,
            height: 100.0,
            world_width: 2.0,
            world_height: 1.0,
            world_depth: 0.04,
        };
        let mut layer = Layer::new(Rc::new(bitmap(10, 10)), 20.0, 10.0, 100.0, 50.0);
        layer.anchors.push(Anchor::click(
            Rect::new(90.0, 0.0, 40.0, 20.0),
            "overflowing",
        ));
        let r = layer.anchor_rect(&layer.anchors[0], Vec2::ZERO, &m);
        // Clipped at the layer's right edge (20 + 100).
        assert_eq!(r.x, 110.0);
        assert_eq!(r.right(), 120.0);
    }

    #[test]
    fn event_queue_is_bounded() {
        let mut q = EventQueue::new(2);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(!q.push(3));
        assert_eq!(q.drain().collect::<Vec<_>>(), vec![1, 2]);
        assert!(q.is_empty());
    }
}
