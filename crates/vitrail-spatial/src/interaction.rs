use vitrail_core::{
    ActionEvent, EventQueue, Hand, InputEvent, InputKind, SurfacePose, Ui,
};

use crate::drag::{ScrollDrag, ScrollUpdate};
use crate::hover::{HoverMarkers, HoverState};
use crate::tester::{ControllerPose, hit_test};

const EVENT_QUEUE_CAPACITY: usize = 64;

/// Per-surface interaction pass: one hover state and one marker set per
/// hand, plus the bounded input queue drained once per frame.
///
/// Owned by the caller alongside its [`Ui`] — instantiate one per surface,
/// never share across surfaces.
pub struct Interaction {
    hover: [HoverState; 2],
    markers: [HoverMarkers; 2],
    events: EventQueue<InputEvent>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            hover: [HoverState::default(), HoverState::default()],
            markers: [HoverMarkers::default(), HoverMarkers::default()],
            events: EventQueue::new(EVENT_QUEUE_CAPACITY),
        }
    }

    /// Queue a trigger event for the next frame. Returns `false` when the
    /// queue is full and the event was dropped.
    pub fn push_event(&mut self, event: InputEvent) -> bool {
        self.events.push(event)
    }

    pub fn hover(&self, hand: Hand) -> &HoverState {
        &self.hover[hand.index()]
    }

    pub fn markers(&self, hand: Hand) -> &HoverMarkers {
        &self.markers[hand.index()]
    }

    /// One interaction pass, synchronous within the frame callback:
    /// hit-test every tracked controller (untracked ones release any drag at
    /// the last known coordinate), drain the input queue, advance the drag
    /// state machines, apply scroll writes, and emit the activated actions.
    pub fn frame(
        &mut self,
        ui: &mut Ui,
        pose: &SurfacePose,
        controllers: [Option<ControllerPose>; 2],
    ) -> Vec<ActionEvent> {
        let metrics = *ui.metrics();
        let mut actions = Vec::new();
        let mut scrolls: Vec<ScrollUpdate> = Vec::new();

        for hand in Hand::ALL {
            let i = hand.index();
            match &controllers[i] {
                Some(controller) => {
                    hit_test(
                        pose,
                        &metrics,
                        ui.stack(),
                        controller,
                        &mut self.hover[i],
                        &mut self.markers[i],
                    );
                    if self.hover[i].drag.is_some()
                        && let Some(update) = ScrollDrag::update(&mut self.hover[i], pose, &metrics)
                    {
                        scrolls.push(update);
                    }
                }
                None => {
                    if let Some(update) = ScrollDrag::cancel(&mut self.hover[i], &metrics) {
                        scrolls.push(update);
                    }
                    self.hover[i].clear_hover();
                    self.markers[i] = HoverMarkers::default();
                }
            }
        }

        let events: Vec<InputEvent> = self.events.drain().collect();
        for event in events {
            let i = event.hand.index();
            match event.kind {
                InputKind::Press => {
                    if let Some(hit) = &self.hover[i].anchor
                        && let Some(action) = &hit.on_press
                    {
                        actions.push(ActionEvent {
                            hand: event.hand,
                            action: action.clone(),
                            value: self.hover[i].value,
                        });
                    }
                    ScrollDrag::press(&mut self.hover[i], pose, &metrics, ui.stack());
                }
                InputKind::Release => {
                    if let Some(update) = ScrollDrag::release(&mut self.hover[i], pose, &metrics) {
                        scrolls.push(update);
                    }
                    if let Some(hit) = &self.hover[i].anchor
                        && let Some(action) = &hit.on_release
                    {
                        actions.push(ActionEvent {
                            hand: event.hand,
                            action: action.clone(),
                            value: self.hover[i].value,
                        });
                    }
                }
                InputKind::Click => {
                    if let Some(hit) = &self.hover[i].anchor
                        && let Some(action) = &hit.on_click
                    {
                        actions.push(ActionEvent {
                            hand: event.hand,
                            action: action.clone(),
                            value: self.hover[i].value,
                        });
                    }
                }
            }
        }

        for update in scrolls {
            match ui.layer_mut(update.layer) {
                Some(layer) => layer.scroll_to(update.scroll_top),
                None => log::debug!("scroll target {:?} no longer exists", update.layer),
            }
        }

        actions
    }
}
