//! Viewer lifecycle
//!
//! A viewer shows one layer per scope key. When the key changes a new layer
//! is created and the previous one either leaves (`keep >= 1`) or is removed
//! at once (`keep == 0`). A leaving layer is removed on its completion
//! signal or when the exit timeout elapses, whichever comes first.
//!
//! The first layer a viewer mounts is shown settled unless the appear
//! transition is enabled, in which case it starts `appearing` and waits for
//! its completion signal like any entering layer.
//!
//! ```text
//! appearing ─┐
//!            ├─▶ settled        leaving ─▶ removed
//! entering ──┘
//! ```
//!
//! Every layer carries a generation. Completion signals name a key and a
//! generation; a signal for a generation that no longer exists is ignored.

use router_state::Direction;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Default exit timeout ceiling
pub const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Lifecycle state of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// First layer a viewer mounts, transitioning in when appear is enabled
    Appearing,
    /// Replacement layer, transitioning in
    Entering,
    /// Fully shown
    Settled,
    /// Transitioning out
    Leaving,
    /// Destroyed
    Removed,
}

impl Lifecycle {
    /// Layer shows current content
    pub fn is_current(self) -> bool {
        matches!(
            self,
            Lifecycle::Appearing | Lifecycle::Entering | Lifecycle::Settled
        )
    }

    /// Layer is mid-transition
    pub fn is_transitioning(self) -> bool {
        matches!(
            self,
            Lifecycle::Appearing | Lifecycle::Entering | Lifecycle::Leaving
        )
    }
}

/// What a viewer is told on every render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerInput {
    /// Scope key of the level, `None` when out of scope
    pub scope_key: Option<String>,
    /// Direction of the navigation that caused this render
    pub direction: Direction,
    /// Previous layers to retain during a transition
    pub keep: usize,
}

impl ViewerInput {
    /// Create an input
    pub fn new(scope_key: Option<String>, direction: Direction, keep: usize) -> Self {
        Self {
            scope_key,
            direction,
            keep,
        }
    }
}

/// "Transition complete" signal from the presentation medium
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionSignal {
    /// Scope key of the layer
    pub key: String,
    /// Generation of the layer
    pub generation: u64,
}

/// One rendered content instance
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<C> {
    /// Scope key the layer was created for
    pub key: String,
    /// Generation token, unique per viewer
    pub generation: u64,
    /// Lifecycle state
    pub lifecycle: Lifecycle,
    /// Direction of the transition the layer is part of
    pub direction: Direction,
    /// Rendered content
    pub content: C,
    /// Removal deadline while leaving
    pub deadline: Option<Instant>,
}

impl<C> Layer<C> {
    /// Signal that completes this layer's current transition
    pub fn signal(&self) -> CompletionSignal {
        CompletionSignal {
            key: self.key.clone(),
            generation: self.generation,
        }
    }

    fn into_removed(mut self) -> Self {
        self.lifecycle = Lifecycle::Removed;
        self.deadline = None;
        self
    }
}

/// Presentation layer driven by scope changes
pub trait Viewer<C> {
    /// Render for a new input
    ///
    /// `render` produces the current content. Returns the layers removed
    /// immediately.
    fn update(
        &mut self,
        input: ViewerInput,
        render: &mut dyn FnMut() -> C,
        now: Instant,
    ) -> Vec<Layer<C>>;

    /// Apply a completion signal
    ///
    /// Returns the layer's new lifecycle, or `None` if the signal was stale
    /// or had nothing to complete.
    fn complete(&mut self, signal: &CompletionSignal) -> Option<Lifecycle>;

    /// Remove leaving layers whose deadline has passed
    fn tick(&mut self, now: Instant) -> Vec<Layer<C>>;

    /// Live layers, oldest first
    fn layers(&self) -> &[Layer<C>];

    /// Layer showing current content
    fn current(&self) -> Option<&Layer<C>> {
        self.layers()
            .iter()
            .find(|layer| layer.lifecycle.is_current())
    }

    /// Some layer is entering or leaving
    fn is_changing(&self) -> bool {
        self.layers()
            .iter()
            .any(|layer| layer.lifecycle.is_transitioning())
    }

    /// Earliest pending removal deadline
    fn next_deadline(&self) -> Option<Instant> {
        self.layers().iter().filter_map(|layer| layer.deadline).min()
    }
}

/// Reference viewer with enter/leave transitions
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use router_state::Direction;
/// use tokio::time::Instant;
/// use view_scope::{Lifecycle, TransitionViewer, Viewer, ViewerInput};
///
/// let mut viewer = TransitionViewer::new(Duration::from_millis(300));
/// let now = Instant::now();
///
/// viewer.update(ViewerInput::new(Some("Home".into()), Direction::Forward, 0), &mut || "home", now);
/// viewer.update(ViewerInput::new(Some("About".into()), Direction::Forward, 1), &mut || "about", now);
///
/// let lifecycles: Vec<_> = viewer.layers().iter().map(|l| l.lifecycle).collect();
/// assert_eq!(lifecycles, vec![Lifecycle::Leaving, Lifecycle::Entering]);
///
/// // Nobody signals completion: the timeout removes the leaving layer
/// let removed = viewer.tick(now + Duration::from_millis(300));
/// assert_eq!(removed.len(), 1);
/// ```
#[derive(Debug)]
pub struct TransitionViewer<C> {
    exit_timeout: Duration,
    layers: Vec<Layer<C>>,
    generation: u64,
    mounted: bool,
    appear: bool,
}

impl<C> TransitionViewer<C> {
    /// Create a viewer with an exit timeout ceiling
    pub fn new(exit_timeout: Duration) -> Self {
        Self {
            exit_timeout,
            layers: Vec::new(),
            generation: 0,
            mounted: false,
            appear: false,
        }
    }

    /// Run an appear transition for the first mounted layer
    pub fn with_appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    /// Exit timeout ceiling
    pub fn exit_timeout(&self) -> Duration {
        self.exit_timeout
    }

    /// Drop the oldest leaving layers until at most `keep` remain
    fn trim_leaving(&mut self, keep: usize) -> Vec<Layer<C>> {
        let mut removed = Vec::new();
        let mut leaving = self
            .layers
            .iter()
            .filter(|layer| layer.lifecycle == Lifecycle::Leaving)
            .count();

        while leaving > keep {
            let Some(idx) = self
                .layers
                .iter()
                .position(|layer| layer.lifecycle == Lifecycle::Leaving)
            else {
                break;
            };
            removed.push(self.layers.remove(idx).into_removed());
            leaving -= 1;
        }
        removed
    }
}

impl<C> Default for TransitionViewer<C> {
    fn default() -> Self {
        Self::new(DEFAULT_EXIT_TIMEOUT)
    }
}

impl<C> Viewer<C> for TransitionViewer<C> {
    fn update(
        &mut self,
        input: ViewerInput,
        render: &mut dyn FnMut() -> C,
        now: Instant,
    ) -> Vec<Layer<C>> {
        let current = self
            .layers
            .iter()
            .position(|layer| layer.lifecycle.is_current());

        if let (Some(idx), Some(key)) = (current, input.scope_key.as_deref()) {
            if self.layers[idx].key == key {
                self.layers[idx].content = render();
                return Vec::new();
            }
        }

        let mut removed = Vec::new();
        if let Some(idx) = current {
            if input.keep == 0 {
                removed.push(self.layers.remove(idx).into_removed());
            } else {
                let layer = &mut self.layers[idx];
                layer.lifecycle = Lifecycle::Leaving;
                layer.direction = input.direction;
                layer.deadline = Some(now + self.exit_timeout);
            }
        }
        removed.extend(self.trim_leaving(input.keep));

        if let Some(key) = input.scope_key {
            self.generation += 1;
            let lifecycle = match (self.mounted, self.appear) {
                (true, _) => Lifecycle::Entering,
                (false, true) => Lifecycle::Appearing,
                (false, false) => Lifecycle::Settled,
            };
            self.mounted = true;

            tracing::debug!(
                %key,
                generation = self.generation,
                ?lifecycle,
                direction = %input.direction,
                retained = self.layers.len(),
                "layer created"
            );

            self.layers.push(Layer {
                key,
                generation: self.generation,
                lifecycle,
                direction: input.direction,
                content: render(),
                deadline: None,
            });
        }

        removed
    }

    fn complete(&mut self, signal: &CompletionSignal) -> Option<Lifecycle> {
        let Some(idx) = self
            .layers
            .iter()
            .position(|layer| layer.key == signal.key && layer.generation == signal.generation)
        else {
            tracing::trace!(key = %signal.key, generation = signal.generation, "stale completion ignored");
            return None;
        };

        match self.layers[idx].lifecycle {
            Lifecycle::Appearing | Lifecycle::Entering => {
                self.layers[idx].lifecycle = Lifecycle::Settled;
                Some(Lifecycle::Settled)
            }
            Lifecycle::Leaving => {
                self.layers.remove(idx);
                Some(Lifecycle::Removed)
            }
            Lifecycle::Settled | Lifecycle::Removed => None,
        }
    }

    fn tick(&mut self, now: Instant) -> Vec<Layer<C>> {
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.layers)
            .into_iter()
            .partition(|layer| layer.deadline.is_some_and(|deadline| deadline <= now));
        self.layers = live;

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "leaving layers timed out");
        }
        expired.into_iter().map(Layer::into_removed).collect()
    }

    fn layers(&self) -> &[Layer<C>] {
        &self.layers
    }
}

/// Viewer without transitions
///
/// Shows only the current content; replaced layers are removed at once.
#[derive(Debug)]
pub struct PassthroughViewer<C> {
    layer: Option<Layer<C>>,
    generation: u64,
}

impl<C> PassthroughViewer<C> {
    /// Create a viewer
    pub fn new() -> Self {
        Self {
            layer: None,
            generation: 0,
        }
    }
}

impl<C> Default for PassthroughViewer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Viewer<C> for PassthroughViewer<C> {
    fn update(
        &mut self,
        input: ViewerInput,
        render: &mut dyn FnMut() -> C,
        _now: Instant,
    ) -> Vec<Layer<C>> {
        if let (Some(layer), Some(key)) = (self.layer.as_mut(), input.scope_key.as_deref()) {
            if layer.key == key {
                layer.content = render();
                return Vec::new();
            }
        }

        let removed = self.layer.take().map(Layer::into_removed);
        self.layer = input.scope_key.map(|key| {
            self.generation += 1;
            Layer {
                key,
                generation: self.generation,
                lifecycle: Lifecycle::Settled,
                direction: input.direction,
                content: render(),
                deadline: None,
            }
        });
        removed.into_iter().collect()
    }

    fn complete(&mut self, _signal: &CompletionSignal) -> Option<Lifecycle> {
        None
    }

    fn tick(&mut self, _now: Instant) -> Vec<Layer<C>> {
        Vec::new()
    }

    fn layers(&self) -> &[Layer<C>] {
        match &self.layer {
            Some(layer) => std::slice::from_ref(layer),
            None => &[],
        }
    }
}
