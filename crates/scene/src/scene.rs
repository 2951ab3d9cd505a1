use ember_input::Input;
use ember_render::{Camera2D, Renderer2D};

/// A game state owned by the [`crate::SceneStack`].
///
/// Lifecycle: `on_enter`, then `update`/`render` every frame while on top,
/// `on_pause`/`on_resume` around scenes pushed above it, and `on_exit` when
/// removed. Only the top scene is updated and rendered.
pub trait Scene {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "scene"
    }

    fn on_enter(&mut self) {}

    fn on_exit(&mut self) {}

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    /// Advance game logic. Stack changes are requested through `transitions`
    /// and applied after this call returns.
    fn update(&mut self, ctx: &mut UpdateContext<'_>, transitions: &mut Transitions);

    fn render(&mut self, renderer: &mut Renderer2D);
}

/// Per-frame state handed to [`Scene::update`].
pub struct UpdateContext<'a> {
    /// Seconds since the previous frame.
    pub dt: f32,
    pub input: &'a Input,
    pub camera: &'a mut Camera2D,
    quit: bool,
}

impl<'a> UpdateContext<'a> {
    pub fn new(dt: f32, input: &'a Input, camera: &'a mut Camera2D) -> Self {
        Self {
            dt,
            input,
            camera,
            quit: false,
        }
    }

    /// Ask the runtime to stop after this frame.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// A deferred stack mutation.
#[derive(Default)]
pub enum PendingTransition {
    #[default]
    None,
    Push(Box<dyn Scene>),
    Pop,
    Switch(Box<dyn Scene>),
}

impl PendingTransition {
    fn label(&self) -> &'static str {
        match self {
            PendingTransition::None => "none",
            PendingTransition::Push(_) => "push",
            PendingTransition::Pop => "pop",
            PendingTransition::Switch(_) => "switch",
        }
    }
}

impl std::fmt::Debug for PendingTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingTransition::Push(scene) | PendingTransition::Switch(scene) => {
                write!(f, "{}({})", self.label(), scene.name())
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// Holds at most one pending transition. A new request replaces the old one
/// and drops its scene.
#[derive(Debug, Default)]
pub struct Transitions {
    pending: PendingTransition,
}

impl Transitions {
    pub fn push(&mut self, scene: Box<dyn Scene>) {
        self.set(PendingTransition::Push(scene));
    }

    pub fn pop(&mut self) {
        self.set(PendingTransition::Pop);
    }

    pub fn switch(&mut self, scene: Box<dyn Scene>) {
        self.set(PendingTransition::Switch(scene));
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self.pending, PendingTransition::None)
    }

    /// Take the pending transition, leaving `None`.
    pub fn take(&mut self) -> PendingTransition {
        std::mem::take(&mut self.pending)
    }

    /// Drop any pending transition without applying it.
    pub fn cancel(&mut self) {
        self.pending = PendingTransition::None;
    }

    fn set(&mut self, next: PendingTransition) {
        if self.is_pending() {
            tracing::warn!(
                replaced = ?self.pending,
                with = ?next,
                "overwriting pending scene transition"
            );
        }
        self.pending = next;
    }
}
