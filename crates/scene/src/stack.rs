use ember_render::Renderer2D;

use crate::scene::{PendingTransition, Scene, Transitions, UpdateContext};

/// Owned stack of scenes with deferred transitions.
///
/// Requests made through [`SceneStack::push_scene`] and friends, or by the
/// active scene during its update, are applied at the two commit points of
/// [`SceneStack::update`]: before and after the active scene runs.
#[derive(Default)]
pub struct SceneStack {
    scenes: Vec<Box<dyn Scene>>,
    transitions: Transitions,
}

impl SceneStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scene(&mut self, scene: Box<dyn Scene>) {
        self.transitions.push(scene);
    }

    pub fn pop_scene(&mut self) {
        self.transitions.pop();
    }

    pub fn switch_scene(&mut self, scene: Box<dyn Scene>) {
        self.transitions.switch(scene);
    }

    pub fn has_pending(&self) -> bool {
        self.transitions.is_pending()
    }

    /// Commit, update the active scene, commit again.
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.commit();
        if let Some(top) = self.scenes.last_mut() {
            top.update(ctx, &mut self.transitions);
        }
        self.commit();
    }

    /// Render the active scene, if any.
    pub fn render(&mut self, renderer: &mut Renderer2D) {
        if let Some(top) = self.scenes.last_mut() {
            top.render(renderer);
        }
    }

    /// Cancel any pending transition and exit every scene, top first.
    pub fn clear(&mut self) {
        self.transitions.cancel();
        while let Some(mut scene) = self.scenes.pop() {
            scene.on_exit();
        }
    }

    pub fn current(&self) -> Option<&dyn Scene> {
        self.scenes.last().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    fn commit(&mut self) {
        match self.transitions.take() {
            PendingTransition::None => {}
            PendingTransition::Push(mut scene) => {
                if let Some(top) = self.scenes.last_mut() {
                    top.on_pause();
                }
                tracing::debug!(scene = scene.name(), "push scene");
                scene.on_enter();
                self.scenes.push(scene);
            }
            PendingTransition::Pop => {
                let Some(mut scene) = self.scenes.pop() else {
                    tracing::debug!("pop on empty scene stack");
                    return;
                };
                tracing::debug!(scene = scene.name(), "pop scene");
                scene.on_exit();
                drop(scene);
                if let Some(top) = self.scenes.last_mut() {
                    top.on_resume();
                }
            }
            PendingTransition::Switch(mut scene) => {
                if let Some(mut old) = self.scenes.pop() {
                    old.on_exit();
                }
                tracing::debug!(scene = scene.name(), "switch scene");
                scene.on_enter();
                self.scenes.push(scene);
            }
        }
    }
}
