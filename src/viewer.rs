//! Window, event loop and controls.
//!
//! [`Viewer`] is the builder; `run()` blocks until the window is closed.
//! Controls:
//!
//! - `Space` toggles between scattered and assembled
//! - drop image files onto the window to hang them on the tree
//! - drag to orbit, scroll to zoom
//! - `A` auto-rotate, `R` reset camera, `P` pause, `C` clear photos
//! - `Escape` quits

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::TreeConfig;
use crate::error::ViewerError;
use crate::formation::FormationController;
use crate::gpu::{Camera, Renderer};
use crate::input::{Input, KeyCode, MouseButton};
use crate::layout::LayoutRng;
use crate::photo::PhotoSource;
use crate::scene::{FrameInput, TreeScene};
use crate::time::Time;

/// A tree viewer builder.
pub struct Viewer {
    config: TreeConfig,
    photos: Vec<PhotoSource>,
    title: String,
    seed: Option<u64>,
    auto_rotate: bool,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            config: TreeConfig::default(),
            photos: Vec::new(),
            title: "Apple Tree".to_string(),
            seed: None,
            auto_rotate: false,
        }
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    /// Photos to hang on the tree at startup. They fill the photo spiral in
    /// list order, the first one at the bottom.
    pub fn with_photos<I>(mut self, photos: I) -> Self
    where
        I: IntoIterator<Item = PhotoSource>,
    {
        self.photos.extend(photos);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Fix the random layout so every run looks the same.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_auto_rotate(mut self, enabled: bool) -> Self {
        self.auto_rotate = enabled;
        self
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the viewer drives that doesn't need a window.
pub(crate) struct ViewerState {
    pub(crate) scene: TreeScene,
    pub(crate) controller: FormationController,
    pub(crate) camera: Camera,
    pub(crate) time: Time,
    pub(crate) input: Input,
}

impl ViewerState {
    fn new(viewer: &Viewer) -> Self {
        let rng = match viewer.seed {
            Some(seed) => LayoutRng::seeded(seed),
            None => LayoutRng::from_entropy(),
        };
        let mut camera = Camera::new();
        camera.auto_rotate = viewer.auto_rotate;
        Self {
            scene: TreeScene::with_rng(viewer.config.clone(), rng),
            controller: FormationController::new().with_photos(viewer.photos.iter().cloned()),
            camera,
            time: Time::new(),
            input: Input::new(),
        }
    }

    /// Apply this frame's input. Returns `false` when the viewer should quit.
    pub(crate) fn apply_controls(&mut self) -> bool {
        let input = &self.input;
        if input.key_pressed(KeyCode::Escape) {
            return false;
        }
        if input.key_pressed(KeyCode::Space) {
            self.controller.toggle();
        }
        if input.key_pressed(KeyCode::A) {
            self.camera.auto_rotate = !self.camera.auto_rotate;
        }
        if input.key_pressed(KeyCode::R) {
            self.camera.reset();
        }
        if input.key_pressed(KeyCode::P) {
            self.time.toggle_pause();
        }
        if input.key_pressed(KeyCode::C) {
            self.controller.clear_photos();
        }

        if input.mouse_held(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.camera.orbit(delta.x, delta.y);
        }
        if input.scroll_delta() != 0.0 {
            self.camera.zoom(input.scroll_delta());
        }

        self.input.begin_frame();
        true
    }

    /// Advance the clock and the scene by one frame.
    pub(crate) fn advance(&mut self) {
        let (elapsed, delta) = self.time.update();
        self.camera.advance(delta);
        self.scene.update(&FrameInput {
            mode: self.controller.mode(),
            photos: self.controller.photos(),
            elapsed,
            delta,
        });
    }

    fn drop_file(&mut self, path: std::path::PathBuf) {
        log::info!("adding photo {}", path.display());
        self.controller.add_photo(PhotoSource::File(path));
    }
}

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    state: ViewerState,
    title: String,
    error: Option<ViewerError>,
}

impl App {
    fn new(viewer: Viewer) -> Self {
        Self {
            window: None,
            renderer: None,
            state: ViewerState::new(&viewer),
            title: viewer.title,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.state.apply_controls() {
            event_loop.exit();
            return;
        }
        self.state.advance();

        if let Some(renderer) = &mut self.renderer {
            match renderer.render(&self.state.scene, &self.state.camera) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::debug!("surface lost, reconfiguring");
                    renderer.reconfigure()
                }
                Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                Err(e) => log::warn!("render error: {:?}", e),
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.state.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::DroppedFile(path) => {
                self.state.drop_file(path);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::FormationMode;
    use winit::event::ElementState;

    fn state() -> ViewerState {
        let viewer = Viewer::new()
            .with_config(TreeConfig::new().with_counts(10, 2, 10).with_snow_flakes(10))
            .with_seed(42)
            .with_photos([PhotoSource::Bytes(vec![1, 2, 3])]);
        ViewerState::new(&viewer)
    }

    fn press(state: &mut ViewerState, key: KeyCode) {
        state.input.key_event(key, ElementState::Pressed);
        state.input.key_event(key, ElementState::Released);
    }

    #[test]
    fn test_space_toggles_formation() {
        let mut state = state();
        assert_eq!(state.controller.mode(), FormationMode::Scattered);

        press(&mut state, KeyCode::Space);
        assert!(state.apply_controls());
        assert_eq!(state.controller.mode(), FormationMode::Assembled);

        // Consumed; no second toggle without a new press.
        assert!(state.apply_controls());
        assert_eq!(state.controller.mode(), FormationMode::Assembled);
    }

    #[test]
    fn test_escape_quits() {
        let mut state = state();
        press(&mut state, KeyCode::Escape);
        assert!(!state.apply_controls());
    }

    #[test]
    fn test_drag_orbits_camera() {
        let mut state = state();
        state.input.cursor_moved(glam::Vec2::new(10.0, 10.0));
        state.input.button_event(MouseButton::Left, ElementState::Pressed);
        state.input.cursor_moved(glam::Vec2::new(60.0, 10.0));
        let yaw = state.camera.yaw;
        state.apply_controls();
        assert!(state.camera.yaw < yaw);
    }

    #[test]
    fn test_startup_photos_and_drop() {
        let mut state = state();
        state.advance();
        assert_eq!(state.scene.photos().len(), 1);

        state.drop_file("/tmp/does-not-exist.png".into());
        state.advance();
        assert_eq!(state.scene.photos().len(), 2);
        state.scene.finish_loading();
        assert!(state.scene.photos()[0].texture().is_placeholder());

        press(&mut state, KeyCode::C);
        state.apply_controls();
        state.advance();
        assert!(state.scene.photos().is_empty());
    }
}
