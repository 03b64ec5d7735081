//! The background scene: point field, chain trigger and line animation in one place.
//!
//! A [`Scene`] is what a host embeds. Per frame the host calls
//! [`frame`](Scene::frame) with the frame delta and then reads
//! [`point_instances`](Scene::point_instances) and
//! [`line_vertices`](Scene::line_vertices) (or the typed
//! [`points`](Scene::points) / [`segments`](Scene::segments) views). Clicks
//! arrive as world positions via [`click`](Scene::click), as NDC via
//! [`click_ndc`](Scene::click_ndc), or straight from winit through
//! [`handle_input`](Scene::handle_input).
//!
//! # Frame order
//!
//! Points move first, then lines advance. Lines look their endpoints up live,
//! so a finished line keeps following the points it connects.

use crate::camera::Viewport;
use crate::chain::{Chain, ChainBuilder};
use crate::config::BackgroundConfig;
use crate::error::ConfigError;
use crate::field::{Point, PointField, PointId};
use crate::input::Input;
use crate::neighbors::{find_nearest, Visited};
use crate::render::{LineVertex, PointInstance};
use crate::sequencer::{LineSegment, Sequencer};
use crate::spatial::SpatialGrid;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// An interactive drifting-points background.
pub struct Scene {
    config: BackgroundConfig,
    aspect: f32,
    viewport: Viewport,
    field: PointField,
    grid: SpatialGrid,
    chains: ChainBuilder,
    sequencer: Sequencer,
    rng: StdRng,
    point_opacity: f32,
    scroll_offset: f32,
    /// Simulation time of the next ambient chain, when enabled.
    next_ambient_at: Option<f64>,
    disposed: bool,
}

impl Scene {
    /// Build a scene whose viewport is derived from the configured camera.
    pub fn new(config: BackgroundConfig, aspect: f32) -> Result<Self, ConfigError> {
        let aspect = sanitize_aspect(aspect);
        let viewport = config.camera.viewport(aspect);
        Self::build(config, aspect, viewport)
    }

    /// Build a scene with an explicit world-space viewport.
    pub fn with_viewport(config: BackgroundConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        let aspect = if viewport.height > 0.0 {
            sanitize_aspect(viewport.width / viewport.height)
        } else {
            1.0
        };
        Self::build(config, aspect, viewport)
    }

    fn build(config: BackgroundConfig, aspect: f32, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let field = PointField::new(&config, viewport, &mut rng);
        let next_ambient_at = config
            .ambient_interval_ms
            .map(|range| draw_interval(&mut rng, range));

        log::info!(
            "Created scene: {} points, viewport {:.2}x{:.2}",
            field.len(),
            viewport.width,
            viewport.height
        );

        Ok(Self {
            grid: SpatialGrid::new(config.cell_size),
            chains: ChainBuilder::new(config.chain_depth_range, config.chain_depth_cap),
            sequencer: Sequencer::from_config(&config),
            config,
            aspect,
            viewport,
            field,
            rng,
            point_opacity: 0.0,
            scroll_offset: 0.0,
            next_ambient_at,
            disposed: false,
        })
    }

    /// Advance the scene by one rendered frame.
    pub fn frame(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.field.step(self.viewport);
        self.point_opacity = (self.point_opacity + dt * self.config.point_fade_in_rate).min(1.0);
        self.run_ambient();
        self.sequencer.tick(dt, &self.field);
    }

    fn run_ambient(&mut self) {
        let Some(due) = self.next_ambient_at else {
            return;
        };
        let now = self.sequencer.elapsed();
        if now < due {
            return;
        }

        if !self.field.is_empty() {
            let index = self.rng.gen_range(0..self.field.len());
            let seed = self.field.points()[index].id;
            let scheduled = self.start_chain(seed);
            log::debug!("Ambient chain from point {} scheduled {} lines", index, scheduled);
        }

        self.next_ambient_at = self
            .config
            .ambient_interval_ms
            .map(|range| now + draw_interval(&mut self.rng, range));
    }

    /// Start a chain from the point nearest to `world`.
    ///
    /// Returns the number of lines scheduled; 0 when nothing is within reach of
    /// the click or the scene has been disposed.
    pub fn click(&mut self, world: Vec3) -> usize {
        if self.disposed {
            return 0;
        }

        self.grid.rebuild(self.field.iter());
        match find_nearest(&self.grid, world, &Visited::new()) {
            Some(seed) => self.start_chain(seed),
            None => {
                log::debug!("No point near click at {:?}", world);
                0
            }
        }
    }

    /// Start a chain from a click given in normalized device coordinates.
    pub fn click_ndc(&mut self, ndc: Vec2) -> usize {
        match self
            .config
            .camera
            .unproject(ndc, self.aspect, self.config.click_plane_z)
        {
            Some(world) => self.click(world),
            None => 0,
        }
    }

    /// Apply resizes, scroll and queued clicks from `input`.
    pub fn handle_input(&mut self, input: &mut Input) {
        if input.was_resized() {
            self.resize(input.aspect());
        }
        self.set_scroll(input.scroll_px());
        for ndc in input.drain_clicks() {
            self.click_ndc(ndc);
        }
    }

    fn start_chain(&mut self, seed: PointId) -> usize {
        let chain = self.build_chain(seed);
        self.sequencer.schedule_chain(&chain)
    }

    /// Walk the field from `seed` without scheduling anything.
    pub fn build_chain(&mut self, seed: PointId) -> Chain {
        self.chains
            .build(Some(seed), &self.field, &mut self.grid, &mut self.rng)
    }

    /// Recompute the viewport for a new aspect ratio. Points keep their positions.
    pub fn resize(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
        self.viewport = self.config.camera.viewport(self.aspect);
    }

    /// Replace the viewport directly.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if viewport.height > 0.0 {
            self.aspect = sanitize_aspect(viewport.width / viewport.height);
        }
    }

    /// Set the page scroll in pixels; exported positions shift up by the parallax factor.
    pub fn set_scroll(&mut self, pixels: f32) {
        self.scroll_offset = pixels * self.config.scroll_parallax;
    }

    /// Replace the point population. Lines on old points expire on the next frame.
    pub fn reseed(&mut self) {
        self.field.reseed(&self.config, self.viewport, &mut self.rng);
    }

    /// Tear the scene down: drop lines, cancel pending insertions and ignore
    /// any further frames or clicks.
    pub fn dispose(&mut self) {
        self.sequencer.clear();
        self.grid.clear();
        self.next_ambient_at = None;
        self.disposed = true;
    }

    // ========== Render Output ==========

    pub fn points(&self) -> &[Point] {
        self.field.points()
    }

    /// Visible line segments with live endpoints.
    pub fn segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        self.sequencer.segments(&self.field)
    }

    /// Point instances with the scroll offset and fade-in applied.
    pub fn point_instances(&self) -> Vec<PointInstance> {
        let offset = Vec3::new(0.0, self.scroll_offset, 0.0);
        self.field
            .iter()
            .map(|p| PointInstance::new(p.position + offset, self.point_opacity))
            .collect()
    }

    /// Line-list vertices, two per visible segment, with the scroll offset applied.
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        let offset = Vec3::new(0.0, self.scroll_offset, 0.0);
        self.segments()
            .flat_map(|s| {
                [
                    LineVertex::new(s.start + offset, s.opacity),
                    LineVertex::new(s.end + offset, s.opacity),
                ]
            })
            .collect()
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn field(&self) -> &PointField {
        &self.field
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Global point opacity, rising from 0 to 1 after startup.
    pub fn point_opacity(&self) -> f32 {
        self.point_opacity
    }

    /// Current vertical parallax offset in world units.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

fn draw_interval(rng: &mut StdRng, (min, max): (u64, u64)) -> f64 {
    let ms = if min < max { rng.gen_range(min..=max) } else { min };
    ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BackgroundConfig {
        BackgroundConfig::default().with_point_count(300).with_seed(42)
    }

    #[test]
    fn test_new_uses_camera_viewport() {
        let config = small_config();
        let expected = config.camera.viewport(2.0);
        let scene = Scene::new(config, 2.0).unwrap();
        assert_eq!(scene.viewport(), expected);
        assert_eq!(scene.points().len(), 300);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = small_config().with_cell_size(-1.0);
        assert!(Scene::new(config, 1.0).is_err());
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = Scene::new(small_config(), 1.5).unwrap();
        let b = Scene::new(small_config(), 1.5).unwrap();
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn test_point_fade_in() {
        let mut scene = Scene::new(small_config(), 1.0).unwrap();
        assert_eq!(scene.point_opacity(), 0.0);

        scene.frame(0.8);
        assert!((scene.point_opacity() - 0.5).abs() < 1e-6);

        scene.frame(10.0);
        assert_eq!(scene.point_opacity(), 1.0);
        assert!(scene.point_instances().iter().all(|p| p.opacity == 1.0));
    }

    #[test]
    fn test_scroll_offset_shifts_output() {
        let mut scene = Scene::new(small_config(), 1.0).unwrap();
        let before = scene.point_instances()[0].position;

        scene.set_scroll(1000.0);
        let after = scene.point_instances()[0].position;
        assert!((after[1] - before[1] - 0.1).abs() < 1e-5);
        assert_eq!(after[0], before[0]);
    }

    #[test]
    fn test_resize_keeps_points() {
        let mut scene = Scene::new(small_config(), 1.0).unwrap();
        let before = scene.points().to_vec();

        scene.resize(3.0);
        assert!((scene.viewport().width / scene.viewport().height - 3.0).abs() < 1e-5);
        assert_eq!(scene.points(), &before[..]);
    }

    #[test]
    fn test_ambient_chains_fire() {
        let config = small_config()
            .with_point_count(800)
            .with_ambient_interval_ms(100, 100);
        let mut scene = Scene::with_viewport(config, Viewport::new(4.0, 4.0)).unwrap();

        for _ in 0..30 {
            scene.frame(1.0 / 60.0);
        }
        assert!(!scene.sequencer().is_idle());
    }

    #[test]
    fn test_ambient_chain_draws_on_the_frame_it_fires() {
        let config = small_config()
            .with_point_count(800)
            .with_ambient_interval_ms(100, 100);
        let mut scene = Scene::with_viewport(config, Viewport::new(4.0, 4.0)).unwrap();

        // Frames of 0.06 s: the trigger comes due at the start of the third.
        scene.frame(0.06);
        scene.frame(0.06);
        assert!(scene.sequencer().is_idle());

        scene.frame(0.06);
        let lines = scene.sequencer().lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].progress() > 0.0);
    }

    #[test]
    fn test_click_far_outside_key_space() {
        let mut scene = Scene::new(small_config().with_point_count(50), 1.0).unwrap();
        assert_eq!(scene.click(Vec3::new(3.0e9, 0.0, 0.0)), 0);
        assert_eq!(scene.click(Vec3::splat(-3.0e9)), 0);
    }

    #[test]
    fn test_handle_input_applies_resize_scroll_and_clicks() {
        use winit::dpi::PhysicalSize;
        use winit::event::WindowEvent;

        let config = BackgroundConfig::default().with_point_count(1000).with_seed(10);
        let mut scene = Scene::new(config, 1.0).unwrap();
        let mut input = Input::new();

        input.handle_event(&WindowEvent::Resized(PhysicalSize::new(1600, 900)));
        input.move_cursor(Vec2::new(800.0, 450.0));
        input.press(crate::input::MouseButton::Left);
        input.scroll_by(1000.0);

        scene.handle_input(&mut input);

        assert!((scene.aspect() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(scene.viewport(), scene.config().camera.viewport(16.0 / 9.0));
        assert!((scene.scroll_offset() - 0.1).abs() < 1e-6);
        assert!(!scene.sequencer().is_idle());
        assert!(input.drain_clicks().is_empty());
    }
}
