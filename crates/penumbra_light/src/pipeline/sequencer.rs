//! Pass sequencer

use penumbra_math::Rect;

use super::context::RenderContext;
use super::passes::{
    DistanceFieldPass, LightGatherPass, OcclusionRasterPass, RayMarchPass, ShadowCastPass,
    ShadowComposePass,
};
use super::{LightingPass, PassSlot};
use crate::config::{LightingConfig, LightingStrategy};
use crate::error::{LightingError, Result};
use crate::scene::LightScene;
use crate::stats::LightingStats;

/// Drives an ordered list of passes, one at a time
///
/// Frames can run in one call with [`PassSequencer::run_frame`], or be
/// stepped by a host render graph with `begin_frame`, then
/// `begin_pass` / `render_pass` / `end_pass` for each pass, then
/// `end_frame`.
pub struct PassSequencer {
    passes: Vec<Box<dyn LightingPass>>,
    context: RenderContext,
    /// Next pass to begin this frame
    cursor: usize,
    /// Pass between `begin_pass` and `end_pass`
    active: Option<usize>,
    /// Built from the strategy presets
    standard: bool,
}

impl PassSequencer {
    /// Sequencer with no passes
    pub fn new(config: LightingConfig) -> Result<Self> {
        Ok(Self {
            passes: Vec::new(),
            context: RenderContext::new(config)?,
            cursor: 0,
            active: None,
            standard: false,
        })
    }

    /// Sequencer with the standard passes for `config.strategy`
    pub fn for_strategy(config: LightingConfig) -> Result<Self> {
        let strategy = config.strategy;
        let mut sequencer = Self::new(config)?;
        sequencer.register_standard(strategy)?;
        Ok(sequencer)
    }

    fn register_standard(&mut self, strategy: LightingStrategy) -> Result<()> {
        match strategy {
            LightingStrategy::ShadowVolumes => {
                self.register(LightGatherPass)?;
                self.register(ShadowCastPass)?;
                self.register(ShadowComposePass)?;
            }
            LightingStrategy::DistanceField => {
                self.register(OcclusionRasterPass)?;
                self.register(DistanceFieldPass)?;
                self.register(RayMarchPass)?;
            }
        }
        self.standard = true;
        Ok(())
    }

    /// Append a pass; its slot may not precede the last registered slot
    pub fn register<P: LightingPass + 'static>(&mut self, pass: P) -> Result<()> {
        self.register_boxed(Box::new(pass))
    }

    /// Append a boxed pass
    pub fn register_boxed(&mut self, pass: Box<dyn LightingPass>) -> Result<()> {
        if let Some(last) = self.passes.last() {
            if pass.slot() < last.slot() {
                return Err(LightingError::PassOrder {
                    pass: pass.name().to_string(),
                    slot: pass.slot(),
                    previous: last.slot(),
                });
            }
        }
        log::debug!("Registered lighting pass '{}' ({:?})", pass.name(), pass.slot());
        self.passes.push(pass);
        self.standard = false;
        Ok(())
    }

    /// Replace the configuration, rebuilding resources.
    /// Standard pass lists follow a strategy change.
    pub fn reconfigure(&mut self, config: LightingConfig) -> Result<()> {
        if let Some(active) = self.active {
            return Err(LightingError::PassInProgress(self.passes[active].name().to_string()));
        }
        let strategy = config.strategy;
        let rebuild = self.standard && strategy != self.context.config.strategy;
        self.context = RenderContext::new(config)?;
        if rebuild {
            self.passes.clear();
            self.register_standard(strategy)?;
        }
        self.cursor = 0;
        Ok(())
    }

    /// Pass names in execution order
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Name of the running pass
    pub fn active_pass(&self) -> Option<&str> {
        self.active.map(|i| self.passes[i].name())
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.active {
            Some(i) => Err(LightingError::PassInProgress(self.passes[i].name().to_string())),
            None => Ok(()),
        }
    }

    /// Start a frame over the `view` world rectangle
    pub fn begin_frame(&mut self, view: Rect) -> Result<()> {
        self.ensure_idle()?;
        self.cursor = 0;
        self.context.begin_frame(view);
        Ok(())
    }

    /// Begin the next pass in order. Returns its slot.
    pub fn begin_pass(&mut self, scene: &dyn LightScene) -> Result<PassSlot> {
        self.ensure_idle()?;
        let index = self.cursor;
        let Some(pass) = self.passes.get_mut(index) else {
            return Err(LightingError::FrameComplete(self.passes.len()));
        };
        self.active = Some(index);
        if let Err(err) = pass.begin(&mut self.context, scene) {
            self.active = None;
            return Err(err);
        }
        Ok(pass.slot())
    }

    /// Render the running pass
    pub fn render_pass(&mut self, scene: &dyn LightScene) -> Result<()> {
        let index = self.active.ok_or(LightingError::NoActivePass)?;
        let result = self.passes[index].render(&mut self.context, scene);
        if result.is_err() {
            self.active = None;
        }
        result
    }

    /// Finish the running pass and advance to the next one
    pub fn end_pass(&mut self, scene: &dyn LightScene) -> Result<()> {
        let index = self.active.take().ok_or(LightingError::NoActivePass)?;
        self.passes[index].end(&mut self.context, scene)?;
        self.cursor = index + 1;
        self.context.stats.passes_run += 1;
        Ok(())
    }

    /// Close the frame. Passes that were not run are reported.
    pub fn end_frame(&mut self) -> Result<&LightingStats> {
        self.ensure_idle()?;
        if self.cursor < self.passes.len() {
            log::warn!(
                "Frame {} ended with {} lighting passes not run",
                self.context.frame,
                self.passes.len() - self.cursor
            );
        }
        Ok(&self.context.stats)
    }

    /// Run every pass for one frame
    pub fn run_frame(&mut self, scene: &dyn LightScene, view: Rect) -> Result<&LightingStats> {
        self.begin_frame(view)?;
        while self.cursor < self.passes.len() {
            self.begin_pass(scene)?;
            self.render_pass(scene)?;
            self.end_pass(scene)?;
        }
        self.end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SceneIndex;
    use penumbra_math::Vec2;

    struct Marker {
        name: &'static str,
        slot: PassSlot,
    }

    impl LightingPass for Marker {
        fn name(&self) -> &str {
            self.name
        }

        fn slot(&self) -> PassSlot {
            self.slot
        }

        fn render(&mut self, _ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
            Ok(())
        }
    }

    fn view() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::splat(32.0))
    }

    #[test]
    fn test_standard_pass_lists() {
        let cpu = PassSequencer::for_strategy(LightingConfig::shadow_volumes()).unwrap();
        assert_eq!(cpu.pass_names(), vec!["light_gather", "shadow_cast", "shadow_compose"]);

        let gpu = PassSequencer::for_strategy(LightingConfig::distance_field()).unwrap();
        assert_eq!(gpu.pass_names(), vec!["occlusion_raster", "distance_field", "ray_march"]);
    }

    #[test]
    fn test_register_rejects_out_of_order_slot() {
        let mut seq = PassSequencer::new(LightingConfig::default()).unwrap();
        seq.register(Marker { name: "lightmap", slot: PassSlot::Lightmap }).unwrap();
        let err = seq.register(Marker { name: "late_occlusion", slot: PassSlot::Occlusion }).unwrap_err();
        assert!(matches!(
            err,
            LightingError::PassOrder { slot: PassSlot::Occlusion, previous: PassSlot::Lightmap, .. }
        ));
        // Same slot twice is fine
        seq.register(Marker { name: "lightmap_2", slot: PassSlot::Lightmap }).unwrap();
    }

    #[test]
    fn test_one_pass_at_a_time() {
        let scene = SceneIndex::new();
        let mut seq = PassSequencer::for_strategy(LightingConfig::shadow_volumes()).unwrap();
        seq.begin_frame(view()).unwrap();

        assert_eq!(seq.begin_pass(&scene).unwrap(), PassSlot::Occlusion);
        assert_eq!(seq.active_pass(), Some("light_gather"));
        assert!(matches!(seq.begin_pass(&scene), Err(LightingError::PassInProgress(name)) if name == "light_gather"));
        assert!(matches!(seq.begin_frame(view()), Err(LightingError::PassInProgress(_))));

        seq.render_pass(&scene).unwrap();
        seq.end_pass(&scene).unwrap();
        assert!(matches!(seq.end_pass(&scene), Err(LightingError::NoActivePass)));
        assert_eq!(seq.begin_pass(&scene).unwrap(), PassSlot::Shadow);
    }

    #[test]
    fn test_frame_complete() {
        let scene = SceneIndex::new();
        let mut seq = PassSequencer::for_strategy(LightingConfig::shadow_volumes()).unwrap();
        let stats = seq.run_frame(&scene, view()).unwrap();
        assert_eq!(stats.passes_run, 3);
        assert!(matches!(seq.begin_pass(&scene), Err(LightingError::FrameComplete(3))));

        // A new frame starts over
        seq.run_frame(&scene, view()).unwrap();
        assert_eq!(seq.context().frame(), 2);
    }

    #[test]
    fn test_reconfigure_switches_strategy() {
        let mut seq = PassSequencer::for_strategy(LightingConfig::shadow_volumes()).unwrap();
        seq.reconfigure(LightingConfig::distance_field()).unwrap();
        assert_eq!(seq.pass_names()[0], "occlusion_raster");

        let mut custom = PassSequencer::new(LightingConfig::default()).unwrap();
        custom.register(Marker { name: "marker", slot: PassSlot::Shadow }).unwrap();
        custom.reconfigure(LightingConfig::distance_field()).unwrap();
        assert_eq!(custom.pass_names(), vec!["marker"]);
    }
}
