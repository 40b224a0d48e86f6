//! Per-frame engine: pulses + spectral bands → merged field → surface, plus color.
//!
//! [`FieldEngine::step`] is the only mutation entry point. It never fails:
//! malformed per-frame input degrades (missing bins read as zero, unknown
//! classes fall back to the default color) so every frame yields a payload.
//! [`FrameDriver`] wires the engine to the spectral, classification, and
//! rendering collaborators.

use glam::Vec3;
use log::{debug, info, trace};

use crate::color::FeatureColorState;
use crate::error::{FieldError, FieldResult};
use crate::field::{
    frame_energy, FieldCompositor, PulsePropagator, SourceId, SpectralMapper, ValueRange,
};
use crate::params::EngineConfig;
use crate::surface::{FramePayload, Surface, SurfacePoint};

/// Produces a spectral frame of `num_bins` non-negative amplitudes over `[low_hz, high_hz]`
pub trait SpectralAnalyzer {
    fn compute_spectral_frame(
        &mut self,
        audio: &[f32],
        low_hz: f32,
        high_hz: f32,
        num_bins: usize,
    ) -> Vec<f32>;
}

/// Classifies an audio buffer into a categorical feature key (or `"default"`)
pub trait FeatureClassifier {
    fn classify_feature(&mut self, audio: &[f32]) -> String;
}

/// Consumes the geometry and color of one frame
pub trait Renderer {
    fn render(&mut self, payload: &FramePayload<'_>);
}

impl<F> SpectralAnalyzer for F
where
    F: FnMut(&[f32], f32, f32, usize) -> Vec<f32>,
{
    fn compute_spectral_frame(
        &mut self,
        audio: &[f32],
        low_hz: f32,
        high_hz: f32,
        num_bins: usize,
    ) -> Vec<f32> {
        self(audio, low_hz, high_hz, num_bins)
    }
}

impl<F> FeatureClassifier for F
where
    F: FnMut(&[f32]) -> String,
{
    fn classify_feature(&mut self, audio: &[f32]) -> String {
        self(audio)
    }
}

impl<F> Renderer for F
where
    F: FnMut(&FramePayload<'_>),
{
    fn render(&mut self, payload: &FramePayload<'_>) {
        self(payload)
    }
}

/// Collaborator outputs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Seconds since the previous frame (drives color smoothing only)
    pub dt: f32,
    /// Wall-clock time of this frame (drives pulse propagation)
    pub current_time: f32,
    /// Spectral bins for this frame
    pub spectrum: &'a [f32],
    /// Spawn a pulse at the surface center this frame
    pub trigger: bool,
    /// Classified feature key
    pub feature: &'a str,
}

/// Audio-reactive field engine owning all per-frame buffers
pub struct FieldEngine {
    config: EngineConfig,
    surface: Surface,
    mapper: SpectralMapper,
    pulses: PulsePropagator,
    compositor: FieldCompositor,
    color: FeatureColorState,
    transient_source: SourceId,
    spectral_source: SourceId,
    /// Host-fed sources and their latest per-node buffers
    extra_sources: Vec<(SourceId, Vec<f32>)>,
    frame_count: u64,
}

impl FieldEngine {
    /// Build every component; configuration errors are reported here and only here
    pub fn new(config: EngineConfig) -> FieldResult<Self> {
        config.validate()?;

        let surface = Surface::new(&config.surface)?;
        let mapper = SpectralMapper::new(&surface, &config.spectrum)?;
        let pulses = PulsePropagator::new(&surface, config.pulse.clone())?;
        let color = FeatureColorState::new(&config.color)?;

        let mut compositor = FieldCompositor::new(surface.node_count());
        let transient_source = compositor.register("transient", 1.0, pulses.value_range());
        let spectral_source = compositor.register("spectral", 1.0, mapper.value_range());

        info!(
            "Field engine ready: {} nodes, {} bins over [{}, {}] Hz, field range {:?}",
            surface.node_count(),
            config.spectrum.num_bins,
            config.spectrum.low_hz,
            config.spectrum.high_hz,
            compositor.value_range()
        );

        Ok(Self {
            config,
            surface,
            mapper,
            pulses,
            compositor,
            color,
            transient_source,
            spectral_source,
            extra_sources: Vec::new(),
            frame_count: 0,
        })
    }

    /// Add a host-fed source to the merge; its buffer starts silent
    pub fn register_source(
        &mut self,
        name: impl Into<String>,
        weight: f32,
        range: ValueRange,
    ) -> SourceId {
        let id = self.compositor.register(name, weight, range);
        self.extra_sources
            .push((id, vec![0.0; self.surface.node_count()]));
        id
    }

    /// Replace the buffer of a source added with [`register_source`](Self::register_source).
    ///
    /// The buffer is held across frames until replaced. Missing trailing
    /// nodes and non-finite values read as zero; extra values are ignored.
    pub fn set_source_buffer(&mut self, id: SourceId, values: &[f32]) -> FieldResult<()> {
        let Some((_, buffer)) = self.extra_sources.iter_mut().find(|(s, _)| *s == id) else {
            return Err(FieldError::out_of_range(format!(
                "{id:?} is not a host-fed source of this engine"
            )));
        };
        if values.len() != buffer.len() {
            debug!(
                "Source {id:?} fed {} values for {} nodes",
                values.len(),
                buffer.len()
            );
        }
        buffer.fill(0.0);
        for (out, &value) in buffer.iter_mut().zip(values) {
            if value.is_finite() {
                *out = value;
            }
        }
        Ok(())
    }

    /// Change the combination weight of any registered source
    pub fn set_source_weight(&mut self, id: SourceId, weight: f32) -> FieldResult<()> {
        if !self.compositor.contains(id) {
            return Err(FieldError::out_of_range(format!(
                "{id:?} is not registered with this engine"
            )));
        }
        if !weight.is_finite() {
            return Err(FieldError::out_of_range(format!(
                "source weight must be finite, got {weight}"
            )));
        }
        self.compositor.set_weight(id, weight);
        Ok(())
    }

    /// Spawn a pulse without stepping a frame (center when `origin` is `None`)
    pub fn trigger_at(&mut self, origin_time: f32, origin: Option<SurfacePoint>) {
        self.pulses.trigger(&self.surface, origin_time, origin);
    }

    /// Run one frame and return the geometry/color payload
    pub fn step(&mut self, input: &FrameInput<'_>) -> FramePayload<'_> {
        if input.trigger {
            self.pulses.trigger(&self.surface, input.current_time, None);
        }

        let transient = self.pulses.advance(input.current_time);
        let spectral = self.mapper.map(input.spectrum);
        let mut sources: Vec<(SourceId, &[f32])> = Vec::with_capacity(2 + self.extra_sources.len());
        sources.push((self.transient_source, transient));
        sources.push((self.spectral_source, spectral));
        sources.extend(
            self.extra_sources
                .iter()
                .map(|(id, buffer)| (*id, buffer.as_slice())),
        );
        self.compositor.compose(&sources);

        self.color.update(input.feature, input.dt);
        let color = self.color.modulate(frame_energy(input.spectrum), input.dt);

        self.frame_count += 1;
        trace!(
            "Frame {} t={:.3}: {} active pulses",
            self.frame_count,
            input.current_time,
            self.pulses.active_events().len()
        );

        let range = self.compositor.value_range();
        self.surface.apply(
            self.compositor.merged(),
            color.to_array(),
            range,
            input.current_time,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Authoritative merged field from the last frame
    pub fn field(&self) -> &[f32] {
        self.compositor.merged()
    }

    /// Transient contribution from the last frame
    pub fn transient_field(&self) -> &[f32] {
        self.pulses.field()
    }

    /// Spectral contribution from the last frame
    pub fn spectral_field(&self) -> &[f32] {
        self.mapper.field()
    }

    pub fn pulses(&self) -> &PulsePropagator {
        &self.pulses
    }

    pub fn color_state(&self) -> &FeatureColorState {
        &self.color
    }

    /// Displayed color from the last frame (smoothed, then brightness-scaled)
    pub fn color(&self) -> Vec3 {
        self.color.displayed()
    }

    pub fn compositor(&self) -> &FieldCompositor {
        &self.compositor
    }

    pub fn transient_source(&self) -> SourceId {
        self.transient_source
    }

    pub fn spectral_source(&self) -> SourceId {
        self.spectral_source
    }

    /// Theoretical merged range for display normalization
    pub fn value_range(&self) -> ValueRange {
        self.compositor.value_range()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Engine plus its collaborators, driven once per rendering tick
pub struct FrameDriver<A, C, R> {
    engine: FieldEngine,
    analyzer: A,
    classifier: C,
    renderer: R,
}

impl<A, C, R> FrameDriver<A, C, R>
where
    A: SpectralAnalyzer,
    C: FeatureClassifier,
    R: Renderer,
{
    pub fn new(engine: FieldEngine, analyzer: A, classifier: C, renderer: R) -> Self {
        Self {
            engine,
            analyzer,
            classifier,
            renderer,
        }
    }

    /// Analyse `audio`, step the engine, and hand the payload to the renderer
    pub fn update_frame(&mut self, dt: f32, audio: &[f32], trigger: bool, current_time: f32) {
        let spectrum = {
            let s = &self.engine.config().spectrum;
            self.analyzer
                .compute_spectral_frame(audio, s.low_hz, s.high_hz, s.num_bins)
        };
        let feature = self.classifier.classify_feature(audio);

        let payload = self.engine.step(&FrameInput {
            dt,
            current_time,
            spectrum: &spectrum,
            trigger,
            feature: &feature,
        });
        self.renderer.render(&payload);
    }

    pub fn engine(&self) -> &FieldEngine {
        &self.engine
    }

    /// Engine access between frames (e.g. scheduled triggers, source buffers)
    pub fn engine_mut(&mut self) -> &mut FieldEngine {
        &mut self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Give back the renderer (e.g. to flush recorded output)
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
