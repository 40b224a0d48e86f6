//! Weighted merge of per-source node buffers into the authoritative field.

use log::debug;

/// Closed interval of values a field can theoretically take
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Range spanning both endpoints in either order
    pub fn new(a: f32, b: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Range of `weight * x` for `x` in this range
    pub fn scaled(&self, weight: f32) -> Self {
        Self::new(self.min * weight, self.max * weight)
    }

    /// Range of `x + y` for `x` in self and `y` in other
    pub fn sum(&self, other: &Self) -> Self {
        Self {
            min: self.min + other.min,
            max: self.max + other.max,
        }
    }

    /// Map `value` onto `[0, 1]`, clamping outliers; degenerate ranges map to 0
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if span > 0.0 && value.is_finite() {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Handle returned when a source registers with the compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

#[derive(Debug, Clone)]
struct SourceSlot {
    name: String,
    weight: f32,
    range: ValueRange,
}

/// Merges any number of registered sources: `merged[i] = Σ weight · source[i]`.
///
/// No clamping is applied; [`value_range`](Self::value_range) reports the
/// theoretical bounds so renderers can normalize for display.
pub struct FieldCompositor {
    sources: Vec<SourceSlot>,
    merged: Vec<f32>,
}

impl FieldCompositor {
    pub fn new(node_count: usize) -> Self {
        Self {
            sources: Vec::new(),
            merged: vec![0.0; node_count],
        }
    }

    /// Register a contributing source with its combination weight and value range
    pub fn register(&mut self, name: impl Into<String>, weight: f32, range: ValueRange) -> SourceId {
        let name = name.into();
        debug!("Compositor: registered source '{name}' (weight {weight})");
        self.sources.push(SourceSlot {
            name,
            weight,
            range,
        });
        SourceId(self.sources.len() - 1)
    }

    pub fn set_weight(&mut self, id: SourceId, weight: f32) {
        self.sources[id.0].weight = weight;
    }

    pub fn set_range(&mut self, id: SourceId, range: ValueRange) {
        self.sources[id.0].range = range;
    }

    pub fn weight(&self, id: SourceId) -> f32 {
        self.sources[id.0].weight
    }

    pub fn name(&self, id: SourceId) -> &str {
        &self.sources[id.0].name
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// True if `id` was issued by this compositor
    pub fn contains(&self, id: SourceId) -> bool {
        id.0 < self.sources.len()
    }

    /// Recompute the merged field from scratch.
    ///
    /// Sources absent from `inputs`, and entries past the end of a short
    /// buffer, contribute zero.
    pub fn compose(&mut self, inputs: &[(SourceId, &[f32])]) -> &[f32] {
        self.merged.fill(0.0);
        for (id, buffer) in inputs {
            let weight = self.sources[id.0].weight;
            for (out, value) in self.merged.iter_mut().zip(buffer.iter()) {
                *out += weight * value;
            }
        }
        &self.merged
    }

    /// Most recently composed field
    pub fn merged(&self) -> &[f32] {
        &self.merged
    }

    /// Theoretical range of the merged field
    pub fn value_range(&self) -> ValueRange {
        self.sources
            .iter()
            .fold(ValueRange::ZERO, |acc, s| acc.sum(&s.range.scaled(s.weight)))
    }
}
