//! Band presets, serialized as JSON.

use crate::graph::{BandId, FilterGraph, GraphError};
use parafilt_params::NUM_BANDS;
use serde::{Deserialize, Serialize};

/// One band's settings in a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandPreset {
    pub freq: f64,
    pub bandwidth: f64,
    #[serde(default)]
    pub gain_db: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A whole graph: master section plus up to four bands, first to last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPreset {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default)]
    pub master_gain: f64,
    #[serde(default)]
    pub master_enabled: bool,
    pub bands: Vec<BandPreset>,
}

fn default_sample_rate() -> f64 {
    parafilt_iir::DEFAULT_SRATE
}

impl FilterGraph {
    /// Builds a graph from a preset. Bands beyond those listed stay at
    /// their parked defaults, disabled.
    pub fn from_preset(preset: &GraphPreset) -> Result<Self, GraphError> {
        if preset.bands.len() > NUM_BANDS {
            return Err(GraphError::TooManyBands {
                got: preset.bands.len(),
                max: NUM_BANDS,
            });
        }

        let mut graph = FilterGraph::new(preset.sample_rate)?;
        graph.set_master_gain(preset.master_gain);
        graph.set_master_enabled(preset.master_enabled);
        for (i, band) in preset.bands.iter().enumerate() {
            let id = BandId(i);
            graph.set_band_params(id, band.freq, band.bandwidth, band.gain_db)?;
            graph.set_band_enabled(id, band.enabled)?;
        }
        Ok(graph)
    }

    /// Captures the graph's current state as a preset.
    pub fn to_preset(&self) -> GraphPreset {
        GraphPreset {
            sample_rate: self.srate(),
            master_gain: self.master_gain(),
            master_enabled: self.master_enabled(),
            bands: self
                .bands()
                .iter()
                .map(|band| {
                    let p = band.filter().params();
                    BandPreset {
                        freq: p.freq,
                        bandwidth: p.bandwidth,
                        gain_db: p.gain_db,
                        enabled: band.enabled(),
                    }
                })
                .collect(),
        }
    }
}
