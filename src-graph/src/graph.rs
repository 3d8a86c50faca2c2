//! Ordered band collection and summed response.

use ndarray::Array1;
use parafilt_iir::{BandParams, FilterBand, FilterError};
use parafilt_params::{BAND_FREQ_MIN, BANDWIDTH_MIN, GAIN_MIN_DB, NUM_BANDS, ParamError};
use std::fmt;

/// Default curve grid: 300 log-spaced points across the audible range.
pub const CURVE_POINTS: usize = 300;
pub const CURVE_FREQ_MIN: f64 = 20.0;
pub const CURVE_FREQ_MAX: f64 = 20000.0;

/// Stable identifier of a band: its position in the graph, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BandId(pub usize);

impl fmt::Display for BandId {
    /// Bands display 1-based, matching the knob labels on the plugin face.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// Errors raised by graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("no band {0} in the graph")]
    UnknownBand(BandId),

    #[error("preset has {got} bands, the graph holds at most {max}")]
    TooManyBands { got: usize, max: usize },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Param(#[from] ParamError),
}

/// One equalizer band: a filter plus its enabled flag.
#[derive(Debug, Clone)]
pub struct Band {
    id: BandId,
    filter: FilterBand,
    enabled: bool,
}

impl Band {
    pub fn id(&self) -> BandId {
        self.id
    }

    pub fn filter(&self) -> &FilterBand {
        &self.filter
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// The four filter bands plus the master section.
///
/// The summed response is the master gain plus the straight dB sum of
/// every enabled band. Adding dB values approximates the true cascade
/// and is accepted as a design approximation, same as the plot the
/// plugin UI draws.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    srate: f64,
    bands: Vec<Band>,
    master_gain: f64,
    master_enabled: bool,
}

impl FilterGraph {
    /// Builds a graph with every band disabled and parked at its knob
    /// minimums, like the plugin comes up.
    pub fn new(srate: f64) -> Result<Self, GraphError> {
        let mut bands = Vec::with_capacity(NUM_BANDS);
        for i in 0..NUM_BANDS {
            bands.push(Band {
                id: BandId(i),
                filter: FilterBand::new(srate, BAND_FREQ_MIN[i], BANDWIDTH_MIN, GAIN_MIN_DB)?,
                enabled: false,
            });
        }
        Ok(FilterGraph {
            srate,
            bands,
            master_gain: GAIN_MIN_DB,
            master_enabled: false,
        })
    }

    /// Rebuilds the graph for a new sample rate, re-deriving every band's
    /// coefficients from its current parameters. Band state (parameters,
    /// enabled flags, master section) carries over.
    pub fn with_sample_rate(&self, srate: f64) -> Result<Self, GraphError> {
        let mut bands = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let p = band.filter.params();
            bands.push(Band {
                id: band.id,
                filter: FilterBand::new(srate, p.freq, p.bandwidth, p.gain_db)?,
                enabled: band.enabled,
            });
        }
        Ok(FilterGraph {
            srate,
            bands,
            master_gain: self.master_gain,
            master_enabled: self.master_enabled,
        })
    }

    pub fn srate(&self) -> f64 {
        self.srate
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, id: BandId) -> Result<&Band, GraphError> {
        self.bands.get(id.0).ok_or(GraphError::UnknownBand(id))
    }

    fn band_mut(&mut self, id: BandId) -> Result<&mut Band, GraphError> {
        self.bands.get_mut(id.0).ok_or(GraphError::UnknownBand(id))
    }

    /// Redesigns one band. Errors leave the band's previous design intact.
    pub fn set_band_params(
        &mut self,
        id: BandId,
        freq: f64,
        bandwidth: f64,
        gain_db: f64,
    ) -> Result<(), GraphError> {
        self.band_mut(id)?
            .filter
            .set_params(freq, bandwidth, gain_db)?;
        Ok(())
    }

    pub fn band_params(&self, id: BandId) -> Result<BandParams, GraphError> {
        Ok(self.band(id)?.filter.params())
    }

    pub fn set_band_enabled(&mut self, id: BandId, enabled: bool) -> Result<(), GraphError> {
        self.band_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn set_master_gain(&mut self, gain_db: f64) {
        self.master_gain = gain_db;
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    /// Whether the summed curve is shown. Purely a consumer-facing flag;
    /// `response_db` computes the sum either way.
    pub fn set_master_enabled(&mut self, enabled: bool) {
        self.master_enabled = enabled;
    }

    pub fn master_enabled(&self) -> bool {
        self.master_enabled
    }

    /// Response of one band in dB, regardless of its enabled flag.
    pub fn band_response_db(&self, id: BandId, freq: f64) -> Result<f64, GraphError> {
        Ok(self.band(id)?.filter.response_db(freq))
    }

    /// Summed response in dB: master gain plus every enabled band.
    pub fn response_db(&self, freq: f64) -> f64 {
        let mut db = self.master_gain;
        for band in &self.bands {
            if band.enabled {
                db += band.filter.response_db(freq);
            }
        }
        db
    }

    /// Summed response over a frequency grid.
    pub fn response_curve(&self, freqs: &Array1<f64>) -> Array1<f64> {
        freqs.mapv(|f| self.response_db(f))
    }
}

/// Log-spaced frequency grid between `fmin` and `fmax`, inclusive.
pub fn log_grid(fmin: f64, fmax: f64, points: usize) -> Array1<f64> {
    Array1::logspace(10.0, fmin.log10(), fmax.log10(), points)
}

/// The grid the plot code samples: 20 Hz to 20 kHz at 300 points.
pub fn default_grid() -> Array1<f64> {
    log_grid(CURVE_FREQ_MIN, CURVE_FREQ_MAX, CURVE_POINTS)
}
