#![doc = include_str!("../README.md")]

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Empirical factor tying the UI-facing bandwidth parameter to the pole
/// spacing of the filter. A fixed design constant: changing it changes
/// the audible filter shape.
pub const BANDWIDTH_SCALE: f64 = 7.0;

/// Default sample rate in Hz.
pub const DEFAULT_SRATE: f64 = 48000.0;

/// Errors raised when a filter band is given out-of-domain parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("center frequency {freq} Hz must be strictly positive and below Nyquist ({nyquist} Hz)")]
    FrequencyOutOfRange { freq: f64, nyquist: f64 },

    #[error("bandwidth must be strictly positive, got {0}")]
    NonPositiveBandwidth(f64),
}

/// The user-facing parameter triple of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    /// Center frequency in Hz
    pub freq: f64,
    /// Bandwidth, a dimensionless octaves-like ratio feeding the filter Q
    pub bandwidth: f64,
    /// Gain in dB; negative cuts, positive boosts
    pub gain_db: f64,
}

impl Default for BandParams {
    fn default() -> Self {
        BandParams {
            freq: 1000.0,
            bandwidth: 1.0,
            gain_db: 0.0,
        }
    }
}

/// A single second-order peaking filter band.
///
/// The band is a plain value: no interior locking, no shared state. It is
/// `Send` and `Clone`, but calling `set_params` on one thread while another
/// thread calls `response_db` on the same instance is a data race; callers
/// needing cross-thread access must snapshot the band (clone it) or bring
/// their own synchronization.
#[derive(Debug, Clone)]
pub struct FilterBand {
    /// Sample rate in Hz, fixed at construction
    srate: f64,
    /// Current design parameters
    params: BandParams,
    /// Derived coefficients, always consistent with `params`
    gn: f64,
    v1: f64,
    v2: f64,
}

impl FilterBand {
    /// Creates a flat (0 dB everywhere) band bound to `srate`.
    ///
    /// The sample rate is immutable for the band's lifetime; a sample-rate
    /// change means constructing a new band.
    pub fn flat(srate: f64) -> Self {
        FilterBand {
            srate,
            params: BandParams::default(),
            gn: 0.0,
            v1: 0.0,
            v2: 0.0,
        }
    }

    /// Creates a band and designs it in one step.
    pub fn new(srate: f64, freq: f64, bandwidth: f64, gain_db: f64) -> Result<Self, FilterError> {
        let mut band = Self::flat(srate);
        band.set_params(freq, bandwidth, gain_db)?;
        Ok(band)
    }

    /// Redesigns the band for a new `(freq, bandwidth, gain_db)` triple.
    ///
    /// Coefficients are recomputed synchronously before the call returns;
    /// there is never partially-updated state visible to callers. On error
    /// the previous design is kept untouched.
    ///
    /// `freq` must lie strictly between 0 and Nyquist and `bandwidth` must
    /// be strictly positive. A frequency at or above Nyquist would still
    /// produce finite coefficients, but the resulting curve is meaningless,
    /// so it is rejected here rather than left to the caller.
    pub fn set_params(&mut self, freq: f64, bandwidth: f64, gain_db: f64) -> Result<(), FilterError> {
        let nyquist = self.srate / 2.0;
        if !(freq > 0.0 && freq < nyquist) {
            return Err(FilterError::FrequencyOutOfRange { freq, nyquist });
        }
        if !(bandwidth > 0.0) {
            return Err(FilterError::NonPositiveBandwidth(bandwidth));
        }

        let freq_ratio = freq / self.srate;
        let gain = 10.0_f64.powf(0.05 * gain_db);
        let b = BANDWIDTH_SCALE * bandwidth * freq_ratio / gain.sqrt();

        // Order matters: v2 is derived from b first, then v1 and gn are
        // each rescaled by the finished v2.
        self.v2 = (1.0 - b) / (1.0 + b);
        self.v1 = -(2.0 * PI * freq_ratio).cos() * (1.0 + self.v2);
        self.gn = 0.5 * (gain - 1.0) * (1.0 - self.v2);

        self.params = BandParams {
            freq,
            bandwidth,
            gain_db,
        };
        Ok(())
    }

    /// Gain of the band in dB at frequency `f`, from the current design.
    ///
    /// Pure function of `f` and the coefficients; every call recomputes
    /// from scratch, so there is no accumulating state and no drift at any
    /// call rate. A degenerate design (flat-point magnitude of zero) yields
    /// a non-finite value, which is returned unchanged; display code is
    /// responsible for clamping.
    pub fn response_db(&self, f: f64) -> f64 {
        let w = 2.0 * PI * f / self.srate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let flat = Complex64::new(c2 + self.v1 * c1 + self.v2, s2 + self.v1 * s1);
        let boosted = flat + Complex64::new(self.gn * (c2 - 1.0), self.gn * s2);

        20.0 * (boosted.norm() / flat.norm()).log10()
    }

    /// Evaluates the response in dB over a frequency grid.
    pub fn response_curve(&self, freqs: &Array1<f64>) -> Array1<f64> {
        freqs.mapv(|f| self.response_db(f))
    }

    /// Current design parameters.
    pub fn params(&self) -> BandParams {
        self.params
    }

    /// Sample rate the band was built for, in Hz.
    pub fn srate(&self) -> f64 {
        self.srate
    }

    /// Returns the derived coefficients as a `(gn, v1, v2)` tuple.
    pub fn constants(&self) -> (f64, f64, f64) {
        (self.gn, self.v1, self.v2)
    }
}

impl fmt::Display for FilterBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Freq:{:.1},Rate:{:.1},Bw:{:.3},Gain:{:.1}",
            self.params.freq, self.srate, self.params.bandwidth, self.params.gain_db
        )
    }
}
