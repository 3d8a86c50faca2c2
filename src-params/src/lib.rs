//! Parameter layer for the parafilt equalizer.
//!
//! Describes the plugin's port table (master section plus four filter
//! bands), maps control positions in [0, 1] to real parameter values and
//! back, validates writes, and defines the listener interface through
//! which parameter changes are delivered synchronously to observers.
//! Nothing here depends on a GUI toolkit: a knob, an automation lane and a
//! test all drive the same `ParamBank`.

use serde::{Deserialize, Serialize};

/// Index of a port in the parameter table.
pub type PortId = usize;

/// Port of the master Active toggle.
pub const MASTER_ACTIVE_PORT: PortId = 0;
/// Port of the master Gain knob.
pub const MASTER_GAIN_PORT: PortId = 1;
/// First band port; band ports follow the master section.
pub const BAND_PORT_BASE: PortId = 2;
/// Ports per band: Active, Frequency, Bandwidth, Gain.
pub const PORTS_PER_BAND: usize = 4;
/// Number of filter bands.
pub const NUM_BANDS: usize = 4;
/// Total number of ports.
pub const NUM_PORTS: usize = BAND_PORT_BASE + NUM_BANDS * PORTS_PER_BAND;

/// Frequency knob minimum per band, in Hz.
pub const BAND_FREQ_MIN: [f64; NUM_BANDS] = [20.0, 40.0, 100.0, 200.0];
/// Frequency knob maximum per band, in Hz.
pub const BAND_FREQ_MAX: [f64; NUM_BANDS] = [2000.0, 4000.0, 10000.0, 20000.0];
/// Bandwidth knob range (dimensionless, logarithmic).
pub const BANDWIDTH_MIN: f64 = 0.125;
pub const BANDWIDTH_MAX: f64 = 8.0;
/// Gain knob range in dB (linear), shared by band and master gains.
pub const GAIN_MIN_DB: f64 = -20.0;
pub const GAIN_MAX_DB: f64 = 20.0;

/// Errors raised by parameter writes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown port {0}")]
    UnknownPort(PortId),

    #[error("value {value} for port {port} is outside [{min}, {max}]")]
    OutOfRange {
        port: PortId,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("port {0} is a toggle, not a continuous control")]
    NotAKnob(PortId),
}

/// A continuous control range with its normalization curve.
///
/// `log` ranges (frequency, bandwidth) spread control resolution evenly in
/// octaves and require `min > 0`; linear ranges (gain) spread it evenly in
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub log: bool,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64) -> Self {
        ParamRange {
            min,
            max,
            log: false,
        }
    }

    pub fn logarithmic(min: f64, max: f64) -> Self {
        ParamRange {
            min,
            max,
            log: true,
        }
    }

    /// Maps a real value to its normalized [0, 1] control position.
    pub fn to_normalized(&self, value: f64) -> f64 {
        if self.log {
            (value / self.min).ln() / (self.max / self.min).ln()
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    /// Maps a control position to a real value; positions are clamped to
    /// [0, 1] first, so the result always lies inside the range.
    pub fn from_normalized(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if self.log {
            self.min * (self.max / self.min).powf(t)
        } else {
            t * (self.max - self.min) + self.min
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// What kind of control a port carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// On/off switch, transported as 0.0 / 1.0.
    Toggle { default: bool },
    /// Continuous knob with a range and display unit.
    Knob {
        range: ParamRange,
        default: f64,
        unit: &'static str,
    },
}

/// Static description of one port.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub port: PortId,
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    fn toggle(port: PortId, name: &'static str) -> Self {
        ParamDescriptor {
            port,
            name,
            kind: ParamKind::Toggle { default: false },
        }
    }

    fn knob(port: PortId, name: &'static str, range: ParamRange, unit: &'static str) -> Self {
        ParamDescriptor {
            port,
            name,
            kind: ParamKind::Knob {
                range,
                // Knobs come up at their minimum.
                default: range.min,
                unit,
            },
        }
    }

    /// Default port value, with toggles encoded as 0.0 / 1.0.
    pub fn default_value(&self) -> f64 {
        match self.kind {
            ParamKind::Toggle { default } => {
                if default {
                    1.0
                } else {
                    0.0
                }
            }
            ParamKind::Knob { default, .. } => default,
        }
    }

    /// Checks a prospective value against the port's constraints.
    pub fn validate(&self, value: f64) -> Result<(), ParamError> {
        match self.kind {
            // Any float is a legal toggle value; > 0.0 means "on".
            ParamKind::Toggle { .. } => Ok(()),
            ParamKind::Knob { range, .. } => {
                if range.contains(value) {
                    Ok(())
                } else {
                    Err(ParamError::OutOfRange {
                        port: self.port,
                        value,
                        min: range.min,
                        max: range.max,
                    })
                }
            }
        }
    }

    /// Renders a value for display, with precision falling as magnitude
    /// grows and the unit appended.
    pub fn format_value(&self, value: f64) -> String {
        match self.kind {
            ParamKind::Toggle { .. } => {
                let state = if value > 0.0 { "on" } else { "off" };
                state.to_string()
            }
            ParamKind::Knob { unit, .. } => {
                let text = if value >= 10000.0 {
                    format!("{:.0}", value)
                } else if value >= 1000.0 {
                    format!("{:.1}", value)
                } else {
                    format!("{:.2}", value)
                };
                if unit.is_empty() {
                    text
                } else {
                    format!("{} {}", text, unit)
                }
            }
        }
    }
}

/// Band-relative role of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandRole {
    Active,
    Frequency,
    Bandwidth,
    Gain,
}

/// What a port addresses: the master section or a band control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortTarget {
    MasterActive,
    MasterGain,
    Band(usize, BandRole),
}

/// Port index of a band control. `band` must be below [`NUM_BANDS`].
pub fn band_port(band: usize, role: BandRole) -> PortId {
    let offset = match role {
        BandRole::Active => 0,
        BandRole::Frequency => 1,
        BandRole::Bandwidth => 2,
        BandRole::Gain => 3,
    };
    BAND_PORT_BASE + band * PORTS_PER_BAND + offset
}

/// Resolves a port index to its target; `None` for out-of-table ports.
pub fn port_target(port: PortId) -> Option<PortTarget> {
    match port {
        MASTER_ACTIVE_PORT => Some(PortTarget::MasterActive),
        MASTER_GAIN_PORT => Some(PortTarget::MasterGain),
        p if p < NUM_PORTS => {
            let band = (p - BAND_PORT_BASE) / PORTS_PER_BAND;
            let role = match (p - BAND_PORT_BASE) % PORTS_PER_BAND {
                0 => BandRole::Active,
                1 => BandRole::Frequency,
                2 => BandRole::Bandwidth,
                _ => BandRole::Gain,
            };
            Some(PortTarget::Band(band, role))
        }
        _ => None,
    }
}

/// Builds the full port table: master Active/Gain, then per band
/// Active, Frequency, Bandwidth, Gain.
pub fn default_layout() -> Vec<ParamDescriptor> {
    let gain_range = ParamRange::linear(GAIN_MIN_DB, GAIN_MAX_DB);
    let mut ports = vec![
        ParamDescriptor::toggle(MASTER_ACTIVE_PORT, "Active"),
        ParamDescriptor::knob(MASTER_GAIN_PORT, "Gain", gain_range, "dB"),
    ];

    for band in 0..NUM_BANDS {
        let freq_range = ParamRange::logarithmic(BAND_FREQ_MIN[band], BAND_FREQ_MAX[band]);
        let bw_range = ParamRange::logarithmic(BANDWIDTH_MIN, BANDWIDTH_MAX);
        ports.push(ParamDescriptor::toggle(
            band_port(band, BandRole::Active),
            "Active",
        ));
        ports.push(ParamDescriptor::knob(
            band_port(band, BandRole::Frequency),
            "Frequency",
            freq_range,
            "Hz",
        ));
        ports.push(ParamDescriptor::knob(
            band_port(band, BandRole::Bandwidth),
            "Bandwidth",
            bw_range,
            "",
        ));
        ports.push(ParamDescriptor::knob(
            band_port(band, BandRole::Gain),
            "Gain",
            gain_range,
            "dB",
        ));
    }

    ports
}

/// Observer for parameter changes, notified synchronously from the thread
/// performing the write. Toggles arrive as 0.0 / 1.0.
pub trait ParamListener {
    fn param_changed(&mut self, port: PortId, value: f64);
}

/// Current values of every port, validated against the port table.
#[derive(Debug, Clone)]
pub struct ParamBank {
    descriptors: Vec<ParamDescriptor>,
    values: Vec<f64>,
}

impl Default for ParamBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamBank {
    /// Bank over the default port table with every port at its default.
    pub fn new() -> Self {
        let descriptors = default_layout();
        let values = descriptors.iter().map(|d| d.default_value()).collect();
        ParamBank {
            descriptors,
            values,
        }
    }

    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, port: PortId) -> Result<&ParamDescriptor, ParamError> {
        self.descriptors
            .get(port)
            .ok_or(ParamError::UnknownPort(port))
    }

    /// Current value of a port.
    pub fn value(&self, port: PortId) -> Result<f64, ParamError> {
        self.values
            .get(port)
            .copied()
            .ok_or(ParamError::UnknownPort(port))
    }

    /// Validates and stores a real value, returning the stored value.
    pub fn set_value(&mut self, port: PortId, value: f64) -> Result<f64, ParamError> {
        self.descriptor(port)?.validate(value)?;
        self.values[port] = value;
        Ok(value)
    }

    /// Stores a knob position given as a normalized [0, 1] value,
    /// returning the real value it mapped to.
    pub fn set_normalized(&mut self, port: PortId, t: f64) -> Result<f64, ParamError> {
        let desc = self.descriptor(port)?;
        match desc.kind {
            ParamKind::Knob { range, .. } => {
                let value = range.from_normalized(t);
                self.values[port] = value;
                Ok(value)
            }
            ParamKind::Toggle { .. } => Err(ParamError::NotAKnob(port)),
        }
    }

    /// Normalized position of a knob's current value.
    pub fn normalized(&self, port: PortId) -> Result<f64, ParamError> {
        let desc = self.descriptor(port)?;
        match desc.kind {
            ParamKind::Knob { range, .. } => Ok(range.to_normalized(self.values[port])),
            ParamKind::Toggle { .. } => Err(ParamError::NotAKnob(port)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn linear_mapping_roundtrips() {
        let range = ParamRange::linear(-20.0, 20.0);
        assert!(approx_eq(range.from_normalized(0.5), 0.0, 1e-12));
        for v in [-20.0, -7.5, 0.0, 13.25, 20.0] {
            let t = range.to_normalized(v);
            assert!(approx_eq(range.from_normalized(t), v, 1e-9));
        }
    }

    #[test]
    fn log_mapping_roundtrips() {
        let range = ParamRange::logarithmic(20.0, 20000.0);
        assert!(approx_eq(range.to_normalized(20.0), 0.0, 1e-12));
        assert!(approx_eq(range.to_normalized(20000.0), 1.0, 1e-12));
        // Geometric midpoint sits at the middle of the control.
        assert!(approx_eq(range.from_normalized(0.5), 632.4555320336759, 1e-6));
        for v in [20.0, 155.0, 632.0, 6500.0, 20000.0] {
            let t = range.to_normalized(v);
            assert!(approx_eq(range.from_normalized(t), v, 1e-6));
        }
    }

    #[test]
    fn from_normalized_clamps_position() {
        let range = ParamRange::logarithmic(0.125, 8.0);
        assert_eq!(range.from_normalized(-0.5), 0.125);
        assert_eq!(range.from_normalized(1.5), 8.0);
    }

    #[test]
    fn port_table_matches_plugin_layout() {
        let ports = default_layout();
        assert_eq!(ports.len(), NUM_PORTS);
        assert_eq!(ports.len(), 18);

        assert_eq!(ports[MASTER_ACTIVE_PORT].name, "Active");
        assert_eq!(ports[MASTER_GAIN_PORT].name, "Gain");

        for band in 0..NUM_BANDS {
            let freq = &ports[band_port(band, BandRole::Frequency)];
            match freq.kind {
                ParamKind::Knob { range, unit, .. } => {
                    assert_eq!(range.min, BAND_FREQ_MIN[band]);
                    assert_eq!(range.max, BAND_FREQ_MAX[band]);
                    assert!(range.log);
                    assert_eq!(unit, "Hz");
                }
                _ => panic!("frequency port is not a knob"),
            }
        }

        // Descriptor ports agree with their table position.
        for (i, desc) in ports.iter().enumerate() {
            assert_eq!(desc.port, i);
        }
    }

    #[test]
    fn port_target_inverts_band_port() {
        for band in 0..NUM_BANDS {
            for role in [
                BandRole::Active,
                BandRole::Frequency,
                BandRole::Bandwidth,
                BandRole::Gain,
            ] {
                let port = band_port(band, role);
                assert_eq!(port_target(port), Some(PortTarget::Band(band, role)));
            }
        }
        assert_eq!(port_target(MASTER_ACTIVE_PORT), Some(PortTarget::MasterActive));
        assert_eq!(port_target(MASTER_GAIN_PORT), Some(PortTarget::MasterGain));
        assert_eq!(port_target(NUM_PORTS), None);
    }

    #[test]
    fn bank_validates_writes() {
        let mut bank = ParamBank::new();

        let gain_port = band_port(0, BandRole::Gain);
        assert_eq!(bank.set_value(gain_port, 6.0), Ok(6.0));
        assert_eq!(bank.value(gain_port), Ok(6.0));

        assert_eq!(
            bank.set_value(gain_port, 25.0),
            Err(ParamError::OutOfRange {
                port: gain_port,
                value: 25.0,
                min: GAIN_MIN_DB,
                max: GAIN_MAX_DB,
            })
        );
        // Rejected write leaves the stored value alone.
        assert_eq!(bank.value(gain_port), Ok(6.0));

        assert_eq!(bank.set_value(NUM_PORTS, 1.0), Err(ParamError::UnknownPort(NUM_PORTS)));
    }

    #[test]
    fn bank_defaults_to_knob_minimums() {
        let bank = ParamBank::new();
        assert_eq!(bank.value(MASTER_ACTIVE_PORT), Ok(0.0));
        assert_eq!(bank.value(MASTER_GAIN_PORT), Ok(GAIN_MIN_DB));
        for band in 0..NUM_BANDS {
            assert_eq!(
                bank.value(band_port(band, BandRole::Frequency)),
                Ok(BAND_FREQ_MIN[band])
            );
            assert_eq!(
                bank.value(band_port(band, BandRole::Bandwidth)),
                Ok(BANDWIDTH_MIN)
            );
        }
    }

    #[test]
    fn normalized_writes_map_through_range() {
        let mut bank = ParamBank::new();
        let freq_port = band_port(2, BandRole::Frequency);

        let v = bank.set_normalized(freq_port, 0.0).unwrap();
        assert!(approx_eq(v, 100.0, 1e-9));
        let v = bank.set_normalized(freq_port, 1.0).unwrap();
        assert!(approx_eq(v, 10000.0, 1e-9));
        assert!(approx_eq(bank.normalized(freq_port).unwrap(), 1.0, 1e-12));

        assert_eq!(
            bank.set_normalized(MASTER_ACTIVE_PORT, 0.5),
            Err(ParamError::NotAKnob(MASTER_ACTIVE_PORT))
        );
    }

    #[test]
    fn values_format_like_the_plugin_ui() {
        let ports = default_layout();
        let freq = &ports[band_port(3, BandRole::Frequency)];
        assert_eq!(freq.format_value(20000.0), "20000 Hz");
        assert_eq!(freq.format_value(1234.5), "1234.5 Hz");
        assert_eq!(freq.format_value(200.0), "200.00 Hz");

        let bw = &ports[band_port(0, BandRole::Bandwidth)];
        assert_eq!(bw.format_value(0.5), "0.50");

        let active = &ports[MASTER_ACTIVE_PORT];
        assert_eq!(active.format_value(1.0), "on");
        assert_eq!(active.format_value(0.0), "off");
    }
}
