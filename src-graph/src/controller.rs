//! Port-level front end: applies port writes to the band graph and
//! notifies listeners. A GUI binds its controls here instead of wiring
//! toolkit signals straight into the filters.

use crate::graph::{BandId, FilterGraph, GraphError};
use parafilt_params::{
    BandRole, ParamBank, ParamError, ParamKind, ParamListener, PortId, PortTarget, band_port,
    port_target,
};

/// Equalizer state addressed by port index.
///
/// A write validates against the port table, updates the matching band or
/// master field, and only then notifies every registered listener,
/// synchronously and in registration order. A rejected write changes
/// nothing and notifies nobody.
pub struct EqController {
    params: ParamBank,
    graph: FilterGraph,
    listeners: Vec<Box<dyn ParamListener>>,
}

impl EqController {
    /// Controller over a freshly parked graph at `srate`.
    pub fn new(srate: f64) -> Result<Self, GraphError> {
        Ok(EqController {
            params: ParamBank::new(),
            graph: FilterGraph::new(srate)?,
            listeners: Vec::new(),
        })
    }

    pub fn params(&self) -> &ParamBank {
        &self.params
    }

    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Registers a listener for subsequent port changes.
    pub fn add_listener(&mut self, listener: Box<dyn ParamListener>) {
        self.listeners.push(listener);
    }

    /// Writes a real value to a port. Toggles take 0.0 / 1.0 with any
    /// value above zero reading as "on".
    pub fn set_port(&mut self, port: PortId, value: f64) -> Result<(), GraphError> {
        let previous = self.params.value(port)?;
        self.params.set_value(port, value)?;

        let target = match port_target(port) {
            Some(target) => target,
            None => return Err(ParamError::UnknownPort(port).into()),
        };

        match target {
            PortTarget::MasterActive => self.graph.set_master_enabled(value > 0.0),
            PortTarget::MasterGain => self.graph.set_master_gain(value),
            PortTarget::Band(band, BandRole::Active) => {
                self.graph.set_band_enabled(BandId(band), value > 0.0)?;
            }
            PortTarget::Band(band, _) => {
                let freq = self.params.value(band_port(band, BandRole::Frequency))?;
                let bandwidth = self.params.value(band_port(band, BandRole::Bandwidth))?;
                let gain_db = self.params.value(band_port(band, BandRole::Gain))?;
                if let Err(err) =
                    self.graph
                        .set_band_params(BandId(band), freq, bandwidth, gain_db)
                {
                    // Knob ranges normally keep the design valid; if the
                    // filter still refuses, roll the port back.
                    self.params.set_value(port, previous)?;
                    return Err(err);
                }
            }
        }

        for listener in &mut self.listeners {
            listener.param_changed(port, value);
        }
        Ok(())
    }

    /// Writes a knob position in [0, 1], returning the real value it
    /// mapped to.
    pub fn set_port_normalized(&mut self, port: PortId, t: f64) -> Result<f64, GraphError> {
        let value = match self.params.descriptor(port)?.kind {
            ParamKind::Knob { range, .. } => range.from_normalized(t),
            ParamKind::Toggle { .. } => return Err(ParamError::NotAKnob(port).into()),
        };
        self.set_port(port, value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parafilt_params::{MASTER_ACTIVE_PORT, MASTER_GAIN_PORT, NUM_PORTS};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        events: Rc<RefCell<Vec<(PortId, f64)>>>,
    }

    impl ParamListener for Recorder {
        fn param_changed(&mut self, port: PortId, value: f64) {
            self.events.borrow_mut().push((port, value));
        }
    }

    #[test]
    fn band_ports_drive_the_filter() {
        let mut ctl = EqController::new(48000.0).unwrap();
        ctl.set_port(band_port(0, BandRole::Frequency), 1000.0).unwrap();
        ctl.set_port(band_port(0, BandRole::Bandwidth), 1.0).unwrap();
        ctl.set_port(band_port(0, BandRole::Gain), 6.0).unwrap();
        ctl.set_port(band_port(0, BandRole::Active), 1.0).unwrap();
        ctl.set_port(MASTER_GAIN_PORT, 0.0).unwrap();

        let p = ctl.graph().band_params(BandId(0)).unwrap();
        assert_eq!((p.freq, p.bandwidth, p.gain_db), (1000.0, 1.0, 6.0));
        assert!(ctl.graph().band(BandId(0)).unwrap().enabled());
        assert!((ctl.graph().response_db(1000.0) - 6.0).abs() < 0.5);
    }

    #[test]
    fn master_ports_drive_the_master_section() {
        let mut ctl = EqController::new(48000.0).unwrap();
        ctl.set_port(MASTER_GAIN_PORT, -4.0).unwrap();
        assert_eq!(ctl.graph().master_gain(), -4.0);

        ctl.set_port(MASTER_ACTIVE_PORT, 1.0).unwrap();
        assert!(ctl.graph().master_enabled());
        ctl.set_port(MASTER_ACTIVE_PORT, 0.0).unwrap();
        assert!(!ctl.graph().master_enabled());
    }

    #[test]
    fn listeners_hear_accepted_writes_only() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut ctl = EqController::new(48000.0).unwrap();
        ctl.add_listener(Box::new(Recorder {
            events: events.clone(),
        }));

        let gain_port = band_port(1, BandRole::Gain);
        ctl.set_port(gain_port, 3.0).unwrap();
        assert!(ctl.set_port(gain_port, 99.0).is_err());
        assert!(ctl.set_port(NUM_PORTS, 1.0).is_err());

        assert_eq!(events.borrow().as_slice(), &[(gain_port, 3.0)]);
        // The rejected write left the stored value alone.
        assert_eq!(ctl.params().value(gain_port), Ok(3.0));
    }

    #[test]
    fn normalized_writes_land_inside_the_knob_range() {
        let mut ctl = EqController::new(48000.0).unwrap();
        let freq_port = band_port(3, BandRole::Frequency);

        let hz = ctl.set_port_normalized(freq_port, 1.0).unwrap();
        assert!((hz - 20000.0).abs() < 1e-9);
        assert_eq!(ctl.graph().band_params(BandId(3)).unwrap().freq, hz);

        // Out-of-range positions clamp instead of failing.
        let hz = ctl.set_port_normalized(freq_port, 2.0).unwrap();
        assert!((hz - 20000.0).abs() < 1e-9);

        assert!(matches!(
            ctl.set_port_normalized(MASTER_ACTIVE_PORT, 0.5),
            Err(GraphError::Param(ParamError::NotAKnob(_)))
        ));
    }
}
