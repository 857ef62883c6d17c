//! Carrier insertion system
//!
//! Owns every carrier on the machine and the single yarn inserting hook.

use tracing::{debug, warn};

use super::{Carrier, CarrierId, CarrierSet};
use crate::error::{MachineError, Result};
use crate::knit_graph::YarnId;

/// State of all carriers and the yarn inserting hook
#[derive(Debug, Clone)]
pub struct CarrierSystem {
    carriers: Vec<Carrier>,
    hook_size: usize,
    hooked: Option<CarrierId>,
}

impl CarrierSystem {
    /// Create carriers `1..=carrier_count`, all inactive
    pub fn new(carrier_count: usize, hook_size: usize) -> Self {
        Self {
            carriers: (1..=carrier_count)
                .map(|id| Carrier::new(CarrierId::new(id)))
                .collect(),
            hook_size,
            hooked: None,
        }
    }

    pub fn carrier_count(&self) -> usize {
        self.carriers.len()
    }

    /// Number of needles blocked by the yarn inserting hook
    pub fn hook_size(&self) -> usize {
        self.hook_size
    }

    /// Carrier currently held by the yarn inserting hook
    pub fn hooked_carrier(&self) -> Option<CarrierId> {
        self.hooked
    }

    pub fn carrier(&self, id: CarrierId) -> Result<&Carrier> {
        id.0.checked_sub(1)
            .and_then(|index| self.carriers.get(index))
            .ok_or(MachineError::UnknownCarrier {
                carrier: id,
                carrier_count: self.carriers.len(),
            })
    }

    fn carrier_mut(&mut self, id: CarrierId) -> Result<&mut Carrier> {
        let carrier_count = self.carriers.len();
        id.0.checked_sub(1)
            .and_then(|index| self.carriers.get_mut(index))
            .ok_or(MachineError::UnknownCarrier {
                carrier: id,
                carrier_count,
            })
    }

    pub fn carriers(&self) -> impl Iterator<Item = &Carrier> {
        self.carriers.iter()
    }

    /// Carriers currently in service
    pub fn active_carriers(&self) -> Vec<CarrierId> {
        self.carriers
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.id())
            .collect()
    }

    /// True if the carrier exists and is in service
    pub fn is_active(&self, id: CarrierId) -> bool {
        self.carrier(id).map(|c| c.is_active()).unwrap_or(false)
    }

    pub fn bring_in(&mut self, id: CarrierId) -> Result<()> {
        self.carrier_mut(id)?.bring_in()
    }

    /// Bring a carrier in on the yarn inserting hook
    pub fn inhook(&mut self, id: CarrierId) -> Result<()> {
        let carrier = self.carrier(id)?;
        if carrier.is_active() {
            return Err(MachineError::CarrierAlreadyActive { carrier: id });
        }
        if let Some(hooked) = self.hooked {
            return Err(MachineError::HookInUse {
                carrier: id,
                hooked,
            });
        }
        self.carrier_mut(id)?.inhook()?;
        self.hooked = Some(id);
        Ok(())
    }

    /// Release a carrier's yarn from the yarn inserting hook
    pub fn releasehook(&mut self, id: CarrierId) -> Result<()> {
        self.carrier_mut(id)?.releasehook()?;
        if self.hooked == Some(id) {
            self.hooked = None;
        }
        Ok(())
    }

    pub fn out(&mut self, id: CarrierId) -> Result<()> {
        self.carrier_mut(id)?.out()
    }

    /// Take a carrier out and cut its yarn
    pub fn outhook(&mut self, id: CarrierId) -> Result<()> {
        self.carrier_mut(id)?.outhook()
    }

    /// Fail with carrier-not-in-service unless every carrier of the set is active
    pub fn check_in_service(&self, carriers: &CarrierSet) -> Result<()> {
        for id in carriers.iter() {
            if !self.carrier(id)?.is_active() {
                return Err(MachineError::CarrierNotInService { carrier: id });
            }
        }
        Ok(())
    }

    /// Count one loop for each carrier of the set and return the yarns used
    pub fn make_loop(&mut self, carriers: &CarrierSet) -> Result<Vec<YarnId>> {
        self.check_in_service(carriers)?;
        let hook_size = self.hook_size;
        let mut yarns = Vec::with_capacity(carriers.len());
        for id in carriers.iter() {
            let carrier = self.carrier_mut(id)?;
            carrier.count_loop();
            if carrier.is_hooked() && carrier.loops_since_release() > hook_size {
                warn!(
                    carrier = %id,
                    loops = carrier.loops_since_release(),
                    hook_size,
                    "hooked carrier has made more loops than the hook can hold"
                );
            }
            yarns.push(carrier.yarn());
        }
        debug!(carriers = %carriers, "loop made");
        Ok(yarns)
    }
}
