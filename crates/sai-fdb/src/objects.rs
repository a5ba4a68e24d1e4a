//! Port, LAG and VLAN bookkeeping consumed by the FDB cache.
//!
//! The cache never owns these objects. It only asks whether an object id or
//! VLAN is usable, through [`SwitchObjects`].

use dashmap::DashSet;
use sai_common::{SaiObjectId, VlanId};

/// Validity checks the FDB cache needs from the port/LAG/VLAN modules.
pub trait SwitchObjects: Send + Sync {
    fn is_port_valid(&self, port: SaiObjectId) -> bool;

    fn is_lag_created(&self, lag: SaiObjectId) -> bool;

    fn is_vlan_created(&self, vlan: VlanId) -> bool;
}

/// In-memory [`SwitchObjects`] implementation.
///
/// Backs the replay tool and tests; ports, LAGs and VLANs are added and
/// removed explicitly.
#[derive(Debug, Default)]
pub struct SwitchObjectRegistry {
    ports: DashSet<SaiObjectId>,
    lags: DashSet<SaiObjectId>,
    vlans: DashSet<VlanId>,
}

impl SwitchObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_port(&self, port: SaiObjectId) {
        self.ports.insert(port);
    }

    pub fn remove_port(&self, port: SaiObjectId) -> bool {
        self.ports.remove(&port).is_some()
    }

    pub fn create_lag(&self, lag: SaiObjectId) {
        self.lags.insert(lag);
    }

    pub fn remove_lag(&self, lag: SaiObjectId) -> bool {
        self.lags.remove(&lag).is_some()
    }

    pub fn create_vlan(&self, vlan: VlanId) {
        self.vlans.insert(vlan);
    }

    pub fn remove_vlan(&self, vlan: VlanId) -> bool {
        self.vlans.remove(&vlan).is_some()
    }
}

impl SwitchObjects for SwitchObjectRegistry {
    fn is_port_valid(&self, port: SaiObjectId) -> bool {
        self.ports.contains(&port)
    }

    fn is_lag_created(&self, lag: SaiObjectId) -> bool {
        self.lags.contains(&lag)
    }

    fn is_vlan_created(&self, vlan: VlanId) -> bool {
        self.vlans.contains(&vlan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sai_common::SaiObjectType;

    #[test]
    fn test_registry_tracks_objects() {
        let registry = SwitchObjectRegistry::new();
        let port = SaiObjectId::new(SaiObjectType::Port, 1);
        let lag = SaiObjectId::new(SaiObjectType::Lag, 1);
        let vlan = VlanId::new(10).unwrap();

        assert!(!registry.is_port_valid(port));
        registry.add_port(port);
        registry.create_lag(lag);
        registry.create_vlan(vlan);

        assert!(registry.is_port_valid(port));
        assert!(registry.is_lag_created(lag));
        assert!(registry.is_vlan_created(vlan));

        assert!(registry.remove_vlan(vlan));
        assert!(!registry.is_vlan_created(vlan));
    }

    #[test]
    fn test_removed_objects_are_invalid() {
        let registry = SwitchObjectRegistry::new();
        let port = SaiObjectId::new(SaiObjectType::Port, 2);
        let lag = SaiObjectId::new(SaiObjectType::Lag, 2);
        registry.add_port(port);
        registry.create_lag(lag);

        assert!(registry.remove_port(port));
        assert!(!registry.remove_port(port));
        assert!(!registry.is_port_valid(port));
        assert!(registry.remove_lag(lag));
        assert!(!registry.is_lag_created(lag));
    }
}
