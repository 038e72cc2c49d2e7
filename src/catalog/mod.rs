//! Load catalog: the devices a scheduling run places, plus fixed base load.

/// Fixed per-slot base consumption.
pub mod baseload;
pub mod types;

use std::collections::HashSet;

use crate::error::DataShapeError;

pub use baseload::BaseLoad;
pub use types::{Device, DeviceKind, DeviceRecord, SlotWindow, column_name};

/// Validated set of devices for one scheduling run.
///
/// Base-kind entries are folded into the [`BaseLoad`] profile at
/// construction; the remaining devices keep their catalog order, which is
/// the tie-breaker between devices of equal priority.
#[derive(Debug, Clone)]
pub struct LoadCatalog {
    controllable: Vec<Device>,
    base_devices: Vec<Device>,
    base_load: BaseLoad,
}

impl LoadCatalog {
    /// Builds a catalog from devices and a base profile.
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] when names are empty or repeated, or
    /// when a device has a non-positive power draw or run length.
    pub fn new(devices: Vec<Device>, mut base_load: BaseLoad) -> Result<Self, DataShapeError> {
        let mut seen = HashSet::new();
        let mut controllable = Vec::new();
        let mut base_devices = Vec::new();

        for device in devices {
            if device.name.trim().is_empty() {
                return Err(DataShapeError::MissingField {
                    record: format!("device #{}", controllable.len() + base_devices.len()),
                    field: "name",
                });
            }
            if !seen.insert(device.name.clone()) {
                return Err(DataShapeError::DuplicateDevice(device.name));
            }
            if !device.power_kw.is_finite() || device.power_kw <= 0.0 {
                return Err(DataShapeError::InvalidValue {
                    record: device.name,
                    field: "power_kw",
                    message: "must be a positive number".to_string(),
                });
            }
            if device.is_base() {
                base_load.add_constant(device.power_kw);
                base_devices.push(device);
                continue;
            }
            if device.duration_slots == 0 {
                return Err(DataShapeError::InvalidValue {
                    record: device.name,
                    field: "duration_slots",
                    message: "must be > 0".to_string(),
                });
            }
            controllable.push(device);
        }

        Ok(Self {
            controllable,
            base_devices,
            base_load,
        })
    }

    /// Builds a catalog from raw records, in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`DataShapeError`] found in any record or in the
    /// catalog as a whole.
    pub fn from_records(
        records: Vec<DeviceRecord>,
        base_load: BaseLoad,
    ) -> Result<Self, DataShapeError> {
        let devices = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_device(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(devices, base_load)
    }

    /// Catalog with only base load.
    pub fn base_only(base_load: BaseLoad) -> Self {
        Self {
            controllable: Vec::new(),
            base_devices: Vec::new(),
            base_load,
        }
    }

    /// Controllable devices in catalog order.
    pub fn controllable(&self) -> &[Device] {
        &self.controllable
    }

    /// Base-kind entries that were merged into the base profile.
    pub fn base_devices(&self) -> &[Device] {
        &self.base_devices
    }

    /// Combined base profile (configured profile plus base-kind entries).
    pub fn base_load(&self) -> &BaseLoad {
        &self.base_load
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_devices_fold_into_profile() {
        let catalog = LoadCatalog::new(
            vec![
                Device::base("lighting", 1.0),
                Device::controllable("pump", 3.0, 2),
            ],
            BaseLoad::constant(2.0),
        )
        .unwrap();
        assert_eq!(catalog.controllable().len(), 1);
        assert_eq!(catalog.base_devices().len(), 1);
        assert_eq!(catalog.base_load().kw_at(10), 3.0);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = LoadCatalog::new(
            vec![
                Device::controllable("pump", 3.0, 2),
                Device::controllable("pump", 1.0, 1),
            ],
            BaseLoad::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, DataShapeError::DuplicateDevice(name) if name == "pump"));
    }

    #[test]
    fn zero_duration_rejected() {
        let err = LoadCatalog::new(
            vec![Device::controllable("pump", 3.0, 0)],
            BaseLoad::zero(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn catalog_order_preserved() {
        let catalog = LoadCatalog::new(
            vec![
                Device::controllable("b", 1.0, 1).with_priority(2),
                Device::controllable("a", 1.0, 1).with_priority(1),
            ],
            BaseLoad::zero(),
        )
        .unwrap();
        let names: Vec<&str> = catalog
            .controllable()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn records_with_missing_fields_fail_whole_catalog() {
        let records = vec![
            DeviceRecord {
                name: Some("ok".to_string()),
                power_kw: Some(1.0),
                duration_slots: Some(2),
                priority: Some(1),
                ..DeviceRecord::default()
            },
            DeviceRecord {
                name: Some("broken".to_string()),
                ..DeviceRecord::default()
            },
        ];
        let err = LoadCatalog::from_records(records, BaseLoad::zero()).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
