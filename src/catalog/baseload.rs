use crate::error::DataShapeError;
use crate::schedule::types::SLOTS_PER_DAY;

/// Fixed, non-schedulable consumption for each slot of the day.
///
/// `BaseLoad` is never moved by the scheduler; it is committed to every
/// slot before any controllable device is placed.
///
/// # Examples
///
/// ```
/// use solar_shift::catalog::baseload::BaseLoad;
///
/// // Daily pattern around 4 kW with a 1.5 kW swing
/// let load = BaseLoad::sinusoidal(4.0, 1.5, 1.2);
/// assert!(load.kw_at(24) > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BaseLoad {
    profile_kw: Vec<f32>,
}

impl BaseLoad {
    /// Constant draw in every slot.
    pub fn constant(kw: f32) -> Self {
        Self {
            profile_kw: vec![kw.max(0.0); SLOTS_PER_DAY],
        }
    }

    /// No base consumption.
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Sinusoidal daily pattern.
    ///
    /// The demand at slot `t` is `base_kw + amp_kw * sin(2π t/48 + phase_rad)`,
    /// floored at zero.
    ///
    /// # Arguments
    ///
    /// * `base_kw` - Mean consumption in kilowatts
    /// * `amp_kw` - Amplitude of the daily variation in kilowatts
    /// * `phase_rad` - Phase offset in radians (0 = mean at midnight, rising)
    pub fn sinusoidal(base_kw: f32, amp_kw: f32, phase_rad: f32) -> Self {
        let profile_kw = (0..SLOTS_PER_DAY)
            .map(|t| {
                let day_pos = t as f32 / SLOTS_PER_DAY as f32;
                let angle = 2.0 * std::f32::consts::PI * day_pos + phase_rad;
                (base_kw + amp_kw * angle.sin()).max(0.0)
            })
            .collect();
        Self { profile_kw }
    }

    /// Builds a profile from explicit values.
    ///
    /// Accepts either 48 half-hourly values or 24 hourly values (each hour
    /// then covers two slots).
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] for any other length or for negative or
    /// non-finite values.
    pub fn from_profile(values: &[f32]) -> Result<Self, DataShapeError> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(DataShapeError::InvalidValue {
                record: "base_load".to_string(),
                field: "profile_kw",
                message: format!("values must be finite and >= 0, got {bad}"),
            });
        }
        let profile_kw = match values.len() {
            SLOTS_PER_DAY => values.to_vec(),
            n if n * 2 == SLOTS_PER_DAY => values.iter().flat_map(|v| [*v, *v]).collect(),
            n => {
                return Err(DataShapeError::InvalidValue {
                    record: "base_load".to_string(),
                    field: "profile_kw",
                    message: format!("expected 24 or 48 values, got {n}"),
                });
            }
        };
        Ok(Self { profile_kw })
    }

    /// Adds a constant draw to every slot.
    pub fn add_constant(&mut self, kw: f32) {
        for v in &mut self.profile_kw {
            *v += kw;
        }
    }

    /// Draw at `slot` in kW (zero outside the day).
    pub fn kw_at(&self, slot: usize) -> f32 {
        self.profile_kw.get(slot).copied().unwrap_or(0.0)
    }

    /// The full 48-slot profile.
    pub fn profile_kw(&self) -> &[f32] {
        &self.profile_kw
    }
}

impl Default for BaseLoad {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_fills_every_slot() {
        let load = BaseLoad::constant(2.0);
        assert_eq!(load.profile_kw().len(), SLOTS_PER_DAY);
        assert!(load.profile_kw().iter().all(|v| *v == 2.0));
    }

    #[test]
    fn negative_constant_clamped() {
        assert_eq!(BaseLoad::constant(-1.0).kw_at(0), 0.0);
    }

    #[test]
    fn sinusoid_never_negative() {
        let load = BaseLoad::sinusoidal(0.5, 2.0, 0.0);
        assert!(load.profile_kw().iter().all(|v| *v >= 0.0));
        assert!(load.profile_kw().iter().any(|v| *v == 0.0));
    }

    #[test]
    fn hourly_profile_expands_to_slots() {
        let hourly: Vec<f32> = (0..24).map(|h| h as f32).collect();
        let load = BaseLoad::from_profile(&hourly).unwrap();
        assert_eq!(load.kw_at(0), 0.0);
        assert_eq!(load.kw_at(1), 0.0);
        assert_eq!(load.kw_at(20), 10.0);
        assert_eq!(load.kw_at(21), 10.0);
    }

    #[test]
    fn wrong_length_profile_rejected() {
        assert!(BaseLoad::from_profile(&[1.0; 30]).is_err());
    }

    #[test]
    fn negative_profile_value_rejected() {
        let mut values = [1.0; 48];
        values[3] = -0.5;
        assert!(BaseLoad::from_profile(&values).is_err());
    }

    #[test]
    fn add_constant_shifts_profile() {
        let mut load = BaseLoad::constant(1.0);
        load.add_constant(0.5);
        assert_eq!(load.kw_at(47), 1.5);
        assert_eq!(load.kw_at(48), 0.0);
    }
}
