use std::fmt;

use serde::Serialize;

use super::SlotForecast;
use crate::schedule::types::{SLOT_HOURS, slot_label};

/// Headline figures for a day's forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    /// Slot with the highest generation, or `None` on a dark day.
    pub peak_generation_slot: Option<usize>,
    /// Generation in the peak slot (Wh).
    pub peak_generation_wh: f32,
    /// Generation over the day (kWh).
    pub total_generation_kwh: f32,
    /// Slot with the highest smoothed irradiance, when irradiance is known.
    pub peak_irradiance_slot: Option<usize>,
    /// Daily irradiation on the panel plane (kWh/m²), when known.
    pub daily_irradiation_kwh_m2: Option<f32>,
    /// Number of slots the forecast did not cover.
    pub missing_slots: usize,
}

impl ForecastSummary {
    /// Summarises an aligned forecast.
    ///
    /// Peak irradiance is taken after a centred 3-slot rolling mean;
    /// irradiation integrates the raw values over half-hour slots.
    pub fn from_forecast(forecast: &SlotForecast) -> Self {
        let (peak_generation_slot, peak_generation_wh) = match first_max(forecast.values()) {
            Some((slot, wh)) if wh > 0.0 => (Some(slot), wh),
            _ => (None, 0.0),
        };

        let (peak_irradiance_slot, daily_irradiation_kwh_m2) = match forecast.irradiance_w_m2() {
            Some(irr) => {
                let smoothed = rolling_mean_3(irr);
                let peak = first_max(&smoothed)
                    .filter(|(_, v)| *v > 0.0)
                    .map(|(slot, _)| slot);
                let kwh_m2 = irr.iter().map(|w| w * SLOT_HOURS).sum::<f32>() / 1000.0;
                (peak, Some(kwh_m2))
            }
            None => (None, None),
        };

        Self {
            peak_generation_slot,
            peak_generation_wh,
            total_generation_kwh: forecast.total_wh() / 1000.0,
            peak_irradiance_slot,
            daily_irradiation_kwh_m2,
            missing_slots: forecast.missing_slots().len(),
        }
    }
}

impl fmt::Display for ForecastSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast Summary ---")?;
        match self.peak_generation_slot {
            Some(slot) => writeln!(
                f,
                "Peak PV:               {} ({:.0} Wh)",
                slot_label(slot),
                self.peak_generation_wh
            )?,
            None => writeln!(f, "Peak PV:               none")?,
        }
        writeln!(
            f,
            "Total PV:              {:.2} kWh",
            self.total_generation_kwh
        )?;
        if let Some(slot) = self.peak_irradiance_slot {
            writeln!(f, "Peak irradiance:       {}", slot_label(slot))?;
        }
        if let Some(kwh_m2) = self.daily_irradiation_kwh_m2 {
            writeln!(f, "Daily irradiation:     {kwh_m2:.2} kWh/m²")?;
        }
        write!(f, "Missing slots:         {}", self.missing_slots)
    }
}

/// Centred 3-point rolling mean; edges average the points available.
pub fn rolling_mean_3(values: &[f32]) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 2).min(values.len());
            let window = &values[lo..hi];
            window.iter().sum::<f32>() / window.len() as f32
        })
        .collect()
}

fn first_max(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_handles_edges() {
        let out = rolling_mean_3(&[3.0, 6.0, 9.0, 0.0]);
        assert_eq!(out, vec![4.5, 6.0, 5.0, 4.5]);
    }

    #[test]
    fn rolling_mean_of_empty_is_empty() {
        assert!(rolling_mean_3(&[]).is_empty());
    }

    #[test]
    fn peak_is_first_maximum() {
        let mut values = [0.0; 48];
        values[20] = 500.0;
        values[22] = 500.0;
        let s = ForecastSummary::from_forecast(&SlotForecast::from_slots(&values));
        assert_eq!(s.peak_generation_slot, Some(20));
        assert_eq!(s.total_generation_kwh, 1.0);
        assert_eq!(s.daily_irradiation_kwh_m2, None);
    }

    #[test]
    fn dark_day_has_no_peak() {
        let s = ForecastSummary::from_forecast(&SlotForecast::from_slots(&[0.0; 48]));
        assert_eq!(s.peak_generation_slot, None);
        assert!(s.to_string().contains("none"));
    }

    #[test]
    fn missing_slots_are_counted() {
        let s = ForecastSummary::from_forecast(&SlotForecast::from_slots(&[1.0; 40]));
        assert_eq!(s.missing_slots, 8);
    }
}
