use super::types::SLOTS_PER_DAY;

/// Slack allowed when comparing a slot total against the ceiling (kW).
const CEILING_EPSILON_KW: f32 = 1e-4;

/// Per-slot committed load with an optional ceiling on total draw.
///
/// Base load and placed devices are kept apart: placement scores look at
/// device load only, while the ceiling applies to the slot total. Without
/// a ceiling every placement fits.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    base_kw: [f32; SLOTS_PER_DAY],
    device_kw: [f32; SLOTS_PER_DAY],
    ceiling_kw: f32,
}

impl CapacityLedger {
    /// Creates a ledger with no ceiling.
    pub fn new() -> Self {
        Self::with_ceiling(None)
    }

    /// Creates a ledger whose slot totals should stay at or below
    /// `ceiling_kw`. A non-positive or non-finite ceiling means no limit.
    pub fn with_ceiling(ceiling_kw: Option<f32>) -> Self {
        let ceiling_kw = match ceiling_kw {
            Some(kw) if kw.is_finite() && kw > 0.0 => kw,
            _ => f32::INFINITY,
        };
        Self {
            base_kw: [0.0; SLOTS_PER_DAY],
            device_kw: [0.0; SLOTS_PER_DAY],
            ceiling_kw,
        }
    }

    /// Adds a per-slot base profile to the ledger.
    pub fn commit_base(&mut self, profile_kw: &[f32]) {
        for (slot, kw) in self.base_kw.iter_mut().zip(profile_kw) {
            *slot += kw;
        }
    }

    /// Commits a device drawing `kw` over `duration` slots from `start`.
    pub fn commit(&mut self, start: usize, duration: usize, kw: f32) {
        let end = (start + duration).min(SLOTS_PER_DAY);
        for slot in &mut self.device_kw[start.min(end)..end] {
            *slot += kw;
        }
    }

    /// Load from already-placed devices at `slot` (kW); zero outside the day.
    pub fn device_kw(&self, slot: usize) -> f32 {
        self.device_kw.get(slot).copied().unwrap_or(0.0)
    }

    /// Base plus device load at `slot` (kW); zero outside the day.
    pub fn total_kw(&self, slot: usize) -> f32 {
        self.base_kw.get(slot).copied().unwrap_or(0.0) + self.device_kw(slot)
    }

    /// Remaining room under the ceiling at `slot` (kW).
    pub fn headroom_kw(&self, slot: usize) -> f32 {
        self.ceiling_kw - self.total_kw(slot)
    }

    /// Returns `true` if adding `kw` over the run keeps every slot within
    /// the ceiling.
    pub fn fits(&self, start: usize, duration: usize, kw: f32) -> bool {
        (start..start + duration).all(|slot| kw <= self.headroom_kw(slot) + CEILING_EPSILON_KW)
    }

    /// Returns `true` when no slot exceeds the ceiling.
    pub fn within_limits(&self) -> bool {
        (0..SLOTS_PER_DAY).all(|slot| self.headroom_kw(slot) >= -CEILING_EPSILON_KW)
    }

    /// The ceiling in kW, or `None` when unlimited.
    pub fn ceiling_kw(&self) -> Option<f32> {
        self.ceiling_kw.is_finite().then_some(self.ceiling_kw)
    }
}

impl Default for CapacityLedger {
    fn default() -> Self {
        Self::new()
    }
}
