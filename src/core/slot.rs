use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::quantity::{KilowattHourRate, KilowattHours, Rupees};

/// Candidate offer identifier, unique within one plan generation.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Deserialize,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct SlotId(pub String);

impl From<&str> for SlotId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// One candidate time-windowed offer from the forecast.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseSlot {
    pub id: SlotId,

    /// Display range in IST, e.g. `10:00 AM – 11:00 AM`.
    pub time: String,

    /// Start hour in 24-hour IST time.
    pub start_hour: u32,

    pub kwh: KilowattHours,
    pub rate: KilowattHourRate,

    /// Whether the energy comes from the home battery rather than live generation.
    pub is_battery: bool,
}

impl BaseSlot {
    /// An hour-aligned slot with the display label derived from the start hour.
    pub fn hourly(id: impl Into<SlotId>, start_hour: u32, kwh: f64, rate: f64) -> Self {
        Self {
            id: id.into(),
            time: format!("{} – {}", hour_label(start_hour), hour_label(start_hour + 1)),
            start_hour,
            kwh: kwh.into(),
            rate: rate.into(),
            is_battery: false,
        }
    }

    pub fn battery(mut self) -> Self {
        self.is_battery = true;
        self
    }

    pub fn earnings(&self) -> Rupees {
        self.kwh * self.rate
    }
}

/// A slot that survived filtering, annotated with its expected earnings.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveTrade {
    pub id: SlotId,
    pub time: String,
    pub start_hour: u32,
    pub kwh: KilowattHours,
    pub rate: KilowattHourRate,
    pub is_battery: bool,
    pub earnings: Rupees,
}

impl From<&BaseSlot> for ActiveTrade {
    fn from(slot: &BaseSlot) -> Self {
        Self {
            id: slot.id.clone(),
            time: slot.time.clone(),
            start_hour: slot.start_hour,
            kwh: slot.kwh,
            rate: slot.rate,
            is_battery: slot.is_battery,
            earnings: slot.earnings(),
        }
    }
}

/// `13` → `1:00 PM`.
#[must_use]
pub fn hour_label(hour: u32) -> String {
    NaiveTime::from_hms_opt(hour % 24, 0, 0)
        .map(|time| time.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// Built-in candidates used when the forecast carries no windows.
#[must_use]
pub fn fallback_slots() -> Vec<BaseSlot> {
    vec![
        BaseSlot::hourly("1", 10, 4.0, 6.25),
        BaseSlot::hourly("2", 11, 5.0, 6.20),
        BaseSlot::hourly("3", 12, 5.0, 6.30),
        BaseSlot::hourly("4", 13, 4.0, 6.35),
        BaseSlot::hourly("5", 14, 4.0, 6.40),
        BaseSlot::hourly("6", 17, 3.0, 6.50).battery(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_labels_cross_noon_and_midnight() {
        assert_eq!(hour_label(10), "10:00 AM");
        assert_eq!(hour_label(12), "12:00 PM");
        assert_eq!(hour_label(13), "1:00 PM");
        assert_eq!(hour_label(0), "12:00 AM");
        assert_eq!(hour_label(24), "12:00 AM");
    }

    #[test]
    fn hourly_slot_builds_the_display_range() {
        let slot = BaseSlot::hourly("1", 10, 4.0, 6.25);
        assert_eq!(slot.time, "10:00 AM – 11:00 AM");
        assert_eq!(slot.earnings(), crate::quantity::Rupees(25));
    }
}
