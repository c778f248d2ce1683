use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    core::slot::{ActiveTrade, SlotId},
    quantity::{KilowattHourRate, KilowattHours, Rupees},
};

/// A planned trade as persisted and displayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedTrade {
    pub id: SlotId,

    /// Display range in IST, e.g. `10:00 AM – 11:00 AM`.
    pub time: String,

    #[serde(rename = "kWh")]
    pub kwh: KilowattHours,

    pub rate: KilowattHourRate,

    #[serde(default, rename = "isBatteryPowered")]
    pub is_battery: bool,
}

impl PlannedTrade {
    pub fn earnings(&self) -> Rupees {
        self.kwh * self.rate
    }
}

impl From<ActiveTrade> for PlannedTrade {
    fn from(trade: ActiveTrade) -> Self {
        Self {
            id: trade.id,
            time: trade.time,
            kwh: trade.kwh,
            rate: trade.rate,
            is_battery: trade.is_battery,
        }
    }
}

/// A trade matched by the exchange, reported back out of band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedTrade {
    pub time: String,

    #[serde(rename = "kWh")]
    pub kwh: KilowattHours,

    pub rate: KilowattHourRate,

    /// Realized, not recomputed: the exchange may settle at partial volume.
    pub earnings: Rupees,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
}

/// The single durable record. Mutations replace the whole record on disk so a
/// reload can never observe a half-written publish.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishedTradesRecord {
    pub planned_trades: Vec<PlannedTrade>,
    pub confirmed_trades: Vec<ConfirmedTrade>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    pub is_published: bool,

    /// Gates whether matched trades are surfaced in the report.
    pub show_confirmed_trades: bool,
}

impl PublishedTradesRecord {
    /// Replace the draft plan without touching the publish state.
    pub fn update_planned_trades(&mut self, trades: Vec<PlannedTrade>) {
        self.planned_trades = trades;
    }

    /// Record a match event and surface it in the report.
    pub fn confirm_trades(&mut self, trades: Vec<ConfirmedTrade>) {
        self.confirmed_trades = trades;
        self.show_confirmed_trades = true;
    }

    #[must_use]
    pub fn planned_units(&self) -> KilowattHours {
        self.planned_trades.iter().map(|trade| trade.kwh).sum()
    }

    #[must_use]
    pub fn planned_earnings(&self) -> Rupees {
        self.planned_trades.iter().map(PlannedTrade::earnings).sum()
    }

    #[must_use]
    pub fn confirmed_units(&self) -> KilowattHours {
        self.confirmed_trades.iter().map(|trade| trade.kwh).sum()
    }

    #[must_use]
    pub fn confirmed_earnings(&self) -> Rupees {
        self.confirmed_trades.iter().map(|trade| trade.earnings).sum()
    }

    #[must_use]
    pub fn total_units(&self) -> KilowattHours {
        self.planned_units() + self.confirmed_units()
    }

    #[must_use]
    pub fn total_earnings(&self) -> Rupees {
        self.planned_earnings() + self.confirmed_earnings()
    }

    /// Blended rate to one decimal, or zero when nothing is on the books.
    #[must_use]
    pub fn average_rate(&self) -> KilowattHourRate {
        let units = self.total_units();
        if units > KilowattHours::ZERO {
            KilowattHourRate::from(
                (self.total_earnings().as_f64() / units.0.0 * 10.0).round() / 10.0,
            )
        } else {
            KilowattHourRate::ZERO
        }
    }

    #[must_use]
    pub const fn status(&self) -> PublishStatus {
        match (self.is_published, self.show_confirmed_trades) {
            (false, _) => PublishStatus::NotPublished,
            (true, false) => PublishStatus::PublishedPending,
            (true, true) => PublishStatus::PublishedConfirmed,
        }
    }
}

/// Forward-only: publishing moves the record to pending, a confirmation to
/// confirmed, and only a full reset goes back.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum PublishStatus {
    #[display("not published")]
    NotPublished,

    #[display("published, awaiting matches")]
    PublishedPending,

    #[display("published and confirmed")]
    PublishedConfirmed,
}

/// Durable automation preference.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    /// Suggest the best times and prices; the user reviews and publishes.
    #[default]
    #[display("recommend")]
    Recommend,

    /// Publish automatically at the best times and prices.
    #[display("auto")]
    Auto,
}

/// Flat preference record (no cache envelope).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationPreference {
    pub mode: AutomationMode,
}

/// The synthesized out-of-band match event: the first two planned trades
/// settle in full against the usual buyers.
#[must_use]
pub fn synthesize_confirmations(planned: &[PlannedTrade]) -> Vec<ConfirmedTrade> {
    planned
        .iter()
        .take(2)
        .zip(["GridCo", "TPDDL"])
        .map(|(trade, buyer)| ConfirmedTrade {
            time: trade.time.clone(),
            kwh: trade.kwh,
            rate: trade.rate,
            earnings: trade.earnings(),
            buyer: Some(buyer.to_owned()),
        })
        .collect()
}
