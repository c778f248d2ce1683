//! Conversion of the active plan into the exchange submission schema.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    core::ist,
    prelude::*,
    quantity::{KilowattHourRate, KilowattHours},
    store::record::PlannedTrade,
};

/// The wire shape of one planned trade.
///
/// Field casing is uneven on purpose: that is what the exchange accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeSubmission {
    pub date: NaiveDate,

    #[serde(rename = "startTime", with = "iso_millis")]
    pub start_time: DateTime<Utc>,

    #[serde(rename = "end_time", with = "iso_millis")]
    pub end_time: DateTime<Utc>,

    pub quantity: KilowattHours,
    pub price: KilowattHourRate,
}

/// The exchange expects JavaScript-style timestamps: UTC with milliseconds.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        time: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|time| time.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Convert planned trades for the given calendar date.
///
/// Display times are read as IST civil time; the wire wants UTC instants and
/// a fixed one-hour slot duration, regardless of the display range's end token.
pub fn convert_trades(
    trades: &[PlannedTrade],
    target_date: NaiveDate,
) -> Result<Vec<TradeSubmission>> {
    trades.iter().map(|trade| convert_trade(trade, target_date)).collect()
}

fn convert_trade(trade: &PlannedTrade, target_date: NaiveDate) -> Result<TradeSubmission> {
    let (hour, minute) = parse_clock(start_token(&trade.time)).with_context(|| {
        format!("trade `{}` has an invalid time range `{}`", trade.id, trade.time)
    })?;
    let civil = NaiveTime::from_hms_opt(hour, minute, 0)
        .map(|time| target_date.and_time(time))
        .with_context(|| format!("invalid clock time {hour}:{minute:02}"))?;
    let start_time = civil
        .and_local_timezone(ist())
        .single()
        .context("failed to anchor the civil time in IST")?
        .with_timezone(&Utc);

    Ok(TradeSubmission {
        date: target_date,
        start_time,
        end_time: start_time + TimeDelta::hours(1),
        quantity: trade.kwh,
        price: trade.rate,
    })
}

/// First token of `10:00 AM – 11:00 AM`.
fn start_token(range: &str) -> &str {
    range.split('–').next().unwrap_or(range).trim()
}

/// Parse `H:MM AM|PM` into a 24-hour clock.
fn parse_clock(token: &str) -> Result<(u32, u32)> {
    let (clock, period) =
        token.split_once(' ').with_context(|| format!("missing AM/PM in `{token}`"))?;
    let (hour, minute) =
        clock.split_once(':').with_context(|| format!("missing minutes in `{token}`"))?;
    let hour: u32 = hour.parse().with_context(|| format!("bad hour in `{token}`"))?;
    let minute: u32 = minute.parse().with_context(|| format!("bad minutes in `{token}`"))?;
    ensure!((1..=12).contains(&hour), "hour out of range in `{token}`");
    ensure!(minute < 60, "minutes out of range in `{token}`");

    let hour = match period.trim().to_ascii_uppercase().as_str() {
        "PM" if hour != 12 => hour + 12,
        "AM" if hour == 12 => 0,
        "AM" | "PM" => hour,
        other => bail!("unknown period `{other}` in `{token}`"),
    };
    Ok((hour, minute))
}

/// Tomorrow on the IST calendar — the default target date.
pub fn tomorrow_ist(now: DateTime<Utc>) -> Result<NaiveDate> {
    now.with_timezone(&ist()).date_naive().succ_opt().context("calendar overflow")
}

/// Mirror of the sink's own checks; failing here avoids a doomed round-trip.
pub fn validate(trades: &[TradeSubmission]) -> Result {
    for trade in trades {
        ensure!(trade.quantity > KilowattHours::ZERO, "non-positive quantity on {}", trade.date);
        ensure!(trade.price > KilowattHourRate::ZERO, "non-positive price on {}", trade.date);
        ensure!(trade.end_time > trade.start_time, "inverted time range on {}", trade.date);
    }
    Ok(())
}
