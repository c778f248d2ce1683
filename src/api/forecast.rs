//! Forecast catalogue client.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Timelike};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    api::try_new_client,
    core::{
        ist,
        slot::{BaseSlot, SlotId},
    },
    prelude::*,
};

/// How long a fetched catalogue stays good for.
#[must_use]
pub fn cache_ttl() -> TimeDelta {
    TimeDelta::hours(2)
}

/// Provides tomorrow's candidate windows.
#[async_trait]
pub trait ForecastProvider {
    async fn get_windows(&self) -> Result<Vec<ForecastWindow>>;
}

pub struct Api {
    client: Client,
    url: Url,
    user_id: Option<String>,
}

impl Api {
    pub fn try_new(url: Url, user_id: Option<String>) -> Result<Self> {
        Ok(Self { client: try_new_client()?, url, user_id })
    }
}

#[async_trait]
impl ForecastProvider for Api {
    #[instrument(skip_all)]
    async fn get_windows(&self) -> Result<Vec<ForecastWindow>> {
        info!("fetching the forecast…");
        let response = self
            .client
            .post(self.url.clone())
            .json(&GetForecastRequest::new(self.user_id.as_deref()))
            .send()
            .await
            .context("failed to call the forecast catalogue")?
            .error_for_status()
            .context("the forecast request failed")?
            .json::<GetForecastResponse>()
            .await
            .context("failed to deserialize the forecast response")?;
        let windows = response.data.windows;
        info!(n_windows = windows.len(), "fetched");
        Ok(windows)
    }
}

#[derive(Serialize)]
struct GetForecastRequest<'a> {
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,

    parameters: Parameters,

    #[serde(rename = "timeRange")]
    time_range: TimeRange,
}

impl<'a> GetForecastRequest<'a> {
    const fn new(user_id: Option<&'a str>) -> Self {
        Self { user_id, parameters: Parameters {}, time_range: TimeRange { hours: 24 } }
    }
}

#[derive(Serialize)]
struct Parameters {}

#[derive(Serialize)]
struct TimeRange {
    hours: u32,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct GetForecastResponse {
    data: ForecastData,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ForecastData {
    #[serde(rename = "forecast_windows")]
    windows: Vec<ForecastWindow>,
}

/// One candidate window. Everything is optional on the wire; defaulting
/// happens here at the boundary, not at the call sites.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastWindow {
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    pub price_per_unit: Option<f64>,
    pub total_units: Option<f64>,
    pub expected_total: Option<f64>,
}

/// Windows → candidate slots. Windows without a usable start time are dropped.
#[must_use]
pub fn to_slots(windows: &[ForecastWindow]) -> Vec<BaseSlot> {
    windows
        .iter()
        .enumerate()
        .filter_map(|(index, window)| {
            let Some(start) =
                window.from_timestamp.and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            else {
                warn!(index, "dropping a window without a start time");
                return None;
            };
            let start = start.with_timezone(&ist());
            let end = window
                .to_timestamp
                .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
                .map_or_else(|| start + TimeDelta::hours(1), |end| end.with_timezone(&ist()));
            Some(BaseSlot {
                id: SlotId((index + 1).to_string()),
                time: format!("{} – {}", start.format("%-I:%M %p"), end.format("%-I:%M %p")),
                start_hour: start.hour(),
                kwh: window.total_units.unwrap_or_default().into(),
                rate: window.price_per_unit.unwrap_or_default().into(),
                is_battery: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_become_ist_labelled_slots() {
        // 2026-01-28 04:30 UTC is 10:00 IST.
        let windows = [ForecastWindow {
            from_timestamp: Some(1_769_574_600),
            to_timestamp: Some(1_769_578_200),
            price_per_unit: Some(6.25),
            total_units: Some(4.0),
            expected_total: Some(25.0),
        }];
        let slots = to_slots(&windows);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, "1".into());
        assert_eq!(slots[0].time, "10:00 AM – 11:00 AM");
        assert_eq!(slots[0].start_hour, 10);
    }

    #[test]
    fn windows_without_a_start_are_dropped_and_gaps_default() {
        let windows = [
            ForecastWindow::default(),
            ForecastWindow { from_timestamp: Some(1_769_574_600), ..Default::default() },
        ];
        let slots = to_slots(&windows);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].kwh, 0.0.into());
        assert_eq!(slots[0].time, "10:00 AM – 11:00 AM");
    }

    #[tokio::test]
    async fn fetches_and_deserializes_the_catalogue() -> Result {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/bpp/catalogue/forecast")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                r#"{"data": {"forecast_windows": [
                    {"from_timestamp": 1769574600, "price_per_unit": 6.25, "total_units": 4}
                ]}}"#,
            )
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/api/bpp/catalogue/forecast", server.url()))?;
        let windows = Api::try_new(url, Some("user-1".to_owned()))?.get_windows().await?;

        mock.assert_async().await;
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].price_per_unit, Some(6.25));
        Ok(())
    }

    #[tokio::test]
    async fn an_empty_body_means_no_windows() -> Result {
        let mut server = mockito::Server::new_async().await;
        let _mock =
            server.mock("POST", "/forecast").with_status(200).with_body("{}").create_async().await;

        let url = Url::parse(&format!("{}/forecast", server.url()))?;
        let windows = Api::try_new(url, None)?.get_windows().await?;
        assert!(windows.is_empty());
        Ok(())
    }
}
