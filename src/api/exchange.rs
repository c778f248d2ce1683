//! Trade-acceptance sink client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    api::try_new_client,
    core::submission::TradeSubmission,
    prelude::*,
    quantity::{KilowattHours, Rupees},
};

/// Accepts the published plan.
#[async_trait]
pub trait TradeSink {
    async fn submit(&self, trades: &[TradeSubmission]) -> Result<SubmitSummary>;
}

pub struct Api {
    client: Client,
    url: Url,
    user_id: Option<String>,
    device_id: Option<String>,
}

impl Api {
    pub fn try_new(url: Url, user_id: Option<String>, device_id: Option<String>) -> Result<Self> {
        Ok(Self { client: try_new_client()?, url, user_id, device_id })
    }
}

#[async_trait]
impl TradeSink for Api {
    #[instrument(skip_all, fields(n_trades = trades.len()))]
    async fn submit(&self, trades: &[TradeSubmission]) -> Result<SubmitSummary> {
        info!("submitting…");

        #[derive(Serialize)]
        struct SubmitTradesRequest<'a> {
            trades: &'a [TradeSubmission],

            #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
            user_id: Option<&'a str>,

            #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
            device_id: Option<&'a str>,
        }

        let response = self
            .client
            .post(self.url.clone())
            .json(&SubmitTradesRequest {
                trades,
                user_id: self.user_id.as_deref(),
                device_id: self.device_id.as_deref(),
            })
            .send()
            .await
            .context("failed to call the exchange")?;

        let status = response.status();
        if !status.is_success() {
            let rejection: Rejection = response.json().await.unwrap_or_default();
            bail!("the exchange rejected the submission ({status}): {}", rejection.error);
        }

        let response: SubmitTradesResponse =
            response.json().await.context("failed to deserialize the exchange response")?;
        ensure!(response.success, "the exchange reported failure: {}", response.message);
        info!(
            trades = response.summary.trades_count,
            quantity = %response.summary.total_quantity,
            value = %response.summary.total_value,
            at = %response.summary.submitted_at,
            "accepted",
        );
        Ok(response.summary)
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Rejection {
    error: String,
}

#[derive(Deserialize)]
struct SubmitTradesResponse {
    #[serde(default)]
    success: bool,

    #[serde(default)]
    message: String,

    summary: SubmitSummary,
}

/// The sink's acceptance summary.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmitSummary {
    #[serde(rename = "tradesCount")]
    pub trades_count: usize,

    #[serde(rename = "totalQuantity")]
    pub total_quantity: KilowattHours,

    #[serde(rename = "totalValue")]
    pub total_value: Rupees,

    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{core::submission::convert_trades, store::record::PlannedTrade};

    fn submissions() -> Vec<TradeSubmission> {
        let trades = [PlannedTrade {
            id: "1".into(),
            time: "10:00 AM – 11:00 AM".to_owned(),
            kwh: 4.0.into(),
            rate: 6.25.into(),
            is_battery: false,
        }];
        let date = NaiveDate::from_ymd_opt(2026, 1, 28).expect("valid date");
        convert_trades(&trades, date).expect("conversion succeeds")
    }

    #[tokio::test]
    async fn a_successful_submission_returns_the_summary() -> Result {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/submit")
            .with_status(200)
            .with_body(
                r#"{
                    "success": true,
                    "message": "Trades submitted successfully",
                    "summary": {
                        "tradesCount": 1,
                        "totalQuantity": 4,
                        "totalValue": 25,
                        "submittedAt": "2026-01-27T18:30:00.000Z"
                    }
                }"#,
            )
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/submit", server.url()))?;
        let sink = Api::try_new(url, Some("user-1".to_owned()), None)?;
        let summary = sink.submit(&submissions()).await?;

        mock.assert_async().await;
        assert_eq!(summary.trades_count, 1);
        assert_eq!(summary.total_quantity, 4.0.into());
        assert_eq!(summary.total_value, Rupees(25));
        Ok(())
    }

    #[tokio::test]
    async fn a_rejection_surfaces_the_error_field() -> Result {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/submit")
            .with_status(400)
            .with_body(r#"{"error": "Invalid trade format", "trade": {}}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/submit", server.url()))?;
        let sink = Api::try_new(url, None, None)?;
        let error = sink.submit(&submissions()).await.expect_err("must fail");
        assert!(error.to_string().contains("Invalid trade format"));
        Ok(())
    }
}
