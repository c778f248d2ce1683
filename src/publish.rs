//! The publish pipeline: active plan → wire schema → best-effort submission →
//! unconditional local persistence.

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;

use crate::{
    api::exchange::{SubmitSummary, TradeSink},
    core::submission::{self, TradeSubmission},
    prelude::*,
    store::{
        Backend, Key, Store,
        record::{PlannedTrade, PublishedTradesRecord},
    },
};

/// What a publish run produced.
#[derive(bon::Builder)]
pub struct Publication {
    pub submissions: Vec<TradeSubmission>,
    pub record: PublishedTradesRecord,
    pub accepted: Option<SubmitSummary>,
}

/// Publish the plan.
///
/// The exchange leg is best-effort: a failure is logged and the local record
/// is marked published regardless, before this function returns. What the
/// user saw is what is saved.
#[instrument(skip_all, fields(n_trades = trades.len(), date = %target_date))]
pub async fn publish<B: Backend>(
    trades: Vec<PlannedTrade>,
    target_date: NaiveDate,
    sink: &impl TradeSink,
    store: &Store<B>,
    now: DateTime<Utc>,
) -> Result<Publication> {
    let submissions = submission::convert_trades(&trades, target_date)?;

    let accepted = if submissions.is_empty() {
        info!("nothing to submit, skipping the exchange");
        None
    } else {
        submission::validate(&submissions)?;
        let starts = submissions.iter().map(|s| s.start_time.format("%H:%MZ")).join(", ");
        debug!(%starts, "converted");
        match sink.submit(&submissions).await {
            Ok(summary) => Some(summary),
            Err(error) => {
                error!("the exchange was unreachable, keeping the plan locally: {error:#}");
                None
            }
        }
    };

    let mut record: PublishedTradesRecord = store.get(Key::PublishedTrades);
    record.planned_trades = trades;
    record.is_published = true;
    record.published_at = Some(now);
    store.set(Key::PublishedTrades, &record);

    Ok(Publication::builder()
        .submissions(submissions)
        .record(record)
        .maybe_accepted(accepted)
        .build())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{quantity::Rupees, store::MemoryBackend};

    struct FailingSink;

    #[async_trait]
    impl TradeSink for FailingSink {
        async fn submit(&self, _trades: &[TradeSubmission]) -> Result<SubmitSummary> {
            bail!("connection refused")
        }
    }

    struct AcceptingSink;

    #[async_trait]
    impl TradeSink for AcceptingSink {
        async fn submit(&self, trades: &[TradeSubmission]) -> Result<SubmitSummary> {
            Ok(SubmitSummary {
                trades_count: trades.len(),
                total_quantity: trades.iter().map(|trade| trade.quantity).sum(),
                total_value: Rupees(25),
                submitted_at: Utc::now(),
            })
        }
    }

    struct UnreachableSink;

    #[async_trait]
    impl TradeSink for UnreachableSink {
        async fn submit(&self, _trades: &[TradeSubmission]) -> Result<SubmitSummary> {
            unreachable!("the sink must not be called for an empty plan");
        }
    }

    fn planned() -> Vec<PlannedTrade> {
        vec![PlannedTrade {
            id: "1".into(),
            time: "10:00 AM – 11:00 AM".to_owned(),
            kwh: 4.0.into(),
            rate: 6.25.into(),
            is_battery: false,
        }]
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 28).expect("valid date")
    }

    #[tokio::test]
    async fn the_publish_is_local_first_when_the_exchange_is_down() -> Result {
        let store = Store::new(MemoryBackend::default());
        let now = Utc::now();

        let publication = publish(planned(), target(), &FailingSink, &store, now).await?;
        assert!(publication.accepted.is_none());

        let record: PublishedTradesRecord = store.get(Key::PublishedTrades);
        assert!(record.is_published);
        assert_eq!(record.published_at, Some(now));
        assert_eq!(record.planned_trades, planned());
        Ok(())
    }

    #[tokio::test]
    async fn an_empty_plan_skips_the_exchange_but_still_publishes() -> Result {
        let store = Store::new(MemoryBackend::default());
        let publication =
            publish(Vec::new(), target(), &UnreachableSink, &store, Utc::now()).await?;
        assert!(publication.submissions.is_empty());

        let record: PublishedTradesRecord = store.get(Key::PublishedTrades);
        assert!(record.is_published);
        assert!(record.planned_trades.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn an_accepted_submission_carries_the_summary() -> Result {
        let store = Store::new(MemoryBackend::default());
        let publication = publish(planned(), target(), &AcceptingSink, &store, Utc::now()).await?;

        let summary = publication.accepted.context("must be accepted")?;
        assert_eq!(summary.trades_count, 1);
        assert_eq!(summary.total_quantity, 4.0.into());
        Ok(())
    }

    #[tokio::test]
    async fn a_malformed_plan_aborts_before_anything_is_saved() {
        let store = Store::new(MemoryBackend::default());
        let mut trades = planned();
        trades[0].time = "whenever".to_owned();

        let result = publish(trades, target(), &FailingSink, &store, Utc::now()).await;
        assert!(result.is_err());

        let record: PublishedTradesRecord = store.get(Key::PublishedTrades);
        assert!(!record.is_published);
    }
}
