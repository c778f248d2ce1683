#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod prelude;
mod publish;
mod quantity;
mod store;
mod tables;

use chrono::Utc;
use clap::{Parser, crate_version};

use crate::{
    api::{
        exchange,
        forecast::{self, ForecastProvider, ForecastWindow},
    },
    cli::{
        AdjustArgs, Args, AutomationArgs, Command, DebugCommand, ForecastArgs, ForecastDebugArgs,
        PlanArgs, PublishArgs, SayArgs,
    },
    core::{
        command, countdown, ist,
        plan::Plan,
        slot::{BaseSlot, fallback_slots},
        submission,
    },
    prelude::*,
    store::{
        FileBackend, FileStore, Key,
        record::{
            AutomationMode, AutomationPreference, PlannedTrade, PublishedTradesRecord,
            synthesize_confirmations,
        },
    },
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let store = FileStore::new(FileBackend::new(&args.store.data_dir));

    match args.command {
        Command::Plan(args) => plan(&store, &args).await?,
        Command::Say(args) => say(&store, &args).await?,
        Command::Publish(args) => run_publish(&store, *args).await?,
        Command::Report => report(&store),
        Command::Automation(args) => automation(&store, &args),
        Command::Clear => clear(&store),
        Command::Debug(args) => match args.command {
            DebugCommand::Record => debug_record(&store)?,
            DebugCommand::Forecast(args) => debug_forecast(&args).await?,
            DebugCommand::Confirm => debug_confirm(&store),
        },
    }

    info!("done!");
    Ok(())
}

/// Forecast through the cache; fall back to the built-in candidates when the
/// catalogue is unreachable or empty.
async fn load_slots(
    store: &FileStore,
    args: &ForecastArgs,
    user_id: Option<&str>,
) -> Result<Vec<BaseSlot>> {
    let now = Utc::now();
    let cached: Option<Vec<ForecastWindow>> = if args.refresh {
        None
    } else {
        store.get_cached(Key::ForecastCache, forecast::cache_ttl(), now)
    };

    let windows = match cached {
        Some(windows) => {
            debug!(n_windows = windows.len(), "using the cached forecast");
            windows
        }
        None => {
            let provider =
                forecast::Api::try_new(args.forecast_url.clone(), user_id.map(str::to_owned))?;
            match provider.get_windows().await {
                Ok(windows) => {
                    store.set_cached(Key::ForecastCache, &windows, now);
                    windows
                }
                Err(error) => {
                    warn!("forecast unavailable, using the built-in candidates: {error:#}");
                    Vec::new()
                }
            }
        }
    };

    Ok(if windows.is_empty() { fallback_slots() } else { forecast::to_slots(&windows) })
}

/// Apply the inline adjustments in order: explicit exclusions, the pause
/// flag, then the free-text instructions.
fn build_plan(slots: Vec<BaseSlot>, adjust: &AdjustArgs) -> (Plan, Vec<String>) {
    let mut plan = Plan::new(slots);
    for id in &adjust.exclude {
        plan.exclude_slot(id.as_str().into());
    }
    if adjust.pause {
        plan.pause_all();
    }
    let replies = adjust.say.iter().map(|text| command::run(text, &mut plan)).collect();
    (plan, replies)
}

fn print_plan(plan: &Plan) {
    if plan.is_paused() {
        println!("All trades are paused for tomorrow. Nothing will be published.");
        return;
    }
    println!("{}", tables::build_plan_table(&plan.active_trades()));
    println!("Expected: {} for {}.", plan.total_earnings(), plan.total_units());
}

fn save_draft(store: &FileStore, plan: &Plan) {
    let mut record: PublishedTradesRecord = store.get(Key::PublishedTrades);
    record.update_planned_trades(plan.active_trades().into_iter().map(Into::into).collect());
    store.set(Key::PublishedTrades, &record);
    info!("saved the adjusted plan as the draft");
}

async fn plan(store: &FileStore, args: &PlanArgs) -> Result {
    let slots = load_slots(store, &args.forecast, args.identity.user_id.as_deref()).await?;
    let (plan, replies) = build_plan(slots, &args.adjust);
    for reply in &replies {
        println!("{reply}");
    }
    print_plan(&plan);

    let mode = store.get::<AutomationPreference>(Key::Automation).mode;
    let now_ist = Utc::now().with_timezone(&ist()).naive_local();
    let remaining = countdown::format_countdown(countdown::until_next_refresh(now_ist));
    println!("mode: {mode} · refreshes in {remaining}");

    if !args.adjust.is_empty() {
        save_draft(store, &plan);
    }
    Ok(())
}

async fn say(store: &FileStore, args: &SayArgs) -> Result {
    let slots = load_slots(store, &args.forecast, args.identity.user_id.as_deref()).await?;
    let mut plan = Plan::new(slots);
    let reply = command::run(&args.text, &mut plan);
    println!("{reply}");
    print_plan(&plan);
    save_draft(store, &plan);
    Ok(())
}

async fn run_publish(store: &FileStore, args: PublishArgs) -> Result {
    let slots = load_slots(store, &args.forecast, args.identity.user_id.as_deref()).await?;
    let (plan, replies) = build_plan(slots, &args.adjust);
    for reply in &replies {
        println!("{reply}");
    }

    let now = Utc::now();
    let target_date = match args.date {
        Some(date) => date,
        None => submission::tomorrow_ist(now)?,
    };
    let trades: Vec<PlannedTrade> = plan.active_trades().into_iter().map(Into::into).collect();

    if args.dry_run {
        let submissions = submission::convert_trades(&trades, target_date)?;
        println!("{}", tables::build_submission_table(&submissions));
        info!("dry run, nothing was sent or saved");
        return Ok(());
    }

    let previous: PublishedTradesRecord = store.get(Key::PublishedTrades);
    let mode = store.get::<AutomationPreference>(Key::Automation).mode;
    if mode == AutomationMode::Recommend
        && args.adjust.is_empty()
        && previous.planned_trades.is_empty()
    {
        warn!("publishing the untouched forecast in `recommend` mode; run `plan` first to review");
    }

    let sink = exchange::Api::try_new(
        args.exchange_url.clone(),
        args.identity.user_id.clone(),
        args.identity.device_id.clone(),
    )?;
    let publication = publish::publish(trades, target_date, &sink, store, now).await?;

    println!("{}", tables::build_submission_table(&publication.submissions));
    match &publication.accepted {
        Some(summary) => println!(
            "Accepted by the exchange: {} trades, {} for {}.",
            summary.trades_count, summary.total_value, summary.total_quantity,
        ),
        None if publication.submissions.is_empty() => {
            println!("Nothing to submit; the record is still marked published.");
        }
        None => println!("The exchange was unreachable; the plan is saved and marked published."),
    }
    if let Some(at) = publication.record.published_at {
        println!("Published at {}.", at.with_timezone(&ist()).format("%-I:%M %p"));
    }
    Ok(())
}

fn report(store: &FileStore) {
    let record: PublishedTradesRecord = store.get(Key::PublishedTrades);
    println!("{}", tables::build_report_table(&record));
    if record.show_confirmed_trades && !record.confirmed_trades.is_empty() {
        println!("{}", tables::build_confirmed_table(&record.confirmed_trades));
    }
    println!("status: {}", record.status());
    if let Some(at) = record.published_at {
        println!("published at {}", at.with_timezone(&ist()).format("%Y-%m-%d %-I:%M %p"));
    }
}

fn automation(store: &FileStore, args: &AutomationArgs) {
    match args.mode {
        Some(mode) => {
            store.set(Key::Automation, &AutomationPreference { mode });
            println!("automation mode set to `{mode}`");
        }
        None => {
            let mode = store.get::<AutomationPreference>(Key::Automation).mode;
            println!("automation mode: {mode}");
        }
    }
}

fn clear(store: &FileStore) {
    store.clear(Key::PublishedTrades);
    println!("Cleared the published-trades record.");
}

fn debug_record(store: &FileStore) -> Result {
    let record: PublishedTradesRecord = store.get(Key::PublishedTrades);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn debug_forecast(args: &ForecastDebugArgs) -> Result {
    let provider = forecast::Api::try_new(
        args.forecast.forecast_url.clone(),
        args.identity.user_id.clone(),
    )?;
    let windows = provider.get_windows().await?;
    println!("{}", serde_json::to_string_pretty(&windows)?);
    Ok(())
}

fn debug_confirm(store: &FileStore) {
    let mut record: PublishedTradesRecord = store.get(Key::PublishedTrades);
    let confirmations = synthesize_confirmations(&record.planned_trades);
    if confirmations.is_empty() {
        warn!("no planned trades to confirm; publish or save a draft first");
        return;
    }
    record.confirm_trades(confirmations);
    store.set(Key::PublishedTrades, &record);
    println!("{}", tables::build_confirmed_table(&record.confirmed_trades));
    println!("status: {}", record.status());
}
