use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::store::record::AutomationMode;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[clap(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview tomorrow's plan: forecast, adjustments, totals.
    #[clap(name = "plan")]
    Plan(Box<PlanArgs>),

    /// Interpret a free-text instruction and apply it to tomorrow's plan.
    #[clap(name = "say")]
    Say(Box<SayArgs>),

    /// Publish tomorrow's plan: convert, submit to the exchange, persist locally.
    #[clap(name = "publish")]
    Publish(Box<PublishArgs>),

    /// Show the published and confirmed totals.
    #[clap(name = "report")]
    Report,

    /// Read or set the automation mode.
    #[clap(name = "automation")]
    Automation(AutomationArgs),

    /// Reset the published-trades record.
    #[clap(name = "clear")]
    Clear,

    /// Development tools.
    #[clap(name = "debug")]
    Debug(Box<DebugArgs>),
}

#[derive(Parser)]
pub struct StoreArgs {
    /// Directory for the local JSON records.
    #[clap(long = "data-dir", env = "MYNA_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
}

#[derive(Parser)]
pub struct ForecastArgs {
    /// Forecast catalogue endpoint.
    #[clap(
        long = "forecast-url",
        env = "MYNA_FORECAST_URL",
        default_value = "http://localhost:3001/api/bpp/catalogue/forecast"
    )]
    pub forecast_url: Url,

    /// Bypass the cached forecast.
    #[clap(long)]
    pub refresh: bool,
}

#[derive(Parser)]
pub struct IdentityArgs {
    #[clap(long = "user-id", env = "MYNA_USER_ID")]
    pub user_id: Option<String>,

    #[clap(long = "device-id", env = "MYNA_DEVICE_ID")]
    pub device_id: Option<String>,
}

#[derive(Parser)]
pub struct AdjustArgs {
    /// Publish nothing tomorrow.
    #[clap(long)]
    pub pause: bool,

    /// Exclude a slot by id (repeatable).
    #[clap(long = "exclude", value_name = "SLOT_ID")]
    pub exclude: Vec<String>,

    /// Free-text instruction, e.g. "don't sell between 1 and 3 PM" (repeatable).
    #[clap(long = "say", value_name = "TEXT")]
    pub say: Vec<String>,
}

impl AdjustArgs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.pause && self.exclude.is_empty() && self.say.is_empty()
    }
}

#[derive(Parser)]
pub struct PlanArgs {
    #[clap(flatten)]
    pub forecast: ForecastArgs,

    #[clap(flatten)]
    pub identity: IdentityArgs,

    #[clap(flatten)]
    pub adjust: AdjustArgs,
}

#[derive(Parser)]
pub struct SayArgs {
    /// The instruction.
    pub text: String,

    #[clap(flatten)]
    pub forecast: ForecastArgs,

    #[clap(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Parser)]
pub struct PublishArgs {
    /// Convert and show the submissions without touching the exchange or the record.
    #[clap(long = "dry-run")]
    pub dry_run: bool,

    /// Target calendar date (defaults to tomorrow on the IST calendar).
    #[clap(long)]
    pub date: Option<NaiveDate>,

    /// Trade-acceptance endpoint.
    #[clap(
        long = "exchange-url",
        env = "MYNA_EXCHANGE_URL",
        default_value = "http://localhost:3001/api/trades/submit"
    )]
    pub exchange_url: Url,

    #[clap(flatten)]
    pub forecast: ForecastArgs,

    #[clap(flatten)]
    pub identity: IdentityArgs,

    #[clap(flatten)]
    pub adjust: AdjustArgs,
}

#[derive(Parser)]
pub struct AutomationArgs {
    /// New mode; prints the current one when omitted.
    #[clap(value_enum)]
    pub mode: Option<AutomationMode>,
}

#[derive(Parser)]
pub struct DebugArgs {
    #[command(subcommand)]
    pub command: DebugCommand,
}

#[derive(Subcommand)]
pub enum DebugCommand {
    /// Dump the raw published-trades record.
    Record,

    /// Fetch and dump the raw forecast windows.
    Forecast(ForecastDebugArgs),

    /// Synthesize an exchange match event for the first two planned trades.
    Confirm,
}

#[derive(Parser)]
pub struct ForecastDebugArgs {
    #[clap(flatten)]
    pub forecast: ForecastArgs,

    #[clap(flatten)]
    pub identity: IdentityArgs,
}
