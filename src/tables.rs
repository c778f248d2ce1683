use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{slot::ActiveTrade, submission::TradeSubmission},
    quantity::KilowattHourRate,
    store::record::{ConfirmedTrade, PublishedTradesRecord},
};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(header);
    table
}

#[must_use]
pub fn build_plan_table(trades: &[ActiveTrade]) -> Table {
    #[expect(clippy::cast_precision_loss)]
    let mean_rate = KilowattHourRate::from(if trades.is_empty() {
        0.0
    } else {
        trades.iter().map(|trade| trade.rate.0.0).sum::<f64>() / trades.len() as f64
    });

    let mut table = new_table(vec!["Window", "Source", "Volume", "Rate", "Earnings"]);
    for trade in trades {
        table.add_row(vec![
            Cell::new(&trade.time),
            if trade.is_battery {
                Cell::new("battery").fg(Color::Magenta)
            } else {
                Cell::new("solar").fg(Color::Green)
            },
            Cell::new(trade.kwh).set_alignment(CellAlignment::Right),
            Cell::new(trade.rate).set_alignment(CellAlignment::Right).fg(
                if trade.rate >= mean_rate { Color::Green } else { Color::DarkYellow },
            ),
            Cell::new(trade.earnings)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);
    }
    table
}

#[must_use]
pub fn build_submission_table(submissions: &[TradeSubmission]) -> Table {
    let mut table = new_table(vec!["Date", "Start (UTC)", "End (UTC)", "Quantity", "Price"]);
    for submission in submissions {
        table.add_row(vec![
            Cell::new(submission.date),
            Cell::new(submission.start_time.format("%H:%M")),
            Cell::new(submission.end_time.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(submission.quantity).set_alignment(CellAlignment::Right),
            Cell::new(submission.price).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[must_use]
pub fn build_report_table(record: &PublishedTradesRecord) -> Table {
    let mut table = new_table(vec!["", "Trades", "Units", "Earnings", "Avg rate"]);
    table.add_row(vec![
        Cell::new("Planned"),
        Cell::new(record.planned_trades.len()).set_alignment(CellAlignment::Right),
        Cell::new(record.planned_units()).set_alignment(CellAlignment::Right),
        Cell::new(record.planned_earnings()).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    if record.show_confirmed_trades {
        table.add_row(vec![
            Cell::new("Confirmed"),
            Cell::new(record.confirmed_trades.len()).set_alignment(CellAlignment::Right),
            Cell::new(record.confirmed_units()).set_alignment(CellAlignment::Right),
            Cell::new(record.confirmed_earnings())
                .set_alignment(CellAlignment::Right)
                .fg(Color::Green),
            Cell::new(""),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(record.planned_trades.len() + record.confirmed_trades.len())
            .set_alignment(CellAlignment::Right),
        Cell::new(record.total_units())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(record.total_earnings())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(record.average_rate()).set_alignment(CellAlignment::Right),
    ]);
    table
}

#[must_use]
pub fn build_confirmed_table(trades: &[ConfirmedTrade]) -> Table {
    let mut table = new_table(vec!["Window", "Buyer", "Volume", "Rate", "Earnings"]);
    for trade in trades {
        table.add_row(vec![
            Cell::new(&trade.time),
            Cell::new(trade.buyer.as_deref().unwrap_or("—")),
            Cell::new(trade.kwh).set_alignment(CellAlignment::Right),
            Cell::new(trade.rate).set_alignment(CellAlignment::Right),
            Cell::new(trade.earnings)
                .set_alignment(CellAlignment::Right)
                .fg(Color::Green),
        ]);
    }
    table
}
