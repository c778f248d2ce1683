//! Free-text plan adjustments.
//!
//! An ordered rule list, not a language model: the first rule that recognizes
//! the text wins, and each rule maps to exactly one plan mutation. Text that
//! matches nothing is acknowledged and leaves the plan untouched.

use std::{iter::Peekable, str::SplitWhitespace};

use crate::{
    core::{
        plan::Plan,
        slot::{SlotId, hour_label},
    },
    quantity::KilowattHourRate,
};

/// Slots from 1 PM onwards count as afternoon/evening.
const EVENING_STARTS_AT: u32 = 13;

const FALLBACK: &str = "Got it. I'll keep that in mind while planning tomorrow.";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Publish nothing tomorrow.
    PauseAll,

    /// Lift the pause and forget individual exclusions.
    ///
    /// Deliberately broader than [`Plan::resume_all`]: the spoken "resume"
    /// also resets per-slot exclusions.
    Resume,

    /// Exclude every slot starting within `[start_hour, end_hour)`.
    ExcludeWindow { start_hour: u32, end_hour: u32 },

    /// Keep only slots priced at the floor or better.
    PriceFloor(KilowattHourRate),

    /// Keep the afternoon and evening free for the household.
    EveningGuests,
}

type Matcher = fn(&str) -> Option<Command>;

/// Evaluated top to bottom; the first match wins.
const RULES: &[Matcher] = &[pause_all, resume, time_window, price_floor, evening_guests];

impl Command {
    #[must_use]
    pub fn interpret(text: &str) -> Option<Self> {
        let text = text.to_lowercase().replace('’', "'");
        RULES.iter().find_map(|matches| matches(&text))
    }

    /// Mutate the plan and return the spoken confirmation.
    pub fn apply(&self, plan: &mut Plan) -> String {
        match self {
            Self::PauseAll => {
                plan.pause_all();
                "Paused. No energy will be sold tomorrow.".to_owned()
            }

            Self::Resume => {
                plan.resume_all();
                plan.reset_exclusions();
                "Resumed. Tomorrow's full plan is back on.".to_owned()
            }

            Self::ExcludeWindow { start_hour, end_hour } => {
                let matched: Vec<SlotId> = (*start_hour..*end_hour)
                    .filter_map(|hour| plan.slot_at_hour(hour).cloned())
                    .collect();
                for id in &matched {
                    plan.exclude_slot(id.clone());
                }
                format!(
                    "No selling between {} and {}. {} time slots excluded.",
                    hour_label(*start_hour),
                    hour_label(*end_hour),
                    matched.len(),
                )
            }

            Self::PriceFloor(floor) => {
                let matched: Vec<SlotId> = plan
                    .base_slots()
                    .iter()
                    .filter(|slot| slot.rate < *floor)
                    .map(|slot| slot.id.clone())
                    .collect();
                for id in &matched {
                    plan.exclude_slot(id.clone());
                }
                format!("Selling only at {floor} or better. {} slots excluded.", matched.len())
            }

            Self::EveningGuests => {
                let matched: Vec<SlotId> = plan
                    .base_slots()
                    .iter()
                    .filter(|slot| slot.start_hour >= EVENING_STARTS_AT)
                    .map(|slot| slot.id.clone())
                    .collect();
                for id in &matched {
                    plan.exclude_slot(id.clone());
                }
                format!(
                    "I'll keep the afternoon and evening free. {} slots held back.",
                    matched.len(),
                )
            }
        }
    }
}

/// Interpret and apply in one go.
pub fn run(text: &str, plan: &mut Plan) -> String {
    Command::interpret(text).map_or_else(|| FALLBACK.to_owned(), |command| command.apply(plan))
}

fn pause_all(text: &str) -> Option<Command> {
    (text.contains("pause all") || text.contains("stop all")).then_some(Command::PauseAll)
}

fn resume(text: &str) -> Option<Command> {
    (text.contains("resume") || text.contains("unpause")).then_some(Command::Resume)
}

fn time_window(text: &str) -> Option<Command> {
    let rest = ["don't sell", "do not sell", "no sell"]
        .into_iter()
        .find_map(|trigger| text.split_once(trigger))
        .map(|(_, rest)| rest)?;
    let (start_hour, end_hour) = parse_window(rest)?;
    Some(Command::ExcludeWindow { start_hour, end_hour })
}

fn price_floor(text: &str) -> Option<Command> {
    let (_, rest) = text.split_once("price")?;
    let (_, rest) = rest.split_once('>')?;
    let rest = rest.trim_start().trim_start_matches('₹');
    let number: String =
        rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
    let floor: f64 = number.parse().ok()?;
    Some(Command::PriceFloor(floor.into()))
}

fn evening_guests(text: &str) -> Option<Command> {
    (text.contains("guest") || text.contains("evening")).then_some(Command::EveningGuests)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Meridiem {
    Am,
    Pm,
}

struct Bound {
    hour: u32,
    meridiem: Option<Meridiem>,
}

/// Parse "… [between] H [am|pm] and|to|- H [am|pm] …" into a 24-hour range.
fn parse_window(rest: &str) -> Option<(u32, u32)> {
    let rest = rest.replace(['–', '-'], " to ");
    let mut tokens = rest.split_whitespace().peekable();

    skip_until_digit(&mut tokens);
    let start = parse_bound(&mut tokens)?;

    let mut saw_separator = false;
    while let Some(token) = tokens.peek() {
        if starts_with_digit(token) {
            break;
        }
        if matches!(*token, "and" | "to") {
            saw_separator = true;
        }
        tokens.next();
    }
    if !saw_separator {
        return None;
    }
    let end = parse_bound(&mut tokens)?;

    // A bare bound inherits the other side's period: "between 1 and 3 PM"
    // reads as PM on both sides.
    let start_hour = to_24h(start.hour, start.meridiem.or(end.meridiem));
    let end_hour = to_24h(end.hour, end.meridiem.or(start.meridiem));
    Some((start_hour, end_hour))
}

fn skip_until_digit(tokens: &mut Peekable<SplitWhitespace<'_>>) {
    while let Some(token) = tokens.peek() {
        if starts_with_digit(token) {
            break;
        }
        tokens.next();
    }
}

fn starts_with_digit(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn parse_bound(tokens: &mut Peekable<SplitWhitespace<'_>>) -> Option<Bound> {
    let token = tokens.next()?;
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let hour: u32 = digits.parse().ok()?;
    if hour > 23 {
        return None;
    }

    // The period may be glued to the number ("3pm") or stand alone ("3 pm").
    let mut meridiem = parse_meridiem(&token[digits.len()..]);
    if meridiem.is_none()
        && let Some(next) = tokens.peek()
        && let Some(found) = parse_meridiem(next)
    {
        meridiem = Some(found);
        tokens.next();
    }

    Some(Bound { hour, meridiem })
}

fn parse_meridiem(token: &str) -> Option<Meridiem> {
    match token.trim_matches('.') {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

fn to_24h(hour: u32, meridiem: Option<Meridiem>) -> u32 {
    match meridiem {
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        Some(Meridiem::Am) if hour == 12 => 0,
        _ => hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slot::fallback_slots;

    fn plan() -> Plan {
        Plan::new(fallback_slots())
    }

    #[test]
    fn time_window_excludes_exactly_the_covered_slots() {
        let mut plan = plan();
        let reply = run("Don't sell between 1 and 3 PM", &mut plan);
        assert!(reply.contains("2 time slots excluded"), "unexpected reply: {reply}");
        assert!(reply.contains("1:00 PM"));
        assert!(reply.contains("3:00 PM"));

        let trades = plan.active_trades();
        assert_eq!(trades.len(), 4);
        assert!(!trades.iter().any(|trade| trade.time.starts_with("1:00 PM")));
        assert!(!trades.iter().any(|trade| trade.time.starts_with("2:00 PM")));
    }

    #[test]
    fn time_window_with_explicit_periods_on_both_sides() {
        assert_eq!(
            Command::interpret("do not sell between 9 am and 12 pm"),
            Some(Command::ExcludeWindow { start_hour: 9, end_hour: 12 }),
        );
    }

    #[test]
    fn time_window_accepts_dashes_and_glued_periods() {
        assert_eq!(
            Command::interpret("don't sell 1-3pm"),
            Some(Command::ExcludeWindow { start_hour: 13, end_hour: 15 }),
        );
        assert_eq!(
            Command::interpret("no sell between 10 and 11"),
            Some(Command::ExcludeWindow { start_hour: 10, end_hour: 11 }),
        );
    }

    #[test]
    fn price_floor_excludes_strictly_below() {
        let mut plan = plan();
        let reply = run("Only sell if price > ₹6.30", &mut plan);
        assert!(reply.contains("2 slots excluded"), "unexpected reply: {reply}");

        let trades = plan.active_trades();
        assert_eq!(trades.len(), 4);
        assert!(trades.iter().all(|trade| trade.rate >= 6.30.into()));
    }

    #[test]
    fn pause_all_confirms_nothing_will_be_sold() {
        let mut plan = plan();
        let reply = run("Please pause all trades for tomorrow", &mut plan);
        assert!(reply.contains("No energy will be sold"));
        assert!(plan.active_trades().is_empty());
    }

    #[test]
    fn spoken_resume_clears_exclusions_unlike_the_manual_one() {
        let mut manual = plan();
        manual.exclude_slot("1".into());
        manual.pause_all();
        manual.resume_all();

        let mut spoken = plan();
        spoken.exclude_slot("1".into());
        spoken.pause_all();
        run("resume selling please", &mut spoken);

        assert_eq!(manual.active_trades().len(), 5);
        assert_eq!(spoken.active_trades().len(), 6);
    }

    #[test]
    fn guests_keep_the_afternoon_and_evening_free() {
        let mut plan = plan();
        let reply = run("I'll have guests tomorrow evening", &mut plan);
        assert!(reply.contains("3 slots held back"), "unexpected reply: {reply}");
        assert!(plan.active_trades().iter().all(|trade| trade.start_hour < EVENING_STARTS_AT));
    }

    #[test]
    fn unrecognized_text_acknowledges_without_mutating() {
        let mut plan = plan();
        let before = plan.active_trades();
        let reply = run("what will the weather be like", &mut plan);
        assert_eq!(reply, FALLBACK);
        assert_eq!(plan.active_trades(), before);
    }

    #[test]
    fn earlier_rules_shadow_later_ones() {
        // "stop all" outranks the evening heuristic.
        let mut plan = plan();
        run("stop all selling this evening", &mut plan);
        assert!(plan.active_trades().is_empty());

        // A window that fails to parse falls through to the price rule.
        assert_eq!(
            Command::interpret("don't sell when the price > 6"),
            Some(Command::PriceFloor(6.0.into())),
        );
    }
}
