use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::slot::{ActiveTrade, BaseSlot, SlotId},
    quantity::{KilowattHours, Rupees},
};

/// User-driven removals on top of the candidate slots.
///
/// Lives in memory for one invocation only. Only the derived result (the
/// active plan) is ever persisted.
#[derive(Clone, Debug, Default)]
pub struct ExclusionState {
    excluded: BTreeSet<SlotId>,
    paused: bool,
}

/// Tomorrow's plan: the immutable candidate slots plus the exclusion state.
#[derive(Clone, Debug)]
pub struct Plan {
    slots: Vec<BaseSlot>,
    by_hour: BTreeMap<u32, SlotId>,
    exclusions: ExclusionState,
}

impl Plan {
    #[must_use]
    pub fn new(slots: Vec<BaseSlot>) -> Self {
        let by_hour = slots.iter().map(|slot| (slot.start_hour, slot.id.clone())).collect();
        Self { slots, by_hour, exclusions: ExclusionState::default() }
    }

    /// Remove one slot from the plan. Unknown ids are harmless: they never match.
    pub fn exclude_slot(&mut self, id: SlotId) {
        self.exclusions.excluded.insert(id);
    }

    /// Publish nothing tomorrow, regardless of individual exclusions.
    pub fn pause_all(&mut self) {
        self.exclusions.paused = true;
    }

    /// Lift the pause. Individual exclusions stay in place.
    pub fn resume_all(&mut self) {
        self.exclusions.paused = false;
    }

    /// Forget every individual exclusion. The pause flag stays as it is.
    pub fn reset_exclusions(&mut self) {
        self.exclusions.excluded.clear();
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.exclusions.paused
    }

    #[must_use]
    pub fn slot_at_hour(&self, hour: u32) -> Option<&SlotId> {
        self.by_hour.get(&hour)
    }

    #[must_use]
    pub fn base_slots(&self) -> &[BaseSlot] {
        &self.slots
    }

    /// The derived active plan. Pure: repeated calls with unchanged state
    /// return structurally equal results, and every aggregate is a fold over
    /// this very list.
    #[must_use]
    pub fn active_trades(&self) -> Vec<ActiveTrade> {
        if self.exclusions.paused {
            return Vec::new();
        }
        let mut trades: Vec<ActiveTrade> = self
            .slots
            .iter()
            .filter(|slot| !self.exclusions.excluded.contains(&slot.id))
            .map(ActiveTrade::from)
            .collect();
        trades.sort_by_key(|trade| trade.start_hour);
        trades
    }

    #[must_use]
    pub fn total_units(&self) -> KilowattHours {
        self.active_trades().iter().map(|trade| trade.kwh).sum()
    }

    #[must_use]
    pub fn total_earnings(&self) -> Rupees {
        self.active_trades().iter().map(|trade| trade.earnings).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slot::fallback_slots;

    #[test]
    fn active_plan_is_idempotent() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("3".into());
        assert_eq!(plan.active_trades(), plan.active_trades());
    }

    #[test]
    fn pause_dominates_the_exclusion_set() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("1".into());
        plan.pause_all();
        assert!(plan.active_trades().is_empty());
        assert_eq!(plan.total_units(), KilowattHours::ZERO);
    }

    #[test]
    fn manual_resume_keeps_exclusions() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("1".into());
        plan.pause_all();
        plan.resume_all();
        let trades = plan.active_trades();
        assert_eq!(trades.len(), 5);
        assert!(!trades.iter().any(|trade| trade.id == "1".into()));
    }

    #[test]
    fn excluding_an_unknown_id_is_harmless() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("no-such-slot".into());
        assert_eq!(plan.active_trades().len(), 6);
    }

    #[test]
    fn reset_clears_exclusions_but_not_the_pause() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("1".into());
        plan.pause_all();
        plan.reset_exclusions();
        assert!(plan.active_trades().is_empty());
        plan.resume_all();
        assert_eq!(plan.active_trades().len(), 6);
    }

    #[test]
    fn aggregates_always_equal_the_fold() {
        let mut plan = Plan::new(fallback_slots());
        plan.exclude_slot("2".into());
        plan.exclude_slot("6".into());
        let trades = plan.active_trades();
        let units: KilowattHours = trades.iter().map(|trade| trade.kwh).sum();
        let earnings: Rupees = trades.iter().map(|trade| trade.kwh * trade.rate).sum();
        assert_eq!(plan.total_units(), units);
        assert_eq!(plan.total_earnings(), earnings);
    }
}
