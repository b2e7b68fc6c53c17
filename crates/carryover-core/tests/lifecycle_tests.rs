mod common;

use carryover_core::{BudgetRepository, CoreError, ErrorKind, PassScope, SnapshotStore};
use carryover_domain::{BudgetPatch, CycleType, EffectiveFrom, NewBudget};
use uuid::Uuid;

use common::{date, Harness};

fn household(h: &Harness) -> NewBudget {
    NewBudget::monthly(h.user, "Household", 1000.0, date(2026, 1, 1))
}

#[test]
fn create_derives_the_current_period() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");

    assert!(budget.last_recalculated_at.is_some());
    assert!(!budget.is_recalculating);
    let april = h
        .store
        .snapshot(budget.id, date(2026, 4, 1))
        .expect("read")
        .expect("april snapshot");
    assert_eq!(april.budget_amount, 1000.0);
    assert_eq!(april.period_end, date(2026, 4, 30));
}

#[test]
fn create_rejects_invalid_input() {
    let h = Harness::at(date(2026, 4, 10));

    let bad_day = household(&h).with_cycle(CycleType::Week, 9);
    let err = h.lifecycle.create_budget(bad_day).expect_err("week day 9");
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut negative = household(&h);
    negative.amount = -5.0;
    assert!(matches!(
        h.lifecycle.create_budget(negative),
        Err(CoreError::Validation(_))
    ));

    let mut unnamed = household(&h);
    unnamed.name = "  ".into();
    assert!(matches!(
        h.lifecycle.create_budget(unnamed),
        Err(CoreError::Validation(_))
    ));
    assert!(h.lifecycle.list_budgets(h.user).expect("list").is_empty());
}

#[test]
fn next_period_edit_parks_the_amount() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");

    let update = h
        .lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(5000.0),
            EffectiveFrom::NextPeriod,
        )
        .expect("deferred edit");

    assert_eq!(update.budget.amount, 1000.0);
    assert_eq!(update.budget.pending_amount, Some(5000.0));
    assert_eq!(update.budget.pending_effective_from, Some(date(2026, 5, 1)));
    assert!(update.recalculation.is_none());
    let april = h
        .store
        .snapshot(budget.id, date(2026, 4, 1))
        .expect("read")
        .expect("april");
    assert_eq!(april.budget_amount, 1000.0);
}

#[test]
fn pending_amount_is_promoted_at_the_boundary() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");
    h.lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(5000.0),
            EffectiveFrom::NextPeriod,
        )
        .expect("deferred edit");

    let early = h.lifecycle.refresh(budget.id).expect("same period refresh");
    assert_eq!(early.promoted_amount, None);

    h.clock.set_date(date(2026, 5, 2));
    let report = h.lifecycle.refresh(budget.id).expect("refresh");
    assert_eq!(report.promoted_amount, Some(5000.0));

    let stored = h.store.budget(budget.id).expect("read").expect("budget");
    assert_eq!(stored.amount, 5000.0);
    assert_eq!(stored.pending_amount, None);
    assert_eq!(stored.pending_effective_from, None);

    let april = h.store.snapshot(budget.id, date(2026, 4, 1)).expect("read").expect("april");
    let may = h.store.snapshot(budget.id, date(2026, 5, 1)).expect("read").expect("may");
    assert_eq!(april.budget_amount, 1000.0);
    assert_eq!(may.budget_amount, 5000.0);
}

#[test]
fn immediate_edit_recalculates_current_period_and_clears_pending() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");
    h.lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(5000.0),
            EffectiveFrom::NextPeriod,
        )
        .expect("deferred edit");

    let update = h
        .lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(1500.0),
            EffectiveFrom::Immediate,
        )
        .expect("immediate edit");

    assert_eq!(update.budget.amount, 1500.0);
    assert_eq!(update.budget.pending_amount, None);
    let report = update.recalculation.expect("pass ran");
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].start, date(2026, 4, 1));
    let april = h.store.snapshot(budget.id, date(2026, 4, 1)).expect("read").expect("april");
    assert_eq!(april.budget_amount, 1500.0);
}

#[test]
fn cosmetic_edit_skips_recalculation() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");

    let patch = BudgetPatch {
        name: Some("Home".into()),
        description: Some(Some("rent excluded".into())),
        ..BudgetPatch::default()
    };
    let update = h
        .lifecycle
        .update_budget(budget.id, h.user, patch, EffectiveFrom::Immediate)
        .expect("rename");
    assert!(update.recalculation.is_none());
    assert_eq!(update.budget.name, "Home");
    assert_eq!(update.budget.description.as_deref(), Some("rent excluded"));
}

#[test]
fn cycle_change_rebuilds_every_snapshot() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");
    h.spend(budget.id, date(2026, 4, 7), 25.0);

    let patch = BudgetPatch {
        cycle_type: Some(CycleType::Week),
        ..BudgetPatch::default()
    };
    h.lifecycle
        .update_budget(budget.id, h.user, patch, EffectiveFrom::Immediate)
        .expect("switch to weekly");

    let rows = h.store.snapshots(budget.id).expect("list");
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0].period_start, date(2025, 12, 29));
    assert!(rows.iter().all(|row| row.window().days() == 7));
    assert_eq!(rows[14].period_start, date(2026, 4, 6));
    assert_eq!(rows[14].spent_amount, 25.0);
}

#[test]
fn edits_are_scoped_to_the_owner() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");
    let stranger = Uuid::new_v4();

    let err = h
        .lifecycle
        .update_budget(budget.id, stranger, BudgetPatch::amount(1.0), EffectiveFrom::Immediate)
        .expect_err("not the owner");
    assert_eq!(err.kind().code(), "BUDGET_NOT_FOUND");
    assert!(matches!(
        h.lifecycle.delete_budget(budget.id, stranger),
        Err(CoreError::BudgetNotFound(_))
    ));
    assert!(h.lifecycle.budget(budget.id, h.user).is_ok());
}

#[test]
fn one_off_budget_cannot_defer() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h
        .lifecycle
        .create_budget(household(&h).one_off())
        .expect("create");

    let err = h
        .lifecycle
        .update_budget(budget.id, h.user, BudgetPatch::amount(10.0), EffectiveFrom::NextPeriod)
        .expect_err("no next period");
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn delete_cascades_snapshots() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");

    h.lifecycle.delete_budget(budget.id, h.user).expect("delete");
    assert!(h.store.snapshots(budget.id).expect("list").is_empty());
    assert!(matches!(
        h.lifecycle.budget(budget.id, h.user),
        Err(CoreError::BudgetNotFound(_))
    ));
    assert!(matches!(
        h.lifecycle.current_usage(budget.id),
        Err(CoreError::BudgetNotFound(_))
    ));
}

#[test]
fn current_usage_reads_the_committed_snapshot() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h
        .lifecycle
        .create_budget(household(&h).with_rollover(true))
        .expect("create");
    let events = h.spend(budget.id, date(2026, 4, 5), 300.0);

    let stale = h.lifecycle.current_usage(budget.id).expect("usage");
    assert_eq!(stale.spent, 0.0);

    h.recalculator.process(&events).expect("pass");
    let usage = h.lifecycle.current_usage(budget.id).expect("usage");
    assert_eq!(usage.spent, 300.0);
    assert_eq!(usage.available, 1000.0);
    assert_eq!(usage.remaining, 700.0);
    assert_eq!(usage.usage_rate, Some(30.0));
}

#[test]
fn current_usage_is_derived_live_for_a_new_period() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h
        .lifecycle
        .create_budget(household(&h).with_rollover(true))
        .expect("create");
    let events = h.spend(budget.id, date(2026, 4, 5), 300.0);
    h.recalculator.process(&events).expect("pass");

    h.clock.set_date(date(2026, 5, 3));
    h.spend(budget.id, date(2026, 5, 2), 1900.0);
    let usage = h.lifecycle.current_usage(budget.id).expect("usage");

    assert_eq!(usage.spent, 1900.0);
    assert_eq!(usage.available, 1700.0);
    assert_eq!(usage.remaining, -200.0);
    assert!(h
        .store
        .snapshot(budget.id, date(2026, 5, 1))
        .expect("read")
        .is_none());
}

#[test]
fn disabling_rollover_clears_carry_over_in_every_period() {
    let h = Harness::at(date(2026, 5, 10));
    let budget = h
        .lifecycle
        .create_budget(household(&h).with_rollover(true))
        .expect("create");
    let may = h.store.snapshot(budget.id, date(2026, 5, 1)).expect("read").expect("may");
    assert_eq!(may.rollover_in, 4000.0);

    let update = h
        .lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch {
                rollover: Some(false),
                ..BudgetPatch::default()
            },
            EffectiveFrom::Immediate,
        )
        .expect("disable rollover");

    let report = update.recalculation.expect("pass ran");
    assert_eq!(report.periods.len(), 5);
    assert!(!update.budget.rollover);
    let derived = h.store.snapshots(budget.id).expect("list");
    assert_eq!(derived.len(), 5);
    for snapshot in &derived {
        assert_eq!(snapshot.rollover_in, 0.0, "{}", snapshot.period_start);
        assert_eq!(snapshot.rollover_out, 0.0, "{}", snapshot.period_start);
    }
    assert_eq!(h.lifecycle.current_usage(budget.id).expect("usage").available, 1000.0);

    h.recalculator
        .recalculate(budget.id, PassScope::Rebuild)
        .expect("rebuild");
    let rebuilt: Vec<_> = h
        .store
        .snapshots(budget.id)
        .expect("list")
        .into_iter()
        .map(|s| (s.period_start, s.rollover_in, s.rollover_out))
        .collect();
    let incremental: Vec<_> = derived
        .into_iter()
        .map(|s| (s.period_start, s.rollover_in, s.rollover_out))
        .collect();
    assert_eq!(rebuilt, incremental);

    h.lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch {
                rollover: Some(true),
                ..BudgetPatch::default()
            },
            EffectiveFrom::Immediate,
        )
        .expect("enable rollover");
    assert_eq!(h.lifecycle.current_usage(budget.id).expect("usage").available, 5000.0);
}

#[test]
fn failed_edit_pass_keeps_the_stored_budget_and_can_be_retried() {
    let h = Harness::at(date(2026, 5, 10));
    let budget = h.lifecycle.create_budget(household(&h)).expect("create");

    h.source.fail_on(Some(date(2026, 5, 1)));
    let err = h
        .lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(2000.0),
            EffectiveFrom::Immediate,
        )
        .expect_err("may query fails");
    assert_eq!(err.kind(), ErrorKind::RecalculationFailed);

    let stored = h.store.budget(budget.id).expect("read").expect("budget");
    assert_eq!(stored.amount, 1000.0);
    assert!(!stored.is_recalculating);
    assert_eq!(stored.last_recalculated_at, budget.last_recalculated_at);
    let may = h.store.snapshot(budget.id, date(2026, 5, 1)).expect("read").expect("may");
    assert_eq!(may.budget_amount, 1000.0);

    h.source.fail_on(None);
    let update = h
        .lifecycle
        .update_budget(
            budget.id,
            h.user,
            BudgetPatch::amount(2000.0),
            EffectiveFrom::Immediate,
        )
        .expect("retry");
    assert!(update.recalculation.is_some());
    assert_eq!(update.budget.amount, 2000.0);
    assert_eq!(h.lifecycle.current_usage(budget.id).expect("usage").available, 2000.0);
}

#[test]
fn reactivation_picks_up_spending_recorded_while_inactive() {
    let h = Harness::at(date(2026, 4, 10));
    let budget = h
        .lifecycle
        .create_budget(household(&h).with_rollover(true))
        .expect("create");
    let pause = BudgetPatch {
        is_active: Some(false),
        ..BudgetPatch::default()
    };
    let paused = h
        .lifecycle
        .update_budget(budget.id, h.user, pause, EffectiveFrom::Immediate)
        .expect("deactivate");
    assert!(paused.recalculation.is_none());

    let events = h.spend(budget.id, date(2026, 2, 14), 400.0);
    let skipped = h.recalculator.process(&events).expect("skipped");
    assert!(skipped[0].skipped);

    let resume = BudgetPatch {
        is_active: Some(true),
        ..BudgetPatch::default()
    };
    h.lifecycle
        .update_budget(budget.id, h.user, resume, EffectiveFrom::Immediate)
        .expect("reactivate");
    let february = h.store.snapshot(budget.id, date(2026, 2, 1)).expect("read").expect("feb");
    assert_eq!(february.spent_amount, 400.0);
    assert_eq!(h.lifecycle.current_usage(budget.id).expect("usage").available, 3600.0);
}
