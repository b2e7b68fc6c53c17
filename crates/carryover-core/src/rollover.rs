//! Carry-forward of unspent allotment between consecutive periods.

/// Amount carried out of a period into the next one.
///
/// Overspending never carries a negative balance forward; with rollover
/// disabled nothing is carried at all.
pub fn rollover_out(budget_amount: f64, spent_amount: f64, rollover_in: f64, enabled: bool) -> f64 {
    if !enabled {
        return 0.0;
    }
    let available = budget_amount + rollover_in;
    (available - spent_amount).max(0.0)
}
