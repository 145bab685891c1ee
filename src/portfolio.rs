use crate::debt::{DebtRecord, RecordSet};
use crate::payoff::{compute_payoff_schedule, PayoffError, PayoffSchedule};
use chrono::NaiveDate;
use log::{debug, info};
use std::cmp::Ordering;

/// A debt together with its schedule as of some evaluation date.
#[derive(Clone, PartialEq, Debug)]
pub struct PlannedDebt {
    pub record: DebtRecord,
    pub outcome: Result<PayoffSchedule, PayoffError>,
}

impl PlannedDebt {
    pub fn evaluate(record: DebtRecord, evaluation_date: NaiveDate) -> Self {
        let outcome = compute_payoff_schedule(
            record.principal,
            record.apr,
            record.minimum_payment,
            evaluation_date,
        );
        if let Err(err) = &outcome {
            debug!("'{}' has no payoff schedule: {}", record.name, err);
        }
        Self { record, outcome }
    }

    pub fn schedule(&self) -> Option<&PayoffSchedule> {
        self.outcome.as_ref().ok()
    }
}

/// Recomputes every schedule in `records`, keeping insertion order.
pub fn plan_all(records: &RecordSet, evaluation_date: NaiveDate) -> Vec<PlannedDebt> {
    records
        .iter()
        .cloned()
        .map(|record| PlannedDebt::evaluate(record, evaluation_date))
        .collect()
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PortfolioSummary {
    pub debts: usize,
    pub total_debt: f64,
    pub monthly_payments: f64,
    pub total_interest: f64,
    /// Latest payoff date among debts that pay off. `None` when none do.
    pub overall_payoff_date: Option<NaiveDate>,
    /// Debts without a schedule. While any exist the portfolio never clears.
    pub unpayable: usize,
}

impl PortfolioSummary {
    pub fn is_empty(&self) -> bool {
        self.debts == 0
    }

    /// Date the last debt is gone, if every debt gets there.
    pub fn debt_free_date(&self) -> Option<NaiveDate> {
        if self.unpayable > 0 {
            None
        } else {
            self.overall_payoff_date
        }
    }
}

pub fn summarize(planned: &[PlannedDebt]) -> PortfolioSummary {
    let summary = planned
        .iter()
        .fold(PortfolioSummary::default(), |mut acc, debt| {
            acc.debts += 1;
            acc.total_debt += debt.record.principal;
            acc.monthly_payments += debt.record.minimum_payment;
            match &debt.outcome {
                Ok(schedule) => {
                    acc.total_interest += schedule.total_interest;
                    acc.overall_payoff_date = acc.overall_payoff_date.max(Some(schedule.payoff_date));
                }
                Err(_) => acc.unpayable += 1,
            }
            acc
        });
    info!(
        "{} debts, total ${:.2}, monthly ${:.2}, payoff {:?}",
        summary.debts, summary.total_debt, summary.monthly_payments, summary.overall_payoff_date
    );
    summary
}

/// Payoff priority: most total interest first. Debts that never pay off (or
/// cannot be evaluated) come before all others. Ties keep insertion order.
pub fn prioritize(planned: &[PlannedDebt]) -> Vec<&PlannedDebt> {
    let mut ordered: Vec<&PlannedDebt> = planned.iter().collect();
    ordered.sort_by(|a, b| match (a.schedule(), b.schedule()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b
            .total_interest
            .partial_cmp(&a.total_interest)
            .unwrap_or(Ordering::Equal),
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::sample;
    use test_log::test;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn portfolio() -> RecordSet {
        [
            sample("Car", 15000., 6.5, 350.),
            sample("Visa", 5000., 20., 200.),
            sample("Card", 10000., 18., 300.),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary() {
        let planned = plan_all(&portfolio(), start());
        let summary = summarize(&planned);

        assert_eq!(summary.debts, 3);
        assert_eq!(summary.total_debt, 30000.);
        assert_eq!(summary.monthly_payments, 850.);
        assert!((summary.total_interest - (2150. + 1600. + 4100.)).abs() < 1e-6);
        assert_eq!(summary.unpayable, 0);

        let latest = planned
            .iter()
            .filter_map(|p| p.schedule().map(|s| s.payoff_date))
            .max();
        assert_eq!(summary.overall_payoff_date, latest);
        // the car loan runs longest, 49 * 30 days
        assert_eq!(
            summary.overall_payoff_date,
            start().checked_add_days(chrono::Days::new(49 * 30))
        );
        assert_eq!(summary.debt_free_date(), summary.overall_payoff_date);
    }

    #[test]
    fn test_priority_is_descending_by_interest() {
        let planned = plan_all(&portfolio(), start());
        let ordered = prioritize(&planned);
        assert_eq!(
            ordered
                .iter()
                .map(|p| p.record.name.as_str())
                .collect::<Vec<_>>(),
            ["Card", "Car", "Visa"]
        );
        let interest: Vec<f64> = ordered
            .iter()
            .map(|p| p.schedule().unwrap().total_interest)
            .collect();
        assert!(interest.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_priority_ties_keep_insertion_order() {
        let records: RecordSet = [
            sample("First", 1000., 0., 100.),
            sample("Big", 5000., 20., 200.),
            sample("Second", 500., 0., 50.),
            sample("Third", 2000., 0., 200.),
        ]
        .into_iter()
        .collect();
        let planned = plan_all(&records, start());
        let ordered = prioritize(&planned);
        assert_eq!(
            ordered
                .iter()
                .map(|p| p.record.name.as_str())
                .collect::<Vec<_>>(),
            ["Big", "First", "Second", "Third"]
        );
    }

    #[test]
    fn test_unpayable_debts() {
        let records: RecordSet = [
            sample("Visa", 5000., 20., 200.),
            sample("Underwater", 10000., 24., 150.),
            sample("Broken", 100., 5., 0.),
        ]
        .into_iter()
        .collect();
        let planned = plan_all(&records, start());
        assert!(planned[1].outcome.as_ref().unwrap_err().is_never_pays_off());
        assert!(matches!(
            planned[2].outcome,
            Err(PayoffError::InvalidInput { .. })
        ));

        let summary = summarize(&planned);
        assert_eq!(summary.debts, 3);
        assert_eq!(summary.total_debt, 15100.);
        assert_eq!(summary.monthly_payments, 350.);
        assert_eq!(summary.unpayable, 2);
        assert_eq!(summary.overall_payoff_date, planned[0].schedule().map(|s| s.payoff_date));
        assert_eq!(summary.debt_free_date(), None);

        let ordered = prioritize(&planned);
        assert_eq!(
            ordered
                .iter()
                .map(|p| p.record.name.as_str())
                .collect::<Vec<_>>(),
            ["Underwater", "Broken", "Visa"]
        );
    }

    #[test]
    fn test_empty_portfolio() {
        let planned = plan_all(&RecordSet::new(), start());
        let summary = summarize(&planned);
        assert!(summary.is_empty());
        assert_eq!(summary.total_debt, 0.);
        assert_eq!(summary.monthly_payments, 0.);
        assert_eq!(summary.overall_payoff_date, None);
        assert_eq!(summary.debt_free_date(), None);
        assert!(prioritize(&planned).is_empty());
    }
}
