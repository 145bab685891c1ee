use chrono::{Days, NaiveDate};
use log::{debug, trace, warn};
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of one payment period when projecting dates: a flat 30 days, not a
/// calendar month.
pub const DAYS_PER_PERIOD: u64 = 30;

/// Longest amortization table we will build (100 years of monthly payments).
pub const MAX_TABLE_ROWS: u32 = 1200;

// residue below this is floating point noise, not an outstanding balance
const BALANCE_EPSILON: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayoffError {
    #[error("invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error(
        "minimum payment ${minimum_payment:.2} does not cover monthly interest of ${monthly_interest:.2}, the balance never reaches zero"
    )]
    NeverPaysOff {
        monthly_interest: f64,
        minimum_payment: f64,
    },

    #[error("payoff date for {payments} payments is out of range")]
    DateOutOfRange { payments: f64 },
}

impl PayoffError {
    pub fn is_never_pays_off(&self) -> bool {
        matches!(self, PayoffError::NeverPaysOff { .. })
    }
}

/// Outcome of running a debt down under its fixed minimum payment.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PayoffSchedule {
    pub payments_remaining: u32,
    pub payoff_date: NaiveDate,
    pub total_interest: f64,
}

impl fmt::Display for PayoffSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} payments, paid off {}, total interest ${:.2}",
            self.payments_remaining, self.payoff_date, self.total_interest
        )
    }
}

/// One row of an amortization table.
#[derive(PartialEq, Debug)]
pub struct ScheduledPayment {
    pub number: u32,
    pub date: NaiveDate,
    pub payment: f64,
    pub interest: f64,
    pub end_balance: f64,
}

impl fmt::Display for ScheduledPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, date {}, payment ${:.2}, interest paid ${:.2}, ending balance ${:.2}",
            self.number, self.date, self.payment, self.interest, self.end_balance
        )
    }
}

/// Periodic rate for an APR given in percent, e.g. 18.0 -> 0.015.
pub fn monthly_rate(apr: f64) -> f64 {
    apr / 12. / 100.
}

fn validate(principal: f64, apr: f64, minimum_payment: f64) -> Result<(), PayoffError> {
    for (field, value) in [
        ("principal", principal),
        ("apr", apr),
        ("minimum payment", minimum_payment),
    ] {
        if !value.is_finite() {
            return Err(PayoffError::InvalidInput { field, value });
        }
    }
    if principal < 0. {
        return Err(PayoffError::InvalidInput {
            field: "principal",
            value: principal,
        });
    }
    if apr < 0. {
        return Err(PayoffError::InvalidInput {
            field: "apr",
            value: apr,
        });
    }
    if minimum_payment <= 0. {
        return Err(PayoffError::InvalidInput {
            field: "minimum payment",
            value: minimum_payment,
        });
    }
    Ok(())
}

/// Unrounded number of payments needed to bring `principal` to zero.
///
/// Fails with `NeverPaysOff` when the payment does not exceed the first
/// period's interest, where the closed form has no solution.
pub fn payment_count(principal: f64, apr: f64, minimum_payment: f64) -> Result<f64, PayoffError> {
    validate(principal, apr, minimum_payment)?;

    let rate = monthly_rate(apr);
    if rate == 0. {
        return Ok(principal / minimum_payment);
    }

    let monthly_interest = rate * principal;
    if minimum_payment <= monthly_interest {
        debug!(
            "payment {} <= monthly interest {}, never pays off",
            minimum_payment, monthly_interest
        );
        return Err(PayoffError::NeverPaysOff {
            monthly_interest,
            minimum_payment,
        });
    }

    // n = -ln(1 - rP/M) / ln(1 + r)
    Ok(-(-monthly_interest / minimum_payment).ln_1p() / rate.ln_1p())
}

/// Whole payments for a fractional count. Counts are never negative, so
/// `f64::round` (half away from zero) is round-half-up here: 2.5 -> 3.
fn whole_payments(n: f64) -> Result<u32, PayoffError> {
    let rounded = n.round();
    if !rounded.is_finite() || rounded > f64::from(u32::MAX) {
        return Err(PayoffError::DateOutOfRange { payments: rounded });
    }
    Ok(rounded as u32)
}

fn add_periods(start: NaiveDate, periods: u32) -> Result<NaiveDate, PayoffError> {
    start
        .checked_add_days(Days::new(u64::from(periods) * DAYS_PER_PERIOD))
        .ok_or(PayoffError::DateOutOfRange {
            payments: f64::from(periods),
        })
}

pub fn compute_payoff_schedule(
    principal: f64,             // outstanding balance
    apr: f64,                   // annual rate in percent (i.e., 19.99)
    minimum_payment: f64,       // fixed monthly payment
    evaluation_date: NaiveDate, // date the projection starts from
) -> Result<PayoffSchedule, PayoffError> {
    let n = payment_count(principal, apr, minimum_payment)?;
    let payments_remaining = whole_payments(n)?;
    let payoff_date = add_periods(evaluation_date, payments_remaining)?;
    let total_interest = f64::from(payments_remaining) * minimum_payment - principal;

    trace!(
        "principal {}, apr {}, payment {}: n {}, payments {}, payoff {}, interest {}",
        principal,
        apr,
        minimum_payment,
        n,
        payments_remaining,
        payoff_date,
        total_interest
    );

    Ok(PayoffSchedule {
        payments_remaining,
        payoff_date,
        total_interest,
    })
}

fn round(amt: f64, dec: i32) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powi(dec)).round() / 10_f64.powi(dec)
    }
}

/// Month by month run-down of a debt under its fixed payment. The last row
/// pays only what is still owed. Rows are rounded to cents.
pub fn amortization_table(
    principal: f64,
    apr: f64,
    minimum_payment: f64,
    evaluation_date: NaiveDate,
) -> Result<Vec<ScheduledPayment>, PayoffError> {
    let n = payment_count(principal, apr, minimum_payment)?;
    if n > f64::from(MAX_TABLE_ROWS) {
        warn!(
            "{:.0} payments needed, table stops after {}",
            n.ceil(),
            MAX_TABLE_ROWS
        );
    }

    let rate = monthly_rate(apr);
    let mut rows = Vec::new();
    let mut balance = principal;
    let mut number = 0;
    let mut date = evaluation_date;

    while balance > BALANCE_EPSILON && number < MAX_TABLE_ROWS {
        number += 1;
        date = add_periods(date, 1)?;

        let interest = balance * rate;
        let owed = balance + interest;
        let payment = if minimum_payment < owed {
            minimum_payment
        } else {
            owed
        };
        balance = owed - payment;
        if balance <= BALANCE_EPSILON {
            balance = 0.;
        }
        trace!(
            "Pmt # {}, date {}, interest {}, end bal {}",
            number,
            date,
            interest,
            balance
        );

        rows.push(ScheduledPayment {
            number,
            date,
            payment: round(payment, 2),
            interest: round(interest, 2),
            end_balance: round(balance, 2),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_rate() {
        assert_eq!(monthly_rate(0.), 0.);
        assert!((monthly_rate(18.) - 0.015).abs() < 1e-12);
        assert!((monthly_rate(20.) - 0.016_666_666).abs() < 1e-8);
    }

    #[test]
    fn test_credit_card_scenario() {
        let n = payment_count(5000., 20., 200.).unwrap();
        assert!((n - 32.6085).abs() < 1e-3);

        let schedule = compute_payoff_schedule(5000., 20., 200., date(2024, 1, 1)).unwrap();
        assert_eq!(schedule.payments_remaining, 33);
        assert_eq!(schedule.payoff_date, date(2026, 9, 17));
        assert_eq!(
            schedule.payoff_date.signed_duration_since(date(2024, 1, 1)).num_days(),
            990
        );
        assert!((schedule.total_interest - 1600.).abs() < 1e-9);
    }

    #[test]
    fn test_other_loans() {
        let start = date(2024, 1, 1);

        let car = compute_payoff_schedule(15000., 6.5, 350., start).unwrap();
        assert_eq!(car.payments_remaining, 49);
        assert!((car.total_interest - 2150.).abs() < 1e-9);

        let card = compute_payoff_schedule(10000., 18., 300., start).unwrap();
        assert_eq!(card.payments_remaining, 47);
        assert!((card.total_interest - 4100.).abs() < 1e-9);

        let store_card = compute_payoff_schedule(1200., 29.99, 60., start).unwrap();
        assert_eq!(store_card.payments_remaining, 28);
        assert!((store_card.total_interest - 480.).abs() < 1e-9);
    }

    #[test]
    fn test_never_pays_off() {
        let err = compute_payoff_schedule(10000., 24., 150., date(2024, 1, 1)).unwrap_err();
        assert!(err.is_never_pays_off());
        match err {
            PayoffError::NeverPaysOff {
                monthly_interest,
                minimum_payment,
            } => {
                assert!((monthly_interest - 200.).abs() < 1e-9);
                assert_eq!(minimum_payment, 150.);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_payment_equal_to_interest_never_pays_off() {
        // 12% on 1000 is exactly 10 a month
        let err = payment_count(1000., 12., 10.).unwrap_err();
        assert!(err.is_never_pays_off());
    }

    #[test]
    fn test_invalid_input() {
        let start = date(2024, 1, 1);
        assert_eq!(
            compute_payoff_schedule(1000., 10., 0., start),
            Err(PayoffError::InvalidInput {
                field: "minimum payment",
                value: 0.
            })
        );
        assert_eq!(
            compute_payoff_schedule(1000., 10., -5., start),
            Err(PayoffError::InvalidInput {
                field: "minimum payment",
                value: -5.
            })
        );
        assert_eq!(
            compute_payoff_schedule(-1., 10., 50., start),
            Err(PayoffError::InvalidInput {
                field: "principal",
                value: -1.
            })
        );
        assert_eq!(
            compute_payoff_schedule(1000., -0.5, 50., start),
            Err(PayoffError::InvalidInput {
                field: "apr",
                value: -0.5
            })
        );
        assert!(matches!(
            compute_payoff_schedule(f64::NAN, 10., 50., start),
            Err(PayoffError::InvalidInput {
                field: "principal",
                ..
            })
        ));
        assert!(matches!(
            compute_payoff_schedule(1000., f64::INFINITY, 50., start),
            Err(PayoffError::InvalidInput { field: "apr", .. })
        ));
    }

    #[test]
    fn test_zero_apr() {
        let start = date(2024, 1, 1);
        let schedule = compute_payoff_schedule(2500., 0., 100., start).unwrap();
        assert_eq!(schedule.payments_remaining, 25);
        assert_eq!(schedule.total_interest, 0.);
        assert_eq!(schedule.payoff_date, date(2026, 1, 20));
    }

    #[test]
    fn test_rounds_half_up() {
        let start = date(2024, 1, 1);

        // 2.5 payments
        let schedule = compute_payoff_schedule(250., 0., 100., start).unwrap();
        assert_eq!(schedule.payments_remaining, 3);
        assert_eq!(schedule.total_interest, 50.);

        // 2.25 and 2.75
        assert_eq!(
            compute_payoff_schedule(225., 0., 100., start)
                .unwrap()
                .payments_remaining,
            2
        );
        assert_eq!(
            compute_payoff_schedule(275., 0., 100., start)
                .unwrap()
                .payments_remaining,
            3
        );
    }

    #[test]
    fn test_rounding_down_gives_small_negative_interest() {
        // 2.25 payments round to 2, so 25 of principal is unaccounted for
        let schedule = compute_payoff_schedule(225., 0., 100., date(2024, 1, 1)).unwrap();
        assert_eq!(schedule.total_interest, -25.);
        assert!(schedule.total_interest > -100. / 2.);
    }

    #[test]
    fn test_zero_principal() {
        let start = date(2024, 3, 15);
        let schedule = compute_payoff_schedule(0., 22., 25., start).unwrap();
        assert_eq!(schedule.payments_remaining, 0);
        assert_eq!(schedule.payoff_date, start);
        assert_eq!(schedule.total_interest, 0.);
    }

    #[test]
    fn test_deterministic() {
        let start = date(2025, 6, 30);
        let first = compute_payoff_schedule(8421.17, 17.49, 233.5, start);
        let second = compute_payoff_schedule(8421.17, 17.49, 233.5, start);
        assert_eq!(first, second);
    }

    #[test]
    fn test_finite_and_non_negative_for_payable_inputs() {
        let start = date(2024, 1, 1);
        for principal in [0., 1., 99.99, 1000., 25000., 300000.] {
            for apr in [0., 0.01, 3.5, 12., 24.99, 36.] {
                let interest = monthly_rate(apr) * principal;
                for payment in [interest + 1., interest * 1.5 + 1., interest + 500.] {
                    let schedule = compute_payoff_schedule(principal, apr, payment, start).unwrap();
                    assert!(schedule.total_interest.is_finite());
                    assert!(schedule.total_interest >= -payment / 2. - 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_date_out_of_range() {
        let err = compute_payoff_schedule(1e12, 0., 0.01, date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, PayoffError::DateOutOfRange { .. }));
    }

    #[test]
    fn test_amortization_table() {
        let rows = amortization_table(5000., 20., 200., date(2024, 1, 1)).unwrap();
        assert_eq!(rows.len(), 33);
        assert_eq!(
            rows[0].to_string(),
            "pmt number 1, date 2024-01-31, payment $200.00, interest paid $83.33, ending balance $4883.33"
        );
        let last = rows.last().unwrap();
        assert_eq!(last.number, 33);
        assert_eq!(last.date, date(2026, 9, 17));
        assert_eq!(last.end_balance, 0.);
        assert!(last.payment < 200.);
        assert!(rows[..32].iter().all(|row| row.payment == 200.));
    }

    #[test]
    fn test_amortization_table_zero_apr() {
        let rows = amortization_table(250., 0., 100., date(2024, 1, 1)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].payment, 50.);
        assert!(rows.iter().all(|row| row.interest == 0.));
    }

    #[test]
    fn test_amortization_table_edges() {
        let start = date(2024, 1, 1);
        assert!(amortization_table(0., 10., 50., start).unwrap().is_empty());
        assert!(amortization_table(10000., 24., 150., start)
            .unwrap_err()
            .is_never_pays_off());

        let capped = amortization_table(1_000_000., 0., 1., start).unwrap();
        assert_eq!(capped.len(), MAX_TABLE_ROWS as usize);
    }
}
