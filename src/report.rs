use crate::currency::format_as_currency;
use crate::payoff::{PayoffError, PayoffSchedule, ScheduledPayment};
use crate::planner::Plan;
use crate::portfolio::{PlannedDebt, PortfolioSummary};

const EMPTY: &str = "—";

fn overall_payoff(summary: &PortfolioSummary) -> String {
    match (summary.debt_free_date(), summary.unpayable) {
        (Some(date), _) => date.format("%Y-%m-%d").to_string(),
        (None, 0) => EMPTY.to_string(),
        (None, _) => "never".to_string(),
    }
}

pub fn render_summary(summary: &PortfolioSummary) -> String {
    let (total, monthly) = if summary.is_empty() {
        (EMPTY.to_string(), EMPTY.to_string())
    } else {
        (
            format_as_currency(summary.total_debt),
            format_as_currency(summary.monthly_payments),
        )
    };
    format!(
        "Total Debt: {}\nOverall Payoff Date: {}\nMonthly Debt Payments: {}\n",
        total,
        overall_payoff(summary),
        monthly
    )
}

fn outcome_cells(debt: &PlannedDebt) -> [String; 3] {
    match &debt.outcome {
        Ok(schedule) => [
            schedule.payoff_date.to_string(),
            schedule.payments_remaining.to_string(),
            format_as_currency(schedule.total_interest),
        ],
        Err(PayoffError::NeverPaysOff { .. }) => {
            ["never".to_string(), EMPTY.to_string(), EMPTY.to_string()]
        }
        Err(_) => ["invalid".to_string(), EMPTY.to_string(), EMPTY.to_string()],
    }
}

/// Summary metrics followed by the debts in payoff priority order. Debts
/// without a schedule get a note explaining why.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = render_summary(&plan.summary);
    out.push('\n');

    if plan.debts.is_empty() {
        out.push_str("No debts entered.\n");
        return out;
    }

    let header = [
        "Id",
        "Name",
        "Type",
        "Amount",
        "APR",
        "Minimum Payment",
        "Payoff Date",
        "Payments",
        "Total Interest",
    ];
    let ordered = plan.prioritized();
    let rows: Vec<Vec<String>> = ordered
        .iter()
        .map(|debt| {
            let record = &debt.record;
            let mut row = vec![
                record.id.short(),
                record.name.clone(),
                record.debt_type.to_string(),
                format_as_currency(record.principal),
                format!("{:.2}%", record.apr),
                format_as_currency(record.minimum_payment),
            ];
            row.extend(outcome_cells(debt));
            row
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str("Prioritized Payoff List:\n");
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let notes: Vec<String> = ordered
        .iter()
        .filter_map(|debt| {
            let err = debt.outcome.as_ref().err()?;
            Some(format!("{}: {}", debt.record.name, err))
        })
        .collect();
    if !notes.is_empty() {
        out.push('\n');
        for note in notes {
            out.push_str(&format!("! {}\n", note));
        }
    }
    out
}

// text columns left aligned, the rest right aligned
fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let pad = width.saturating_sub(cell.chars().count());
            if i < 3 {
                format!("{}{}", cell, " ".repeat(pad))
            } else {
                format!("{}{}", " ".repeat(pad), cell)
            }
        })
        .collect();
    out.push_str(cells.join(" | ").trim_end());
    out.push('\n');
}

/// The month by month run-down, then how the plan counts the same debt.
/// The run-down pays to the last cent, so its row count is the unrounded
/// payment count rounded up; the plan rounds half up and can be one less.
pub fn render_schedule(rows: &[ScheduledPayment], schedule: &PayoffSchedule) -> String {
    let mut lines: Vec<String> = rows.iter().map(|row| row.to_string()).collect();
    if let Some(last) = rows.last() {
        let interest: f64 = rows.iter().map(|row| row.interest).sum();
        lines.push(format!(
            "Run-down: {} payments, last of {} on {}, interest paid {}",
            rows.len(),
            format_as_currency(last.payment),
            last.date,
            format_as_currency(interest)
        ));
    }
    lines.push(format!(
        "Plan: {} payments, paid off {}, total interest {}",
        schedule.payments_remaining,
        schedule.payoff_date,
        format_as_currency(schedule.total_interest)
    ));
    lines.join("\n") + "\n"
}
