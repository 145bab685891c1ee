pub mod currency;
pub mod debt;
pub mod payoff;
pub mod planner;
pub mod portfolio;
pub mod report;
pub mod store;

pub use debt::{DebtError, DebtId, DebtRecord, DebtType, NewDebt, RecordSet};
pub use payoff::{compute_payoff_schedule, PayoffError, PayoffSchedule};
pub use planner::{Plan, Planner, PlannerError};
pub use portfolio::{prioritize, summarize, PlannedDebt, PortfolioSummary};
#[cfg(feature = "serde")]
pub use store::JsonFileStore;
pub use store::{DebtStore, Loaded, MemoryStore, StoreError};

// public types stay Send + Sync
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<DebtRecord>();
    is_normal::<RecordSet>();
    is_normal::<PayoffSchedule>();
    is_normal::<PlannedDebt>();
    is_normal::<PortfolioSummary>();
    is_normal::<Plan>();
}
