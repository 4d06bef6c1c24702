// Dashboard: per-user summary statistics, recent-activity timeline and
// monthly/channel insights. Aggregation is pure over one user's rows.

pub mod aggregate;
pub mod handlers;
