//! read-only reporting over invoice snapshots

pub mod aging;
pub mod revenue;

pub use aging::{AgingLine, AgingReportGenerator};
pub use revenue::{RevenueAnalytics, ServiceRevenue};
