// Application layer - use cases and orchestration over a `Store`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::{DashboardSummary, PeriodReport, ReportPeriod};
pub use service::*;
