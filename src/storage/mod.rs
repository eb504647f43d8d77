pub mod reports;

pub use reports::{ReportStore, ReportSummary};
