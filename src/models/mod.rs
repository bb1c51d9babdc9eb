mod chart;
mod report;

pub use chart::{ChartAnimation, ChartConfig, ChartData, ChartDataset, ChartDescription, ChartKind, ChartOptions, ChartSet};
pub use report::{MarketReport, RefreshRequest, SourceRecord};
