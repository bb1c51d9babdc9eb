use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::MarketReport;

/// Single-slot holder for the latest market report.
///
/// Concurrent writers are not serialized: the last `replace` to finish wins.
/// Readers get the whole previous or whole new report, never a mix.
#[derive(Clone, Default)]
pub struct ReportStore {
    slot: Arc<RwLock<Option<Arc<MarketReport>>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Arc<MarketReport>> {
        self.slot.read().clone()
    }

    pub fn replace(&self, report: MarketReport) -> Arc<MarketReport> {
        let report = Arc::new(report);
        *self.slot.write() = Some(report.clone());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(narrative: &str) -> MarketReport {
        MarketReport {
            narrative: narrative.to_string(),
            charts: vec![],
            sources: vec![],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_starts_empty() {
        assert!(ReportStore::new().latest().is_none());
    }

    #[test]
    fn test_replace_swaps_whole_report() {
        let store = ReportStore::new();
        store.replace(report("first"));
        let held = store.latest().unwrap();

        store.replace(report("second"));

        assert_eq!(held.narrative, "first");
        assert_eq!(store.latest().unwrap().narrative, "second");
    }

    #[test]
    fn test_clones_share_the_slot() {
        let store = ReportStore::new();
        let handle = store.clone();
        handle.replace(report("shared"));
        assert_eq!(store.latest().unwrap().narrative, "shared");
    }
}
