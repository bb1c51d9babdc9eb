use std::sync::Arc;

use crate::services::market_data_service::MarketDataService;
use crate::services::report_store::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub market_data: Arc<MarketDataService>,
    pub reports: ReportStore,
}

impl AppState {
    pub fn new(market_data: Arc<MarketDataService>) -> Self {
        let reports = market_data.store().clone();
        Self { market_data, reports }
    }
}
