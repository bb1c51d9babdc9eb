pub mod chart_config;
pub mod market_data_service;
pub mod refresh_scheduler;
pub mod report_store;
pub mod source_normalizer;
