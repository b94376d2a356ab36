//! Read-only statistics over stored sessions

pub mod service;

pub use service::StatisticsService;
