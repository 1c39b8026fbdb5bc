pub mod background_jobs;
pub mod carryover_service;
pub mod clock;
pub mod error;
pub mod media_service;
pub mod notification_service;
pub mod pause_service;
pub mod performance_service;
pub mod rating_service;
pub mod review_service;
pub mod timeline;
pub mod tracking_service;
