pub mod media;
pub mod performance;
pub mod rating;
pub mod review;
pub mod tracking;
