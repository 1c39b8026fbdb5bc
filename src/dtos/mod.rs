pub mod performancedtos;
pub mod ratingdtos;
pub mod trackingdtos;
