pub mod performancemodel;
pub mod ratingmodel;
pub mod trackingmodel;
pub mod usermodel;
