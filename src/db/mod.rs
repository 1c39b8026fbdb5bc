pub mod db;
pub mod pausedb;
pub mod performancedb;
pub mod ratingdb;
pub mod reviewdb;
pub mod trackingdb;
pub mod userdb;
