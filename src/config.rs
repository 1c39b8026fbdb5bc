#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    // Collaborator endpoints
    pub file_service_url: String,
    pub notify_push_url: Option<String>,
    // Scheduler tuning
    pub auto_flag_multiplier: f64,
    pub auto_flag_interval_secs: u64,
    pub performance_interval_secs: u64,
    pub carry_over_limit: i32,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");

        let file_service_url = std::env::var("FILE_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());
        let notify_push_url = std::env::var("NOTIFY_PUSH_URL").ok();

        let auto_flag_multiplier = std::env::var("AUTO_FLAG_MULTIPLIER")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(1.5);
        let auto_flag_interval_secs = std::env::var("AUTO_FLAG_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        let performance_interval_secs = std::env::var("PERFORMANCE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3600);
        let carry_over_limit = std::env::var("CARRY_OVER_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(3);

        Config {
            database_url,
            jwt_secret,
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8000),
            file_service_url,
            notify_push_url,
            auto_flag_multiplier,
            auto_flag_interval_secs,
            performance_interval_secs,
            carry_over_limit,
        }
    }
}
