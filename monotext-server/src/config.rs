use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

/// Page sizes for every paginated listing
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub comments_per_page: u32,
    pub posts_per_page: u32,
    pub profile_posts_per_page: u32,
    pub search_posts_per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub lifetime_days: i64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub pagination: Pagination,
    pub session: Session,
    pub rate_limit: RateLimit,
    pub seed_demo_data: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults(Config::builder())?;

        // settings.toml is optional; look in the working directory and the crate directory
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        let dev_path = PathBuf::from("monotext-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        // Environment variables have the highest priority
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(days) = std::env::var("SESSION_LIFETIME_DAYS") {
            builder = builder.set_override("session.lifetime_days", days)?;
        }
        if let Ok(seed) = std::env::var("SEED_DEMO_DATA") {
            builder = builder.set_override("seed_demo_data", seed)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Settings built from defaults only, with an in-memory database
    pub fn for_tests() -> Result<Self, ConfigError> {
        Self::defaults(Config::builder())?
            .set_override("database.path", ":memory:")?
            .build()?
            .try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "monotext.db")?
            .set_default("pagination.comments_per_page", 2)?
            .set_default("pagination.posts_per_page", 10)?
            .set_default("pagination.profile_posts_per_page", 10)?
            .set_default("pagination.search_posts_per_page", 10)?
            .set_default("session.lifetime_days", 30)?
            .set_default("session.cleanup_interval_secs", 3600)?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("seed_demo_data", false)
    }
}
