/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Job worker polling interval in seconds (default: `1`).
    pub worker_poll_interval_secs: u64,
    /// Per-job handler timeout in seconds (default: `300`).
    pub job_timeout_secs: u64,
    /// Escalation sweeper interval in seconds (default: `60`).
    pub escalation_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `HOST`                           | `0.0.0.0`                  |
    /// | `PORT`                           | `3000`                     |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                       |
    /// | `WORKER_POLL_INTERVAL_SECS`      | `1`                        |
    /// | `JOB_TIMEOUT_SECS`               | `300`                      |
    /// | `ESCALATION_SWEEP_INTERVAL_SECS` | `60`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_u64("SHUTDOWN_TIMEOUT_SECS", 30),
            worker_poll_interval_secs: env_u64("WORKER_POLL_INTERVAL_SECS", 1),
            job_timeout_secs: env_u64("JOB_TIMEOUT_SECS", 300),
            escalation_sweep_interval_secs: env_u64("ESCALATION_SWEEP_INTERVAL_SECS", 60),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"))
}
