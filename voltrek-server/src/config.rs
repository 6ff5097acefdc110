//! Process-level configuration, read once at startup from the
//! environment (spec §6.5). Grounded on the teacher's `main.rs`, which
//! reads `PORT` the same way — generalized here to the full `VOLTREK_*`
//! table instead of a single variable.

use std::net::IpAddr;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub configs_dir: std::path::PathBuf,
    pub sessions_dir: std::path::PathBuf,
    pub retention: Duration,
    pub cleanup_tick: Duration,
    pub reconcile_tick: Duration,
    pub max_bulk_moves: usize,
    pub hub_queue_cap: usize,
    pub http_read_timeout: Duration,
    pub http_write_timeout: Duration,
    pub http_idle_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("VOLTREK_BIND_ADDR", "0.0.0.0".parse().unwrap()),
            port: env_or("VOLTREK_PORT", 8080),
            configs_dir: env_or::<String>("VOLTREK_CONFIGS_DIR", "./configs".into()).into(),
            sessions_dir: env_or::<String>("VOLTREK_SESSIONS_DIR", "./sessions".into()).into(),
            retention: Duration::from_secs(env_or("VOLTREK_RETENTION_SECS", 86_400)),
            cleanup_tick: Duration::from_secs(env_or("VOLTREK_CLEANUP_TICK_SECS", 3_600)),
            reconcile_tick: Duration::from_secs(env_or("VOLTREK_RECONCILE_TICK_SECS", 5)),
            max_bulk_moves: env_or("VOLTREK_MAX_BULK_MOVES", 50),
            hub_queue_cap: env_or("VOLTREK_HUB_QUEUE_CAP", 16),
            http_read_timeout: Duration::from_secs(env_or("VOLTREK_HTTP_READ_TIMEOUT_SECS", 15)),
            http_write_timeout: Duration::from_secs(env_or("VOLTREK_HTTP_WRITE_TIMEOUT_SECS", 15)),
            http_idle_timeout: Duration::from_secs(env_or("VOLTREK_HTTP_IDLE_TIMEOUT_SECS", 60)),
        }
    }

    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind_addr, self.port)
    }
}
