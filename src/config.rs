use std::time::Duration;

use crate::store::GitHubConfig;

fn string_env(name: &str, default: &str) -> String {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}
fn opt_env(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
fn bool_env(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Bounded retry with quadratic backoff (`base * attempt²`), shared by the
/// store's conflict loop and the client outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    pub fn no_delay(max_attempts: u32) -> Self {
        Self { max_attempts, base_delay: Duration::ZERO }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub comments: String,
    pub invites: String,
    pub reports: String,
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self {
            comments: "_data/dense_comments.yml".into(),
            invites: "_data/dense_invites.yml".into(),
            reports: "_data/dense_reports.yml".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    GitHub(GitHubConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub store: StoreBackend,
    pub paths: DocumentPaths,
    pub retry: RetryPolicy,
    pub notify_webhook: Option<String>,
    pub enable_hsts: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = DocumentPaths::default();
        let store = match string_env("DENSE_STORE", "github").to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::GitHub(GitHubConfig {
                token: opt_env("GITHUB_TOKEN"),
                owner: string_env("GITHUB_OWNER", "simongu20070911"),
                repo: string_env("GITHUB_REPO", "simongu20070911.github.io"),
                api_base: string_env("GITHUB_API_BASE", "https://api.github.com"),
                branch: opt_env("GITHUB_BRANCH"),
            }),
        };
        Self {
            port: parse_env("PORT", 4000),
            allowed_origins: string_env("ALLOWED_ORIGINS", "https://simongu20070911.github.io,http://localhost:4000")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            store,
            paths: DocumentPaths {
                comments: string_env("DENSE_COMMENTS_PATH", &defaults.comments),
                invites: string_env("DENSE_INVITES_PATH", &defaults.invites),
                reports: string_env("DENSE_REPORTS_PATH", &defaults.reports),
            },
            retry: RetryPolicy {
                max_attempts: parse_env("STORE_MAX_ATTEMPTS", 3u32).max(1),
                base_delay: Duration::from_millis(parse_env("STORE_RETRY_BASE_MS", 100u64)),
            },
            notify_webhook: opt_env("NOTIFY_WEBHOOK_URL"),
            enable_hsts: bool_env("ENABLE_HSTS"),
        }
    }

    /// Non-fatal problems worth a startup warning. A missing store token is
    /// reported by the store itself.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.allowed_origins.is_empty() {
            out.push("ALLOWED_ORIGINS is empty; browsers will be refused by CORS".to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_backoff() {
        let p = RetryPolicy { max_attempts: 4, base_delay: Duration::from_millis(100) };
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(3), Duration::from_millis(900));
        assert_eq!(RetryPolicy::no_delay(2).backoff(5), Duration::ZERO);
    }

    #[test]
    #[serial_test::serial]
    fn env_overrides_and_fallbacks() {
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("ALLOWED_ORIGINS", "https://a.example, https://b.example");
        std::env::set_var("DENSE_STORE", "memory");
        std::env::set_var("STORE_MAX_ATTEMPTS", "0");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert!(matches!(cfg.store, StoreBackend::Memory));
        assert_eq!(cfg.retry.max_attempts, 1);
        assert_eq!(cfg.paths, DocumentPaths::default());
        for k in ["PORT", "ALLOWED_ORIGINS", "DENSE_STORE", "STORE_MAX_ATTEMPTS"] {
            std::env::remove_var(k);
        }
    }
}
