//! Client-side runtime configuration, read once at startup.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub exponential_backoff: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(30_000),
            exponential_backoff: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub reconnect: ReconnectConfig,
    /// How far in the past to render remote entities (spec §4.10).
    pub interpolation_delay: Duration,
    /// Client-side tick that lerps remote positions for display.
    pub interpolation_tick: Duration,
    /// Fallback reconciliation timer, independent of STATE_UPDATE arrival.
    pub periodic_reconciliation_interval: Duration,
    pub display_easing: bool,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let server_url =
            env::var("WEBSOCKET_URL").unwrap_or_else(|_| "ws://localhost:3000".to_string());

        let reconnect_enabled = env::var("WEBSOCKET_RECONNECTION_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);
        let max_attempts = env::var("WEBSOCKET_RECONNECTION_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let retry_delay_ms = env::var("WEBSOCKET_RECONNECTION_RETRY_DELAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let max_retry_delay_ms = env::var("WEBSOCKET_RECONNECTION_MAX_RETRY_DELAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);
        let exponential_backoff = env::var("WEBSOCKET_RECONNECTION_EXPONENTIAL_BACKOFF")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let interpolation_delay_ms = env::var("GRID_CLIENT_INTERPOLATION_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(150);
        let interpolation_tick_ms = env::var("GRID_CLIENT_INTERPOLATION_TICK_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);
        let periodic_reconciliation_ms = env::var("GRID_CLIENT_RECONCILIATION_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);
        let display_easing = env::var("GRID_CLIENT_DISPLAY_EASING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Self {
            server_url,
            reconnect: ReconnectConfig {
                enabled: reconnect_enabled,
                max_attempts,
                retry_delay: Duration::from_millis(retry_delay_ms),
                max_retry_delay: Duration::from_millis(max_retry_delay_ms),
                exponential_backoff,
            },
            interpolation_delay: Duration::from_millis(interpolation_delay_ms),
            interpolation_tick: Duration::from_millis(interpolation_tick_ms),
            periodic_reconciliation_interval: Duration::from_millis(periodic_reconciliation_ms),
            display_easing,
        }
    }
}

/// `min(retryDelay * 2^(n-1), maxRetryDelay)` when exponential backoff is
/// enabled (spec §5, "Reconnect"), else a constant delay. `attempt` is
/// 1-based.
pub fn backoff_delay(config: &ReconnectConfig, attempt: u32) -> Duration {
    if !config.exponential_backoff {
        return config.retry_delay;
    }
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let scaled = (config.retry_delay.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(scaled.min(config.max_retry_delay.as_millis() as u64))
}
