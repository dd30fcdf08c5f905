//! Listener configuration.

use annoflag_core::defaults::{QUEUE_CHANNEL, QUEUE_NAME, SCAN_PAGE_SIZE};
use annoflag_core::{Error, Result};

/// Configuration for the queue listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Queue holding user flag/unflag requests.
    pub queue: String,
    /// Channel this worker subscribes to.
    pub channel: String,
    /// Scan window size used by the propagator.
    pub scan_page_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            queue: QUEUE_NAME.to_string(),
            channel: QUEUE_CHANNEL.to_string(),
            scan_page_size: SCAN_PAGE_SIZE,
        }
    }
}

impl ListenerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NIPSA_QUEUE` | `nipsa_user_requests` | Queue name |
    /// | `NIPSA_CHANNEL` | `nipsa_users_annotations` | Channel name |
    /// | `NIPSA_SCAN_PAGE_SIZE` | `200` | Scan window size |
    ///
    /// A set-but-unparsable `NIPSA_SCAN_PAGE_SIZE` is a configuration error,
    /// not a silent fallback to the default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let queue = std::env::var("NIPSA_QUEUE").unwrap_or(defaults.queue);
        let channel = std::env::var("NIPSA_CHANNEL").unwrap_or(defaults.channel);
        let scan_page_size = match std::env::var("NIPSA_SCAN_PAGE_SIZE") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| {
                    Error::Config(format!("invalid NIPSA_SCAN_PAGE_SIZE: {raw:?}"))
                })?
                .max(1),
            Err(_) => defaults.scan_page_size,
        };

        Ok(Self {
            queue,
            channel,
            scan_page_size,
        })
    }

    /// Set the queue name.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Set the channel name.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Set the scan window size.
    pub fn with_scan_page_size(mut self, size: usize) -> Self {
        self.scan_page_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_names() {
        let config = ListenerConfig::default();
        assert_eq!(config.queue, "nipsa_user_requests");
        assert_eq!(config.channel, "nipsa_users_annotations");
        assert_eq!(config.scan_page_size, 200);
    }

    #[test]
    fn test_from_env_rejects_unparsable_page_size() {
        // All NIPSA_SCAN_PAGE_SIZE mutation lives in this one test so
        // parallel tests in this module never observe a half-set value.
        std::env::set_var("NIPSA_SCAN_PAGE_SIZE", "lots");
        let err = ListenerConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("NIPSA_SCAN_PAGE_SIZE"));

        std::env::set_var("NIPSA_SCAN_PAGE_SIZE", "25");
        assert_eq!(ListenerConfig::from_env().unwrap().scan_page_size, 25);

        std::env::remove_var("NIPSA_SCAN_PAGE_SIZE");
        assert_eq!(
            ListenerConfig::from_env().unwrap().scan_page_size,
            SCAN_PAGE_SIZE
        );
    }

    #[test]
    fn test_builder_setters() {
        let config = ListenerConfig::default()
            .with_queue("q")
            .with_channel("c")
            .with_scan_page_size(0);
        assert_eq!(config.queue, "q");
        assert_eq!(config.channel, "c");
        // Window size is clamped to at least one document.
        assert_eq!(config.scan_page_size, 1);
    }
}
