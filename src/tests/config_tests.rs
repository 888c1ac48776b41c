//! tests/config_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::config::app_config::AppConfig;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeouts.connection, Duration::from_secs(15));
        assert_eq!(config.timeouts.greeting, Duration::from_secs(10));
        assert_eq!(config.timeouts.socket, Duration::from_secs(30));
        assert_eq!(config.timeouts.overall(), Duration::from_secs(55));
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_base_url_follows_port_and_trims_slash() {
        assert_eq!(config_from(&[("PORT", "8080")]).base_url, "http://localhost:8080");
        assert_eq!(
            config_from(&[("BASE_URL", "https://t.brand.io/")]).base_url,
            "https://t.brand.io"
        );
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("SMTP_SOCKET_TIMEOUT_SECS", "-1"),
            ("SMTP_ACCEPT_INVALID_CERTS", "true"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.timeouts.socket, Duration::from_secs(30));
        assert!(config.accept_invalid_certs);
    }
}
