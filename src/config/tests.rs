//! Configuration Tests
//!
//! Settings are built from an in-memory environment so tests never touch the process env.

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::prediction::types::Strategy;
    use std::collections::HashMap;
    use std::time::Duration;

    fn settings(args: &[&str], env: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_sources(&args, |key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[], &[]).unwrap();

        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(settings.log_level, tracing::Level::INFO);
        assert_eq!(settings.default_strategy, Strategy::Simulated);
        assert_eq!(settings.settle_window, Duration::from_millis(300));
        assert_eq!(settings.http_timeout, Duration::from_secs(10));
        assert_eq!(settings.nominatim.limit, 10);
        assert_eq!(settings.nominatim.locale, "en");
        assert!(settings.nominatim.country_codes.is_none());
        assert!(settings.gemini_api_key.is_none());
        assert!(settings.prediction_url.is_none());
        assert_eq!(settings.query_config().min_chars, 3);
        assert_eq!(settings.session_idle_timeout, Duration::from_secs(1800));
        assert!(settings.ignored_args.is_empty());
    }

    #[test]
    fn test_env_values() {
        let settings = settings(
            &[],
            &[
                ("SOLAR_BIND", "0.0.0.0:9000"),
                ("OPTIMIZER", "backend"),
                ("PREDICTION_URL", "http://localhost:5000"),
                ("NOMINATIM_COUNTRY_CODES", "in"),
                ("DEBOUNCE_MS", "250"),
                ("LOG_LEVEL", "debug"),
                ("GEMINI_API_KEY", "   "),
                ("SESSION_IDLE_SECS", "120"),
            ],
        )
        .unwrap();

        assert_eq!(settings.bind_addr.port(), 9000);
        assert_eq!(settings.default_strategy, Strategy::Backend);
        assert_eq!(settings.nominatim.country_codes.as_deref(), Some("in"));
        assert_eq!(settings.settle_window, Duration::from_millis(250));
        assert_eq!(settings.log_level, tracing::Level::DEBUG);
        assert_eq!(settings.session_idle_timeout, Duration::from_secs(120));
        // Blank values count as unset
        assert!(settings.gemini_api_key.is_none());
    }

    #[test]
    fn test_flags_override_env() {
        let settings = settings(
            &["--bind", "127.0.0.1:7000", "--optimizer", "gemini", "--country", "de"],
            &[("SOLAR_BIND", "0.0.0.0:9000"), ("NOMINATIM_COUNTRY_CODES", "in")],
        )
        .unwrap();

        assert_eq!(settings.bind_addr.port(), 7000);
        assert_eq!(settings.default_strategy, Strategy::Generative);
        assert_eq!(settings.nominatim.country_codes.as_deref(), Some("de"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(settings(&["--bind"], &[]).is_err());
        assert!(settings(&["--bind", "nonsense"], &[]).is_err());
        assert!(settings(&["--optimizer", "physics"], &[]).is_err());
        assert!(settings(&[], &[("DEBOUNCE_MS", "soon")]).is_err());
    }

    #[test]
    fn test_unknown_flags_are_collected() {
        let settings =
            settings(&["--verbose", "--bind", "127.0.0.1:7001", "extra"], &[]).unwrap();

        assert_eq!(settings.bind_addr.port(), 7001);
        assert_eq!(settings.ignored_args, vec!["--verbose", "extra"]);
    }

    #[test]
    fn test_build_services_registers_configured_optimizers() {
        let settings = settings(
            &[],
            &[
                ("GEMINI_API_KEY", "abc"),
                ("PREDICTION_URL", "http://localhost:5000"),
            ],
        )
        .unwrap();

        let services = settings.build_services(reqwest::Client::new()).unwrap();

        assert!(services.optimizers.has_strategy(Strategy::Simulated));
        assert!(services.optimizers.has_strategy(Strategy::Generative));
        assert!(services.optimizers.has_strategy(Strategy::Backend));
        assert_eq!(services.optimizers.default_strategy(), Strategy::Simulated);
    }

    #[test]
    fn test_build_services_rejects_unconfigured_default() {
        let settings = settings(&["--optimizer", "generative"], &[]).unwrap();

        assert!(settings.build_services(reqwest::Client::new()).is_err());
    }
}
