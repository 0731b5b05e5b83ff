use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::de::DeserializeOwned;

/// Load settings from an optional `<file_stem>.{yaml,toml,json}` file and
/// `APP_`-prefixed environment variables.
///
/// `env_overrides` maps settings keys to plain environment variable names that
/// take precedence over everything else (e.g. `("shared_fetch_secret",
/// "SHARED_FETCH_SECRET")`). Unset variables are skipped.
pub fn load<T: DeserializeOwned>(
    file_stem: &str,
    env_overrides: &[(&str, &str)],
) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let mut builder = Cfg::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    for (key, var) in env_overrides {
        builder = builder.set_override_option(*key, std::env::var(var).ok())?;
    }

    Ok(builder.build()?.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_port")]
        port: u16,
        token: Option<String>,
    }

    fn default_port() -> u16 {
        8080
    }

    #[test]
    fn test_defaults_apply_without_sources() {
        let sample: Sample = load("does-not-exist", &[]).expect("load should succeed");
        assert_eq!(sample.port, 8080);
    }

    #[test]
    fn test_env_override_is_read() {
        // SAFETY: no other test reads or writes this variable
        unsafe { std::env::set_var("SERVICE_CORE_TEST_TOKEN", "override-value") };
        let sample: Sample = load("does-not-exist", &[("token", "SERVICE_CORE_TEST_TOKEN")])
            .expect("load should succeed");
        assert_eq!(sample.token.as_deref(), Some("override-value"));
        unsafe { std::env::remove_var("SERVICE_CORE_TEST_TOKEN") };
    }
}
