//! Provider presets and resolution of the run configuration.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::env::EnvMap;

/// Configuration keys.
pub mod keys {
    pub const PROVIDER: &str = "AI_PROVIDER";
    pub const API_KEY: &str = "AI_API_KEY";
    pub const BASE_URL: &str = "AI_BASE_URL";
    pub const MODEL: &str = "AI_MODEL";
    pub const PROXY: &str = "AI_PROXY";
    pub const MAX_DIFF_SIZE: &str = "AI_MAX_DIFF_SIZE";
    pub const TIMEOUT_MS: &str = "AI_TIMEOUT_MS";
    pub const MAX_RETRIES: &str = "AI_MAX_RETRIES";
    pub const RETRY_DELAY_MS: &str = "AI_RETRY_DELAY_MS";
    pub const RATE_LIMIT_MULTIPLIER: &str = "AI_RATE_LIMIT_MULTIPLIER";
    pub const VERBOSE: &str = "AI_VERBOSE";
    pub const SKIP_BUILD: &str = "AI_SKIP_BUILD";
    pub const BUILD_COMMAND: &str = "AI_BUILD_COMMAND";
    pub const APPEND_REASON: &str = "AI_APPEND_REASON";
    pub const REVIEW_SKIP: &str = "AI_REVIEW_SKIP";
}

pub const DEFAULT_MAX_DIFF_SIZE: usize = 20_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RATE_LIMIT_MULTIPLIER: u32 = 2;

/// Static defaults for one OpenAI-compatible provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPreset {
    pub name: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    pub credential_env_key: &'static str,
}

/// Preset used for unrecognized provider names.
pub const DEFAULT_PRESET: ProviderPreset = ProviderPreset {
    name: "openai",
    base_url: "https://api.openai.com/v1",
    default_model: "gpt-4o-mini",
    credential_env_key: "OPENAI_API_KEY",
};

pub const PRESETS: &[ProviderPreset] = &[
    DEFAULT_PRESET,
    ProviderPreset {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        default_model: "deepseek-chat",
        credential_env_key: "DEEPSEEK_API_KEY",
    },
    ProviderPreset {
        name: "moonshot",
        base_url: "https://api.moonshot.cn/v1",
        default_model: "moonshot-v1-8k",
        credential_env_key: "MOONSHOT_API_KEY",
    },
    ProviderPreset {
        name: "qwen",
        base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
        default_model: "qwen-plus",
        credential_env_key: "DASHSCOPE_API_KEY",
    },
    ProviderPreset {
        name: "zhipu",
        base_url: "https://open.bigmodel.cn/api/paas/v4",
        default_model: "glm-4-flash",
        credential_env_key: "ZHIPU_API_KEY",
    },
    ProviderPreset {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        default_model: "openai/gpt-4o-mini",
        credential_env_key: "OPENROUTER_API_KEY",
    },
    ProviderPreset {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        default_model: "qwen2.5-coder",
        credential_env_key: "OLLAMA_API_KEY",
    },
];

/// Look up a preset by name, case-insensitively.
pub fn find_preset(name: &str) -> Option<&'static ProviderPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Everything a review run needs, resolved once at startup.
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Provider name as selected (lowercased); may be unknown to the registry.
    pub provider: String,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub proxy: Option<String>,
    pub max_diff_size: usize,
    pub timeout_ms: u64,
    /// Total attempts for the remote call, at least 1.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub rate_limit_multiplier: u32,
    pub skip_build: bool,
    pub build_command: Option<String>,
    pub verbose: bool,
    pub append_reason: bool,
    /// Documented bypass: skip the review for this commit.
    pub review_skip: bool,
}

impl ResolvedConfig {
    /// Resolve the configuration from a merged key/value map.
    ///
    /// Field precedence: explicit override key, then the selected preset,
    /// then the OpenAI-compatible default preset for unknown providers.
    pub fn resolve(env: &EnvMap) -> Self {
        let provider = non_empty(env, keys::PROVIDER)
            .map(|p| p.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_PRESET.name.to_string());

        let preset = find_preset(&provider).copied().unwrap_or(DEFAULT_PRESET);

        let api_key = non_empty(env, preset.credential_env_key)
            .or_else(|| non_empty(env, keys::API_KEY))
            .map(|k| SecretString::from(k.to_string()));

        let base_url = non_empty(env, keys::BASE_URL)
            .unwrap_or(preset.base_url)
            .trim_end_matches('/')
            .to_string();

        let model = non_empty(env, keys::MODEL)
            .unwrap_or(preset.default_model)
            .to_string();

        Self {
            provider,
            api_key,
            base_url,
            model,
            proxy: non_empty(env, keys::PROXY).map(str::to_string),
            max_diff_size: parse_number(env, keys::MAX_DIFF_SIZE, DEFAULT_MAX_DIFF_SIZE),
            timeout_ms: parse_number(env, keys::TIMEOUT_MS, DEFAULT_TIMEOUT_MS),
            max_retries: parse_number(env, keys::MAX_RETRIES, DEFAULT_MAX_RETRIES).max(1),
            retry_delay_ms: parse_number(env, keys::RETRY_DELAY_MS, DEFAULT_RETRY_DELAY_MS),
            rate_limit_multiplier: parse_number(
                env,
                keys::RATE_LIMIT_MULTIPLIER,
                DEFAULT_RATE_LIMIT_MULTIPLIER,
            )
            .max(1),
            skip_build: parse_flag(env, keys::SKIP_BUILD, false),
            build_command: non_empty(env, keys::BUILD_COMMAND).map(str::to_string),
            verbose: parse_flag(env, keys::VERBOSE, false),
            append_reason: parse_flag(env, keys::APPEND_REASON, true),
            review_skip: parse_flag(env, keys::REVIEW_SKIP, false),
        }
    }

    /// Whether a non-empty credential was found.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The env key a user should set for the selected provider.
    pub fn credential_hint(&self) -> &'static str {
        find_preset(&self.provider)
            .unwrap_or(&DEFAULT_PRESET)
            .credential_env_key
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The build command to run, unless skipped or unset.
    pub fn effective_build_command(&self) -> Option<&str> {
        if self.skip_build {
            return None;
        }
        self.build_command.as_deref()
    }

    /// Human-readable summary with the credential masked.
    pub fn describe(&self) -> String {
        ConfigSummary(self).to_string()
    }
}

struct ConfigSummary<'a>(&'a ResolvedConfig);

impl fmt::Display for ConfigSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.0;
        let key = c
            .api_key
            .as_ref()
            .map(|k| mask_secret(k.expose_secret()))
            .unwrap_or_else(|| format!("(not set, expected {})", c.credential_hint()));

        writeln!(f, "provider:              {}", c.provider)?;
        writeln!(f, "api key:               {}", key)?;
        writeln!(f, "base url:              {}", c.base_url)?;
        writeln!(f, "model:                 {}", c.model)?;
        writeln!(f, "proxy:                 {}", c.proxy.as_deref().unwrap_or("(none)"))?;
        writeln!(f, "max diff size:         {} chars", c.max_diff_size)?;
        writeln!(f, "timeout:               {} ms", c.timeout_ms)?;
        writeln!(f, "max attempts:          {}", c.max_retries)?;
        writeln!(f, "retry delay:           {} ms", c.retry_delay_ms)?;
        writeln!(f, "rate limit multiplier: {}", c.rate_limit_multiplier)?;
        writeln!(
            f,
            "build command:         {}",
            match (c.skip_build, c.build_command.as_deref()) {
                (true, _) => "(skipped)",
                (false, Some(cmd)) => cmd,
                (false, None) => "(none)",
            }
        )?;
        writeln!(f, "append reason:         {}", c.append_reason)?;
        write!(f, "verbose:               {}", c.verbose)
    }
}

/// Show only the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

fn non_empty<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Parse a numeric setting, warning and falling back on bad input.
fn parse_number<T>(env: &EnvMap, key: &str, default: T) -> T
where
    T: std::str::FromStr + fmt::Display + Copy,
{
    match non_empty(env, key) {
        Some(v) => match v.parse::<T>() {
            Ok(n) => n,
            Err(_) => {
                warn!("Invalid {} value '{}', using default {}", key, v, default);
                default
            }
        },
        None => default,
    }
}

fn parse_flag(env: &EnvMap, key: &str, default: bool) -> bool {
    match non_empty(env, key) {
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!("Invalid {} value '{}', using default {}", key, v, default);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_any_settings() {
        let config = ResolvedConfig::resolve(&EnvMap::new());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.has_credential());
        assert_eq!(config.max_diff_size, DEFAULT_MAX_DIFF_SIZE);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(config.rate_limit_multiplier, 2);
        assert!(config.append_reason);
        assert!(!config.review_skip);
        assert!(config.effective_build_command().is_none());
    }

    #[test]
    fn test_deepseek_preset_supplies_base_url() {
        let config = ResolvedConfig::resolve(&env(&[("AI_PROVIDER", "deepseek")]));
        assert_eq!(config.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.model, "deepseek-chat");
    }

    #[test]
    fn test_explicit_base_url_wins_over_preset() {
        for provider in ["deepseek", "openai", "something-else"] {
            let config = ResolvedConfig::resolve(&env(&[
                ("AI_PROVIDER", provider),
                ("AI_BASE_URL", "https://proxy.internal/v1/"),
            ]));
            assert_eq!(config.base_url, "https://proxy.internal/v1");
        }
    }

    #[test]
    fn test_explicit_model_wins_over_preset() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_PROVIDER", "deepseek"),
            ("AI_MODEL", "deepseek-reasoner"),
        ]));
        assert_eq!(config.model, "deepseek-reasoner");
    }

    #[test]
    fn test_provider_name_is_case_insensitive() {
        let config = ResolvedConfig::resolve(&env(&[("AI_PROVIDER", "DeepSeek")]));
        assert_eq!(config.provider, "deepseek");
        assert_eq!(config.base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_unknown_provider_falls_back_to_default_preset() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_PROVIDER", "acme"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]));
        assert_eq!(config.provider, "acme");
        assert_eq!(config.base_url, DEFAULT_PRESET.base_url);
        assert_eq!(config.model, DEFAULT_PRESET.default_model);
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-openai");
    }

    #[test]
    fn test_provider_key_preferred_over_generic_key() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_PROVIDER", "deepseek"),
            ("DEEPSEEK_API_KEY", "sk-deepseek"),
            ("AI_API_KEY", "sk-generic"),
        ]));
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-deepseek");
    }

    #[test]
    fn test_generic_key_is_fallback() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_PROVIDER", "deepseek"),
            ("OPENAI_API_KEY", "sk-wrong-provider"),
            ("AI_API_KEY", "sk-generic"),
        ]));
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-generic");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = ResolvedConfig::resolve(&env(&[("OPENAI_API_KEY", "   ")]));
        assert!(!config.has_credential());
        assert_eq!(config.credential_hint(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_numeric_settings_parse_and_fall_back() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_MAX_DIFF_SIZE", "500"),
            ("AI_TIMEOUT_MS", "not-a-number"),
            ("AI_MAX_RETRIES", "0"),
            ("AI_RETRY_DELAY_MS", "250"),
            ("AI_RATE_LIMIT_MULTIPLIER", "3"),
        ]));
        assert_eq!(config.max_diff_size, 500);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_delay_ms, 250);
        assert_eq!(config.rate_limit_multiplier, 3);
    }

    #[test]
    fn test_flags_accept_common_spellings() {
        let config = ResolvedConfig::resolve(&env(&[
            ("AI_VERBOSE", "YES"),
            ("AI_SKIP_BUILD", "1"),
            ("AI_APPEND_REASON", "off"),
            ("AI_REVIEW_SKIP", "true"),
            ("AI_BUILD_COMMAND", "cargo check"),
        ]));
        assert!(config.verbose);
        assert!(config.skip_build);
        assert!(!config.append_reason);
        assert!(config.review_skip);
        assert!(config.effective_build_command().is_none());
    }

    #[test]
    fn test_build_command_used_when_not_skipped() {
        let config = ResolvedConfig::resolve(&env(&[("AI_BUILD_COMMAND", "cargo check")]));
        assert_eq!(config.effective_build_command(), Some("cargo check"));
    }

    #[test]
    fn test_describe_masks_api_key() {
        let config = ResolvedConfig::resolve(&env(&[("OPENAI_API_KEY", "sk-1234567890abcdef")]));
        let text = config.describe();
        assert!(text.contains("****cdef"));
        assert!(!text.contains("sk-1234567890abcdef"));
        assert!(!format!("{:?}", config).contains("sk-1234567890abcdef"));
    }

    #[test]
    fn test_every_preset_is_findable() {
        for preset in PRESETS {
            assert_eq!(find_preset(&preset.name.to_uppercase()), Some(preset));
        }
    }
}
