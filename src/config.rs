//! Configuration helpers for resolving base URL, model, and API key.
//!
//! The core orchestrator never reads environment variables itself (per the
//! external-interfaces contract); these helpers exist for application
//! binaries and the `demos/` examples that want explicit-value-with-fallback
//! resolution instead of hardcoding endpoints.

use std::env;
use std::str::FromStr;

/// Well-known local inference server defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    LMStudio,
    Ollama,
    LlamaCpp,
    VLLM,
}

impl Provider {
    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::LMStudio => "http://localhost:1234/v1",
            Provider::Ollama => "http://localhost:11434/v1",
            Provider::LlamaCpp => "http://localhost:8080/v1",
            Provider::VLLM => "http://localhost:8000/v1",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lmstudio" | "lm-studio" | "lm_studio" => Ok(Provider::LMStudio),
            "ollama" => Ok(Provider::Ollama),
            "llamacpp" | "llama-cpp" | "llama_cpp" | "llama.cpp" => Ok(Provider::LlamaCpp),
            "vllm" => Ok(Provider::VLLM),
            _ => Err(format!("unknown provider: {s}")),
        }
    }
}

/// Resolves a base URL: `REACT_ORCHESTRATOR_BASE_URL` env var, then
/// `provider`'s default, then `fallback`, then LM Studio's default.
pub fn get_base_url(provider: Option<Provider>, fallback: Option<&str>) -> String {
    if let Ok(url) = env::var("REACT_ORCHESTRATOR_BASE_URL") {
        return url;
    }
    if let Some(p) = provider {
        return p.default_url().to_string();
    }
    fallback.unwrap_or(Provider::LMStudio.default_url()).to_string()
}

/// Resolves a model name. When `prefer_env` is true, `REACT_ORCHESTRATOR_MODEL`
/// takes precedence over `fallback`; otherwise only `fallback` is consulted.
pub fn get_model(fallback: Option<&str>, prefer_env: bool) -> Option<String> {
    if prefer_env {
        if let Ok(model) = env::var("REACT_ORCHESTRATOR_MODEL") {
            return Some(model);
        }
    }
    fallback.map(|s| s.to_string())
}

/// Resolves an API key from `REACT_ORCHESTRATOR_API_KEY`, falling back to
/// `"not-needed"` — most local inference servers don't require one.
pub fn get_api_key(fallback: Option<&str>) -> String {
    env::var("REACT_ORCHESTRATOR_API_KEY")
        .ok()
        .or_else(|| fallback.map(String::from))
        .unwrap_or_else(|| "not-needed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn provider_default_urls() {
        assert_eq!(Provider::LMStudio.default_url(), "http://localhost:1234/v1");
        assert_eq!(Provider::Ollama.default_url(), "http://localhost:11434/v1");
        assert_eq!(Provider::LlamaCpp.default_url(), "http://localhost:8080/v1");
        assert_eq!(Provider::VLLM.default_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn provider_from_str_accepts_variants() {
        assert_eq!("lmstudio".parse::<Provider>(), Ok(Provider::LMStudio));
        assert_eq!("LM-Studio".parse::<Provider>(), Ok(Provider::LMStudio));
        assert_eq!("llama.cpp".parse::<Provider>(), Ok(Provider::LlamaCpp));
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn base_url_prefers_env_then_provider_then_fallback() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::remove_var("REACT_ORCHESTRATOR_BASE_URL");
        }
        assert_eq!(get_base_url(Some(Provider::Ollama), None), "http://localhost:11434/v1");
        assert_eq!(
            get_base_url(None, Some("http://custom:9/v1")),
            "http://custom:9/v1"
        );

        unsafe {
            env::set_var("REACT_ORCHESTRATOR_BASE_URL", "http://env:1/v1");
        }
        assert_eq!(get_base_url(Some(Provider::Ollama), None), "http://env:1/v1");
        unsafe {
            env::remove_var("REACT_ORCHESTRATOR_BASE_URL");
        }
    }

    #[test]
    fn api_key_defaults_to_not_needed() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::remove_var("REACT_ORCHESTRATOR_API_KEY");
        }
        assert_eq!(get_api_key(None), "not-needed");
        assert_eq!(get_api_key(Some("sk-explicit")), "sk-explicit");
    }
}
