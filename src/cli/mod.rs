use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// Conversation store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// Conversation store connection string (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis conversation and credential keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "aegis:")]
    pub history_redis_prefix: String,

    /// Number of trailing messages sent to the model as context.
    #[arg(long, env = "CONTEXT_WINDOW", default_value = "10")]
    pub context_window: usize,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (openrouter, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openrouter")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., https://openrouter.ai/api/v1)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// Bearer token for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model identifier for chat completion
    #[arg(long, env = "CHAT_MODEL", default_value = "openai/gpt-3.5-turbo")]
    pub chat_model: String,

    /// Value sent as HTTP-Referer to OpenRouter for app attribution
    #[arg(long, env = "CHAT_REFERER")]
    pub chat_referer: Option<String>,

    /// Value sent as X-Title to OpenRouter for app attribution
    #[arg(long, env = "CHAT_TITLE", default_value = "AegisAI")]
    pub chat_title: String,

    // --- Search Args ---
    /// Augment prompts with web search results
    #[arg(long, env = "ENABLE_SEARCH", default_value = "true")]
    pub enable_search: bool,

    /// API key for the search provider. Search is skipped when empty.
    #[arg(long, env = "SEARCH_API_KEY", default_value = "")]
    pub search_api_key: String,

    /// Search provider endpoint
    #[arg(long, env = "SEARCH_BASE_URL", default_value = "https://google.serper.dev/search")]
    pub search_base_url: String,

    /// Number of organic results injected into the prompt
    #[arg(long, env = "SEARCH_RESULT_LIMIT", default_value = "3")]
    pub search_result_limit: usize,

    // --- General App Args ---
    /// Optional path to a JSON file overriding the built-in system prompts.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:3000")]
    pub server_addr: String,

    /// Timeout in seconds for outbound HTTP calls (search and completion).
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "60")]
    pub http_timeout_secs: u64,

    /// Requests per minute accepted across all clients. 0 disables limiting.
    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value = "100")]
    pub rate_limit_per_minute: u32,

    // --- Auth Args ---
    /// Require a Bearer token on /chat
    #[arg(long, env = "REQUIRE_AUTH", default_value = "false")]
    pub require_auth: bool,

    /// Secret used to sign and verify tokens. Auth routes are disabled when unset.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens in hours.
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value = "1")]
    pub token_ttl_hours: i64,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// Signing secret, ignoring blank values.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn search_enabled(&self) -> bool {
        self.enable_search && !self.search_api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_relay_behaviour() {
        let args = Args::parse_from(["aegis-relay"]);
        assert_eq!(args.context_window, 10);
        assert_eq!(args.search_result_limit, 3);
        assert_eq!(args.chat_model, "openai/gpt-3.5-turbo");
        assert_eq!(args.history_type, "memory");
        assert!(!args.require_auth);
    }

    #[test]
    fn search_needs_a_key() {
        let args = Args::parse_from(["aegis-relay", "--search-api-key", "  "]);
        assert!(!args.search_enabled());

        let args = Args::parse_from(["aegis-relay", "--search-api-key", "k"]);
        assert!(args.search_enabled());
    }

    #[test]
    fn blank_secret_is_ignored() {
        let args = Args::parse_from(["aegis-relay", "--jwt-secret", ""]);
        assert_eq!(args.jwt_secret(), None);
    }
}
