pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod relay;
pub mod search;
pub mod server;

use auth::{ jwt::TokenSigner, AuthService };
use cli::Args;
use config::prompt::initialize_prompts;
use history::initialize_store;
use llm::{ LlmConfig, LlmType };
use llm::chat::new_client as new_chat_client;
use log::{ info, warn };
use relay::ChatRelay;
use search::initialize_search_client;
use server::{ api::AppState, Server };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

fn log_configuration(args: &Args) {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("History Store Type: {}", args.history_type);
    if !args.history_type.eq_ignore_ascii_case("memory") {
        info!("History Store Host: {}", args.history_host);
    }
    info!("Context Window: {}", args.context_window);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Search Enabled: {}", args.search_enabled());
    if args.search_enabled() {
        info!("Search Endpoint: {}", args.search_base_url);
        info!("Search Result Limit: {}", args.search_result_limit);
    }
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Auth Routes: {}", args.jwt_secret().is_some());
    info!("Require Auth: {}", args.require_auth);
    info!("Rate Limit (req/min): {}", args.rate_limit_per_minute);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");
}

pub fn build_state(args: &Args) -> Result<AppState, Box<dyn Error + Send + Sync>> {
    if args.require_auth && args.jwt_secret().is_none() {
        return Err("REQUIRE_AUTH is set but JWT_SECRET is empty".into());
    }

    let store = initialize_store(args)?;
    let prompts = initialize_prompts(args.prompts_path.as_deref())?;

    let chat_config = LlmConfig {
        llm_type: args.chat_llm_type.parse::<LlmType>()?,
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        referer: args.chat_referer.clone(),
        title: Some(args.chat_title.clone()).filter(|t| !t.is_empty()),
        timeout: Duration::from_secs(args.http_timeout_secs),
    };
    let chat_client = new_chat_client(&chat_config)?;
    info!(
        "Chat client configured: Type={}, Model={}, BaseURL={}",
        chat_config.llm_type,
        chat_client.get_model(),
        chat_client.get_base_url()
    );

    let search_client = initialize_search_client(args)?;

    let relay = ChatRelay::from_args(
        args,
        Arc::clone(&store),
        chat_client,
        search_client,
        prompts
    );

    let auth = match args.jwt_secret() {
        Some(secret) => {
            let ttl = chrono::Duration::try_hours(args.token_ttl_hours)
                .ok_or("TOKEN_TTL_HOURS out of range")?;
            Some(AuthService::new(Arc::clone(&store), TokenSigner::new(secret, ttl)))
        }
        None => {
            warn!("JWT_SECRET not set. Register/login routes are disabled.");
            None
        }
    };

    Ok(AppState {
        relay: Arc::new(relay),
        auth,
        require_auth: args.require_auth,
    })
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    log_configuration(&args);

    let state = build_state(&args)?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state, args);
    server.run().await?;

    Ok(())
}
