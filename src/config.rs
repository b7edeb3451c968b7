use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Public base URL used for checkout return links.
    pub app_url: String,
    pub stripe: StripeConfig,
}

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub api_base: String,
    pub secret_key: Option<String>,
    pub price_id: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Config {
    /// Reads a `.env` file when present, then the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/barberdesk.db".to_string()),
            port,
            app_url: env::var("APP_URL")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            stripe: StripeConfig {
                api_base: env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
                secret_key: non_empty_var("STRIPE_SECRET_KEY"),
                price_id: non_empty_var("STRIPE_PRICE_ID"),
                webhook_secret: non_empty_var("STRIPE_WEBHOOK_SECRET"),
            },
        };

        if config.stripe.secret_key.is_none() || config.stripe.price_id.is_none() {
            log::warn!("STRIPE_SECRET_KEY or STRIPE_PRICE_ID not set. Checkout is disabled.");
        }
        if config.stripe.webhook_secret.is_none() {
            log::warn!("STRIPE_WEBHOOK_SECRET not set. Every webhook delivery will be rejected.");
        }

        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
