use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{config::Config, payments::PaymentProvider};

/// Shared handles, built once in `main` and handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub payments: Arc<dyn PaymentProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: SqlitePool, payments: Arc<dyn PaymentProvider>, config: Config) -> Self {
        Self {
            db,
            payments,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        config::StripeConfig,
        error::{AppError, AppResult},
        payments::{CheckoutRequest, CheckoutSession},
    };

    pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

    /// Records checkout requests instead of calling Stripe.
    #[derive(Default)]
    pub struct FakePayments {
        pub requests: Mutex<Vec<CheckoutRequest>>,
        pub fail: bool,
    }

    #[async_trait]
    impl PaymentProvider for FakePayments {
        async fn create_checkout_session(
            &self,
            request: &CheckoutRequest,
        ) -> AppResult<CheckoutSession> {
            if self.fail {
                return Err(AppError::PaymentProvider("provider unavailable".into()));
            }
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok(CheckoutSession {
                id: format!("cs_test_{}", requests.len()),
                url: Some("https://checkout.test/pay".to_string()),
            })
        }
    }

    pub fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            app_url: "https://shop.test".to_string(),
            stripe: StripeConfig {
                api_base: "http://127.0.0.1:9".to_string(),
                secret_key: Some("sk_test".to_string()),
                price_id: Some("price_cloud".to_string()),
                webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            },
        }
    }

    pub fn test_state(db: SqlitePool, payments: Arc<FakePayments>) -> AppState {
        AppState::new(db, payments, test_config())
    }
}
