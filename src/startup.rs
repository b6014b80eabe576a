//! Application startup and lifecycle management.

use crate::config::OrderConfig;
use crate::error::AppError;
use crate::handlers::{
    bank_accounts::{
        create_bank_account, list_active_bank_accounts, list_bank_accounts, update_bank_account,
    },
    checkout::confirm_order,
    health::{health_check, readiness_check},
    orders::{get_order, list_orders, toggle_order_status},
    products::{create_product, delete_product, list_products, update_product},
    verification::{send_code, verify_code},
};
use crate::middleware::admin_auth_middleware;
use crate::services::{
    CodeStore, EmailProvider, InMemoryCodeStore, InvoiceRenderer, LocalStorage, MockEmailProvider,
    OrderDb, RedisCodeStore, SmtpProvider, Storage, VerificationRegistry,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: OrderConfig,
    pub db: OrderDb,
    pub registry: VerificationRegistry,
    pub email_provider: Arc<dyn EmailProvider>,
    pub renderer: InvoiceRenderer,
    pub storage: Arc<dyn Storage>,
}

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/orders/:id/status", put(toggle_order_status))
        .route(
            "/bank-accounts",
            get(list_bank_accounts).post(create_bank_account),
        )
        .route("/bank-accounts/:id", put(update_bank_account))
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/checkout/send-code", post(send_code))
        .route("/checkout/verify-code", post(verify_code))
        .route("/checkout/confirm", post(confirm_order))
        .route("/orders", get(list_orders))
        .route("/orders/id/:id", get(get_order))
        .route("/bank-accounts/active", get(list_active_bank_accounts))
        .route("/products", get(list_products))
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: OrderConfig) -> Result<Self, AppError> {
        let db = OrderDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let code_store: Arc<dyn CodeStore> = match &config.redis.url {
            Some(url) => {
                let store = RedisCodeStore::connect(url).await?;
                tracing::info!("Redis code store initialized");
                Arc::new(store)
            }
            None => {
                tracing::info!("REDIS_URL not set, using in-process code store");
                Arc::new(InMemoryCodeStore::new())
            }
        };

        let ttl = config
            .verification
            .code_ttl_seconds
            .map(Duration::from_secs);
        let registry = VerificationRegistry::new(code_store, ttl);

        let email_provider: Arc<dyn EmailProvider> = if config.smtp.enabled {
            match SmtpProvider::new(config.smtp.clone()) {
                Ok(provider) => {
                    tracing::info!("SMTP email provider initialized");
                    Arc::new(provider)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                    Arc::new(MockEmailProvider::new(true))
                }
            }
        } else {
            tracing::info!("SMTP provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new(true))
        };

        let renderer = InvoiceRenderer::new(&config.storage.invoice_dir);
        let storage: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(&config.storage.upload_dir).await?);

        let state = AppState {
            config: config.clone(),
            db,
            registry,
            email_provider,
            renderer,
            storage,
        };

        // Port 0 means a random port, used by tests
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("order-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &OrderDb {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}
