use order_service::config::{
    CommonConfig, MongoConfig, OrderConfig, RedisConfig, SecurityConfig, SmtpConfig,
    StorageConfig, VerificationConfig,
};
use order_service::startup::Application;

pub const ADMIN_KEY: &str = "test-admin-key";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub invoice_dir: std::path::PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a config tweak, e.g. enabling the strict verification
    /// policy.
    pub async fn spawn_with(tweak: impl FnOnce(&mut OrderConfig)) -> Self {
        let run_id = uuid::Uuid::new_v4();
        let invoice_dir = std::env::temp_dir().join(format!("order-test-invoices-{}", run_id));
        let upload_dir = std::env::temp_dir().join(format!("order-test-uploads-{}", run_id));

        // Random port, uuid-named database, mock email, code echoed back
        let mut config = OrderConfig {
            common: CommonConfig { port: 0 },
            mongodb: MongoConfig {
                uri: std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: format!("order_test_{}", run_id.simple()),
            },
            smtp: SmtpConfig {
                host: "smtp.test.local".to_string(),
                port: 587,
                user: "test".to_string(),
                password: "test".to_string(),
                from_email: "test@example.com".to_string(),
                from_name: "Test Service".to_string(),
                enabled: false, // Use mock
            },
            redis: RedisConfig { url: None },
            security: SecurityConfig {
                admin_api_key: ADMIN_KEY.to_string(),
            },
            verification: VerificationConfig {
                code_ttl_seconds: None,
                require_verified_email: false,
                expose_code: true,
            },
            storage: StorageConfig {
                upload_dir: upload_dir.to_string_lossy().into_owned(),
                invoice_dir: invoice_dir.to_string_lossy().into_owned(),
            },
        };
        tweak(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to answer health checks
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            invoice_dir,
        }
    }

    /// Seed an active USD bank account through the admin API.
    pub async fn seed_usd_account(&self, client: &reqwest::Client) {
        let response = client
            .post(format!("{}/bank-accounts", self.address))
            .header("X-Admin-Api-Key", ADMIN_KEY)
            .json(&serde_json::json!({
                "payment_type": "Beneficiary",
                "bank_name": "First Commercial Bank",
                "branch": "Main",
                "currency": "USD",
                "account_name": "Store Holdings",
                "account_number": "1000123456",
                "swift_code": "FCBKUS33"
            }))
            .send()
            .await
            .expect("Failed to seed bank account");
        assert_eq!(response.status(), 201);
    }
}
