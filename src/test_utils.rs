use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::http::HeaderValue;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::auth::notifier::Notifier;
use crate::auth::password::hash_password;
use crate::auth::session::create_session_token;
use crate::config::AppConfig;
use crate::router::create_router;
use crate::schemas::AppState;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Keeps every OTP it is asked to deliver so tests can read it back.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, otp)| otp.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((email.to_string(), otp.to_string()));
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiry_hours: 1,
        otp_ttl_minutes: 10,
        frontend_url: "http://localhost:5173".to_string(),
    }
}

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

/// Installs a subscriber writing to STDERR. The level comes from RUST_LOG
/// and defaults to WARN. Only the first call in a test binary takes effect.
fn init_test_tracing() {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.to_uppercase().parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A running test server plus direct handles on its state.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    /// Inserts a user straight into the database.
    pub async fn create_user(&self, email: &str, role: UserRole, group_id: Option<i32>) -> user::Model {
        user::ActiveModel {
            name: Set(email.split('@').next().unwrap_or("user").to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(TEST_PASSWORD).unwrap()),
            role: Set(role),
            group_id: Set(group_id),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        create_session_token(user, &self.state.config).unwrap()
    }

    /// A fresh super admin and its bearer token.
    pub async fn admin(&self) -> (user::Model, String) {
        let admin = self.create_user("admin@example.com", UserRole::SuperAdmin, None).await;
        let token = self.token_for(&admin);
        (admin, token)
    }

    /// A fresh regular user and its bearer token.
    pub async fn member(&self, email: &str, group_id: Option<i32>) -> (user::Model, String) {
        let member = self.create_user(email, UserRole::User, group_id).await;
        let token = self.token_for(&member);
        (member, token)
    }
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Create the full application over a migrated in-memory database
pub async fn setup_test_app() -> TestApp {
    init_test_tracing();

    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        db: setup_test_db().await,
        config: Arc::new(test_config()),
        notifier: notifier.clone(),
    };
    let server = TestServer::new(create_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        notifier,
    }
}
