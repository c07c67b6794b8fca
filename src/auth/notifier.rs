use axum::async_trait;
use tracing::{debug, info};

/// Hands a one-time password to the user. Real mail or SMS delivery lives
/// outside this service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()>;
}

/// Writes the OTP to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()> {
        info!(%email, "One-time password issued");
        debug!(%email, %otp, "One-time password value");
        Ok(())
    }
}
