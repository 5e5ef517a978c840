use std::sync::Arc;

use common::storage::MediaStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::mail::MailClient;
use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn MailClient>,
    /// `None` when payments are disabled.
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn payments(&self) -> Result<&Arc<dyn PaymentGateway>, crate::error::AppError> {
        self.payments
            .as_ref()
            .ok_or(crate::error::AppError::PaymentsDisabled)
    }
}
