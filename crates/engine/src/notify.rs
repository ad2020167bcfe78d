//! Outbound notifications.
//!
//! The engine hands a [`Notification`] to a [`Notifier`] after the database
//! work committed. Delivery is fire-and-forget: a failing notifier is logged
//! and never rolls anything back.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub transaction_id: Option<Uuid>,
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Default sink: writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %notification.user_id,
            transaction_id = ?notification.transaction_id,
            title = %notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}

pub(crate) fn deliver(notifier: &Arc<dyn Notifier>, notification: Notification) {
    if let Err(err) = notifier.notify(&notification) {
        tracing::warn!(
            user_id = %notification.user_id,
            transaction_id = ?notification.transaction_id,
            "dropping notification: {err}"
        );
    }
}
