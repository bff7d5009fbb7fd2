//! Delivery of scheduling messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SchedulingResult;
use crate::itip::ITipMessage;

/// Request status codes (RFC 5545 REQUEST-STATUS / RFC 6638 SCHEDULE-STATUS)
pub mod status {
    /// Delivered, not yet processed
    pub const DELIVERED: &str = "1.2";
    /// Delivered and processed
    pub const SUCCESS: &str = "2.0";
    /// Unknown calendar user
    pub const INVALID_USER: &str = "3.7";
    /// Could not be delivered
    pub const DELIVERY_FAILED: &str = "5.1";
}

/// Delivery status for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientStatus {
    pub recipient: String,
    pub status: String,
}

impl RecipientStatus {
    pub fn new(recipient: &str, status: &str) -> Self {
        RecipientStatus {
            recipient: recipient.to_string(),
            status: status.to_string(),
        }
    }
}

/// Structured response to one scheduling send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingResponse {
    pub responses: Vec<RecipientStatus>,
}

impl SchedulingResponse {
    /// The same status for every recipient.
    pub fn uniform(recipients: &[String], status: &str) -> Self {
        SchedulingResponse {
            responses: recipients
                .iter()
                .map(|r| RecipientStatus::new(r, status))
                .collect(),
        }
    }
}

/// Sends a message from one calendar user to a set of recipients.
///
/// This allows mocking in tests without a real delivery path.
#[async_trait]
pub trait SchedulingTransport: Send + Sync {
    async fn send(
        &self,
        originator: &str,
        recipients: &[String],
        message: &ITipMessage,
    ) -> SchedulingResult<SchedulingResponse>;
}
