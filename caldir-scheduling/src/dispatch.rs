//! Message fan-out and SCHEDULE-STATUS write-back.
//!
//! Sends run concurrently up to `max_concurrent_sends`. A send that fails or
//! times out is recorded with the configured failure status for each of its
//! recipients; it never aborts the other sends. Responses are written into
//! the calendar object one at a time, in the order they arrive.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar_object::{CalendarObject, UserProperty};
use crate::config::SchedulingConfig;
use crate::error::SchedulingError;
use crate::itip::ITipMessage;
use crate::transport::{RecipientStatus, SchedulingResponse, SchedulingTransport};

/// One message to send, and which property its statuses land on.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub originator: String,
    pub recipients: Vec<String>,
    pub message: ITipMessage,
    /// ATTENDEE for organizer-initiated sends, ORGANIZER for replies
    pub target: UserProperty,
}

/// A recipient status as written back into the calendar object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub property: UserProperty,
    pub recipient: String,
    pub status: String,
}

pub struct Dispatcher<'a> {
    transport: &'a dyn SchedulingTransport,
    config: &'a SchedulingConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(transport: &'a dyn SchedulingTransport, config: &'a SchedulingConfig) -> Self {
        Dispatcher { transport, config }
    }

    /// Send one delivery, mapping failures to the failure status.
    pub async fn send(&self, delivery: &Delivery) -> SchedulingResponse {
        let sent = tokio::time::timeout(
            self.config.send_timeout(),
            self.transport
                .send(&delivery.originator, &delivery.recipients, &delivery.message),
        )
        .await;

        let result = sent.unwrap_or(Err(SchedulingError::TransportTimeout(
            self.config.send_timeout_secs,
        )));

        match result {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    originator = %delivery.originator,
                    recipients = ?delivery.recipients,
                    error = %e,
                    "Scheduling send failed"
                );
                SchedulingResponse::uniform(&delivery.recipients, &self.config.failure_status)
            }
        }
    }

    /// Send all deliveries and return their responses in arrival order.
    pub async fn send_all(&self, deliveries: &[Delivery]) -> Vec<(UserProperty, SchedulingResponse)> {
        let limit = self.config.max_concurrent_sends.max(1);
        stream::iter(deliveries)
            .map(|delivery| async move { (delivery.target, self.send(delivery).await) })
            .buffer_unordered(limit)
            .collect()
            .await
    }

    /// Send all deliveries, then record every response on `calendar`.
    pub async fn dispatch(
        &self,
        calendar: &mut CalendarObject,
        deliveries: &[Delivery],
    ) -> Vec<StatusUpdate> {
        let responses = self.send_all(deliveries).await;

        let mut updates = Vec::new();
        for (target, response) in &responses {
            updates.extend(apply_response(calendar, *target, response));
        }
        updates
    }
}

/// Write each recipient's status onto the matching ORGANIZER/ATTENDEE property.
///
/// A recipient appearing twice keeps the last status.
pub fn apply_response(
    calendar: &mut CalendarObject,
    target: UserProperty,
    response: &SchedulingResponse,
) -> Vec<StatusUpdate> {
    response
        .responses
        .iter()
        .map(|RecipientStatus { recipient, status }| {
            let updated = calendar.set_schedule_status(target, recipient, status);
            if updated == 0 {
                debug!(recipient = %recipient, property = %target, "No property to record schedule status on");
            }
            StatusUpdate {
                property: target,
                recipient: recipient.clone(),
                status: status.clone(),
            }
        })
        .collect()
}
