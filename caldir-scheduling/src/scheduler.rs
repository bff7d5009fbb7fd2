//! Implicit scheduling of one calendar object write.
//!
//! [`ImplicitScheduler::schedule`] runs a single operation:
//!
//! ```text
//! flatten -> classify -> organizer flow | attendee flow | nothing
//!         -> dispatch (cancels first, then requests) -> status write-back
//! ```
//!
//! The organizer flow sends CANCELs to attendees who lost instances and a
//! REQUEST to every remaining attendee, unless the change is insignificant.
//! The attendee flow validates the change against the organizer's copy and
//! sends a REPLY when the attendee's participation changed.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::calendar_object::{CalendarObject, UserProperty};
use crate::cancel::{aggregate_by_attendee, cancellations_between, deleting_cancellations};
use crate::config::SchedulingConfig;
use crate::diff::{attendee_merge, organizer_diff};
use crate::dispatch::{Delivery, Dispatcher, StatusUpdate};
use crate::error::{SchedulingError, SchedulingResult};
use crate::extract::{AttendeeInstance, FlattenedObject, flatten};
use crate::itip::MessageGenerator;
use crate::principal::Directory;
use crate::role::{AttendeeContext, OrganizerContext, Role, classify};
use crate::store::{CalendarStore, fetch_by_uid};
use crate::transport::SchedulingTransport;

/// One write to a calendar object.
#[derive(Debug, Clone)]
pub struct SchedulingRequest {
    /// The incoming object, or the stored object being deleted
    pub calendar: CalendarObject,
    /// The stored copy being replaced, `None` for a new resource
    pub existing: Option<CalendarObject>,
    pub deleting: bool,
    /// Principal URL of the calendar's owner
    pub owner: String,
}

/// What an operation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScheduleOutcome {
    /// The owner is neither organizer nor attendee
    NoAction,
    /// Nothing worth a message changed; the object is left as it was
    Unchanged,
    /// Messages were sent and their statuses recorded on `calendar`
    Scheduled {
        calendar: CalendarObject,
        statuses: Vec<StatusUpdate>,
    },
}

/// State shared by every step of one operation.
struct OperationContext<'r> {
    uid: String,
    calendar: &'r CalendarObject,
    existing: Option<&'r CalendarObject>,
    deleting: bool,
    flat: FlattenedObject,
}

enum Plan {
    Unchanged,
    /// Delivery rounds, each finishing before the next starts
    Send(Vec<Vec<Delivery>>),
}

pub struct ImplicitScheduler<'a> {
    directory: &'a dyn Directory,
    store: &'a dyn CalendarStore,
    transport: &'a dyn SchedulingTransport,
    generator: &'a dyn MessageGenerator,
    config: &'a SchedulingConfig,
}

impl<'a> ImplicitScheduler<'a> {
    pub fn new(
        directory: &'a dyn Directory,
        store: &'a dyn CalendarStore,
        transport: &'a dyn SchedulingTransport,
        generator: &'a dyn MessageGenerator,
        config: &'a SchedulingConfig,
    ) -> Self {
        ImplicitScheduler {
            directory,
            store,
            transport,
            generator,
            config,
        }
    }

    pub async fn schedule(&self, request: SchedulingRequest) -> SchedulingResult<ScheduleOutcome> {
        let plan = {
            let flat = flatten(&request.calendar)?;
            let ctx = OperationContext {
                uid: flat.uid.clone(),
                calendar: &request.calendar,
                existing: request.existing.as_ref(),
                deleting: request.deleting,
                flat,
            };

            let role = classify(&ctx.flat, &request.owner, self.directory);
            debug!(uid = %ctx.uid, role = role.name(), owner = %request.owner, deleting = ctx.deleting, "Implicit scheduling");

            match role {
                Role::None => return Ok(ScheduleOutcome::NoAction),
                Role::Organizer(organizer) => self.organizer_plan(&ctx, &organizer)?,
                Role::Attendee(attendee) => self.attendee_plan(&ctx, &attendee).await?,
            }
        };

        let rounds = match plan {
            Plan::Unchanged => return Ok(ScheduleOutcome::Unchanged),
            Plan::Send(rounds) => rounds,
        };

        let mut calendar = request.calendar;
        let dispatcher = Dispatcher::new(self.transport, self.config);
        let mut statuses = Vec::new();
        for round in &rounds {
            statuses.extend(dispatcher.dispatch(&mut calendar, round).await);
        }

        Ok(ScheduleOutcome::Scheduled { calendar, statuses })
    }

    fn organizer_plan(
        &self,
        ctx: &OperationContext<'_>,
        organizer: &OrganizerContext,
    ) -> SchedulingResult<Plan> {
        let (cancel_source, cancelled) = if ctx.deleting {
            debug!(uid = %ctx.uid, organizer = %organizer.address, "Implicit - organizer is deleting");
            (ctx.calendar, deleting_cancellations(&ctx.flat))
        } else if let Some(old) = ctx.existing {
            let report = organizer_diff(old, ctx.calendar);
            if !report.is_significant() {
                debug!(uid = %ctx.uid, organizer = %organizer.address, "Implicit - organizer update is not significant");
                return Ok(Plan::Unchanged);
            }
            for change in &report.changes {
                debug!(uid = %ctx.uid, change = %change, "Significant change");
            }
            (old, cancellations_between(&flatten(old)?, &ctx.flat))
        } else {
            debug!(uid = %ctx.uid, organizer = %organizer.address, "Implicit - organizer is creating");
            (ctx.calendar, BTreeSet::new())
        };

        let cancels = self.cancel_deliveries(ctx, organizer, cancel_source, &cancelled)?;

        let mut requests = Vec::new();
        if !ctx.deleting {
            for attendee in ctx.flat.attendees() {
                if organizer.principal.has_address(attendee) {
                    continue;
                }
                info!(uid = %ctx.uid, organizer = %organizer.address, attendee = %attendee, "Implicit REQUEST");
                let recipients = vec![attendee.to_string()];
                requests.push(Delivery {
                    originator: organizer.address.clone(),
                    message: self.generator.generate_request(ctx.calendar, &recipients)?,
                    recipients,
                    target: UserProperty::Attendee,
                });
            }
        }

        Ok(Plan::Send(vec![cancels, requests]))
    }

    /// One CANCEL per attendee, covering all of that attendee's instances.
    fn cancel_deliveries(
        &self,
        ctx: &OperationContext<'_>,
        organizer: &OrganizerContext,
        source: &CalendarObject,
        cancelled: &BTreeSet<AttendeeInstance>,
    ) -> SchedulingResult<Vec<Delivery>> {
        let mut deliveries = Vec::new();
        for (attendee, rids) in aggregate_by_attendee(cancelled) {
            if organizer.principal.has_address(&attendee) {
                continue;
            }
            info!(uid = %ctx.uid, organizer = %organizer.address, attendee = %attendee, rids = ?rids, "Implicit CANCEL");
            let recipients = vec![attendee];
            deliveries.push(Delivery {
                originator: organizer.address.clone(),
                message: self
                    .generator
                    .generate_cancel(source, &recipients, rids.as_deref())?,
                recipients,
                target: UserProperty::Attendee,
            });
        }
        Ok(deliveries)
    }

    async fn attendee_plan(
        &self,
        ctx: &OperationContext<'_>,
        attendee: &AttendeeContext,
    ) -> SchedulingResult<Plan> {
        if ctx.deleting {
            debug!(uid = %ctx.uid, attendee = %attendee.address, "Implicit - attendee is cancelling");
            return Ok(Plan::Send(vec![vec![self.reply(ctx, attendee, true)?]]));
        }

        match self.organizers_copy(ctx, attendee).await {
            Some(copy) => {
                let merge = attendee_merge(&copy, ctx.calendar, &attendee.address);
                if !merge.change_allowed {
                    let changes: Vec<String> =
                        merge.disallowed.iter().map(|c| c.to_string()).collect();
                    error!(
                        uid = %ctx.uid,
                        attendee = %attendee.address,
                        changes = ?changes,
                        "Attendee is not allowed to make an unauthorized change to an organized event"
                    );
                    return Err(SchedulingError::ForbiddenAttendeeChange {
                        attendee: attendee.address.clone(),
                        uid: ctx.uid.clone(),
                    });
                }
                if merge.no_message_needed {
                    debug!(uid = %ctx.uid, attendee = %attendee.address, "Implicit - attendee update is not significant");
                    return Ok(Plan::Unchanged);
                }
            }
            None => {
                warn!(uid = %ctx.uid, attendee = %attendee.address, organizer = %attendee.organizer, "Organizer's copy unavailable, trusting attendee change");
                // Without the organizer's copy, only reply if our own copy changed
                if let Some(existing) = ctx.existing {
                    if attendee_merge(existing, ctx.calendar, &attendee.address).no_message_needed {
                        return Ok(Plan::Unchanged);
                    }
                }
            }
        }

        debug!(uid = %ctx.uid, attendee = %attendee.address, "Implicit - attendee is updating");
        Ok(Plan::Send(vec![vec![self.reply(ctx, attendee, false)?]]))
    }

    fn reply(
        &self,
        ctx: &OperationContext<'_>,
        attendee: &AttendeeContext,
        is_cancel: bool,
    ) -> SchedulingResult<Delivery> {
        info!(uid = %ctx.uid, attendee = %attendee.address, organizer = %attendee.organizer, cancel = is_cancel, "Implicit REPLY");
        Ok(Delivery {
            originator: attendee.address.clone(),
            recipients: vec![attendee.organizer.clone()],
            message: self
                .generator
                .generate_reply(ctx.calendar, &attendee.address, is_cancel)?,
            target: UserProperty::Organizer,
        })
    }

    /// The organizer's stored copy, when the organizer is hosted here.
    async fn organizers_copy(
        &self,
        ctx: &OperationContext<'_>,
        attendee: &AttendeeContext,
    ) -> Option<CalendarObject> {
        let principal = attendee.organizer_principal.as_ref()?;
        match fetch_by_uid(self.store, &principal.home_url, &ctx.uid).await {
            Ok(copy) => copy,
            Err(e) => {
                warn!(uid = %ctx.uid, home = %principal.home_url, error = %e, "Could not fetch organizer's copy");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::event::{EventTime, ParticipationStatus, Reminder};
    use crate::itip::{ITipGenerator, ITipMessage, ITipMethod};
    use crate::principal::{InMemoryDirectory, Principal};
    use crate::transport::{RecipientStatus, SchedulingResponse, status};

    const OLIVIA: &str = "mailto:olivia@example.com";
    const ALICE: &str = "mailto:alice@example.com";
    const BOB: &str = "mailto:bob@example.com";
    const CAROL: &str = "mailto:carol@example.com";

    fn directory() -> InMemoryDirectory {
        let principal = |name: &str, addresses: &[&str]| Principal {
            url: format!("/principals/{name}/"),
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            home_url: format!("/calendars/{name}/"),
        };
        InMemoryDirectory::new(vec![
            principal("olivia", &[OLIVIA, "urn:uuid:olivia"]),
            principal("alice", &[ALICE]),
            principal("bob", &[BOB]),
        ])
    }

    #[derive(Default)]
    struct MockStore {
        objects: HashMap<String, CalendarObject>,
        broken: bool,
    }

    #[async_trait]
    impl CalendarStore for MockStore {
        async fn resource_name_for_uid(
            &self,
            home_url: &str,
            uid: &str,
        ) -> SchedulingResult<Option<String>> {
            if self.broken {
                return Err(SchedulingError::Store("index unavailable".into()));
            }
            let name = format!("{home_url}{uid}.ics");
            Ok(self.objects.contains_key(&name).then_some(name))
        }

        async fn calendar_object(
            &self,
            _home_url: &str,
            resource_name: &str,
        ) -> SchedulingResult<Option<CalendarObject>> {
            Ok(self.objects.get(resource_name).cloned())
        }
    }

    #[derive(Debug, Clone)]
    struct Sent {
        originator: String,
        recipients: Vec<String>,
        message: ITipMessage,
    }

    /// Records every send; `mailto:carol@` is not deliverable.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl SchedulingTransport for RecordingTransport {
        async fn send(
            &self,
            originator: &str,
            recipients: &[String],
            message: &ITipMessage,
        ) -> SchedulingResult<SchedulingResponse> {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(Sent {
                originator: originator.to_string(),
                recipients: recipients.to_vec(),
                message: message.clone(),
            });
            if recipients.iter().any(|r| r == CAROL) {
                return Err(SchedulingError::Transport("no route to carol".into()));
            }
            Ok(SchedulingResponse {
                responses: recipients
                    .iter()
                    .map(|r| RecipientStatus::new(r, status::SUCCESS))
                    .collect(),
            })
        }
    }

    struct Harness {
        directory: InMemoryDirectory,
        store: MockStore,
        transport: RecordingTransport,
        config: SchedulingConfig,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                directory: directory(),
                store: MockStore::default(),
                transport: RecordingTransport::default(),
                config: SchedulingConfig::default(),
            }
        }

        async fn run(&self, request: SchedulingRequest) -> SchedulingResult<ScheduleOutcome> {
            ImplicitScheduler::new(
                &self.directory,
                &self.store,
                &self.transport,
                &ITipGenerator,
                &self.config,
            )
            .schedule(request)
            .await
        }
    }

    fn request(calendar: CalendarObject, existing: Option<CalendarObject>, owner: &str) -> SchedulingRequest {
        SchedulingRequest {
            calendar,
            existing,
            deleting: false,
            owner: format!("/principals/{owner}/"),
        }
    }

    fn scheduled(outcome: ScheduleOutcome) -> (CalendarObject, Vec<StatusUpdate>) {
        match outcome {
            ScheduleOutcome::Scheduled { calendar, statuses } => (calendar, statuses),
            other => panic!("expected Scheduled, got {:?}", other),
        }
    }

    fn parse(ics: &str) -> CalendarObject {
        CalendarObject::from_ics(ics).unwrap()
    }

    const MEETING: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:kickoff
SUMMARY:Kickoff
DTSTART:20240115T100000Z
DTEND:20240115T110000Z
ORGANIZER:mailto:olivia@example.com
ATTENDEE;PARTSTAT=ACCEPTED:mailto:olivia@example.com
ATTENDEE;PARTSTAT=NEEDS-ACTION:mailto:alice@example.com
ATTENDEE;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com
END:VEVENT
END:VCALENDAR"#;

    const SERIES: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:standup
SUMMARY:Standup
DTSTART:20240101T090000Z
DTEND:20240101T091500Z
RRULE:FREQ=DAILY;COUNT=5
ORGANIZER:mailto:olivia@example.com
ATTENDEE:mailto:alice@example.com
ATTENDEE:mailto:bob@example.com
END:VEVENT
BEGIN:VEVENT
UID:standup
RECURRENCE-ID:20240102T090000Z
SUMMARY:Standup
DTSTART:20240102T100000Z
DTEND:20240102T101500Z
ORGANIZER:mailto:olivia@example.com
ATTENDEE:mailto:alice@example.com
ATTENDEE:mailto:carol@example.com
END:VEVENT
END:VCALENDAR"#;

    const SERIES_OVERRIDE_EXCLUDED: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:standup
SUMMARY:Standup
DTSTART:20240101T090000Z
DTEND:20240101T091500Z
RRULE:FREQ=DAILY;COUNT=5
EXDATE:20240102T090000Z
ORGANIZER:mailto:olivia@example.com
ATTENDEE:mailto:alice@example.com
ATTENDEE:mailto:bob@example.com
END:VEVENT
END:VCALENDAR"#;

    const TWO_ORGANIZERS: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:clash
DTSTART:20240101T090000Z
RRULE:FREQ=DAILY
ORGANIZER:mailto:olivia@example.com
ATTENDEE:mailto:alice@example.com
END:VEVENT
BEGIN:VEVENT
UID:clash
RECURRENCE-ID:20240102T090000Z
DTSTART:20240102T090000Z
ORGANIZER:mailto:bob@example.com
ATTENDEE:mailto:alice@example.com
END:VEVENT
END:VCALENDAR"#;

    fn attendee_status(calendar: &CalendarObject, address: &str) -> Option<String> {
        calendar.events[0]
            .attendee(address)
            .and_then(|a| a.schedule_status.clone())
    }

    #[tokio::test]
    async fn test_multiple_organizers_fail_before_sending() {
        let harness = Harness::new();
        let result = harness.run(request(parse(TWO_ORGANIZERS), None, "olivia")).await;

        assert!(matches!(result, Err(SchedulingError::SingleOrganizer { .. })));
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_owner_takes_no_action() {
        let harness = Harness::new();
        let outcome = harness.run(request(parse(MEETING), None, "dave")).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::NoAction);
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_new_meeting_invites_everyone_but_the_organizer() {
        let harness = Harness::new();
        let outcome = harness.run(request(parse(MEETING), None, "olivia")).await.unwrap();

        let sent = harness.transport.sent();
        let mut recipients: Vec<&str> = sent.iter().map(|s| s.recipients[0].as_str()).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec![ALICE, BOB]);
        assert!(sent.iter().all(|s| s.originator == OLIVIA));
        assert!(sent.iter().all(|s| s.message.method == ITipMethod::Request));

        let (calendar, statuses) = scheduled(outcome);
        assert_eq!(statuses.len(), 2);
        assert_eq!(attendee_status(&calendar, ALICE).as_deref(), Some("2.0"));
        assert_eq!(attendee_status(&calendar, BOB).as_deref(), Some("2.0"));
        assert_eq!(attendee_status(&calendar, OLIVIA), None);
    }

    #[tokio::test]
    async fn test_insignificant_update_sends_nothing() {
        let harness = Harness::new();
        let old = parse(MEETING);
        let mut new = parse(MEETING);
        new.events[0].description = Some("Dial-in details".into());
        new.events[0].reminders.push(Reminder { minutes: 5 });

        let outcome = harness.run(request(new, Some(old), "olivia")).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::Unchanged);
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_removed_attendee_is_cancelled_before_requests() {
        let harness = Harness::new();
        let old = parse(MEETING);
        let mut new = parse(MEETING);
        new.events[0].attendees.retain(|a| a.address != ALICE);

        let outcome = harness.run(request(new, Some(old), "olivia")).await.unwrap();

        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].message.method, ITipMethod::Cancel);
        assert_eq!(sent[0].recipients, vec![ALICE.to_string()]);
        assert_eq!(sent[1].message.method, ITipMethod::Request);
        assert_eq!(sent[1].recipients, vec![BOB.to_string()]);

        let (calendar, _) = scheduled(outcome);
        assert_eq!(attendee_status(&calendar, BOB).as_deref(), Some("2.0"));
        assert!(calendar.events[0].attendee(ALICE).is_none());
    }

    #[tokio::test]
    async fn test_deleting_cancels_everyone() {
        let harness = Harness::new();
        let mut req = request(parse(MEETING), None, "olivia");
        req.deleting = true;

        let outcome = harness.run(req).await.unwrap();

        let sent = harness.transport.sent();
        let mut recipients: Vec<&str> = sent.iter().map(|s| s.recipients[0].as_str()).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec![ALICE, BOB]);
        assert!(sent.iter().all(|s| s.message.method == ITipMethod::Cancel));
        assert!(sent.iter().all(|s| s.message.calendar.events.len() == 1));

        let (calendar, _) = scheduled(outcome);
        assert_eq!(attendee_status(&calendar, ALICE).as_deref(), Some("2.0"));
    }

    #[tokio::test]
    async fn test_removed_override_cancels_instance_and_records_failure() {
        let harness = Harness::new();
        let r1 = EventTime::DateTimeUtc("2024-01-02T09:00:00Z".parse().unwrap());

        let outcome = harness
            .run(request(
                parse(SERIES_OVERRIDE_EXCLUDED),
                Some(parse(SERIES)),
                "olivia",
            ))
            .await
            .unwrap();

        let sent = harness.transport.sent();
        let cancels: Vec<&Sent> = sent
            .iter()
            .filter(|s| s.message.method == ITipMethod::Cancel)
            .collect();
        // Alice loses R1 through the new EXDATE, Carol only had R1
        assert_eq!(cancels.len(), 2);
        for cancel in &cancels {
            assert_eq!(cancel.message.calendar.events.len(), 1);
            assert_eq!(cancel.message.calendar.events[0].recurrence_id, Some(r1.clone()));
        }

        let mut requests: Vec<&str> = sent
            .iter()
            .filter(|s| s.message.method == ITipMethod::Request)
            .map(|s| s.recipients[0].as_str())
            .collect();
        requests.sort_unstable();
        assert_eq!(requests, vec![ALICE, BOB]);
        // Every cancel went out before the first request
        let first_request = sent
            .iter()
            .position(|s| s.message.method == ITipMethod::Request)
            .unwrap();
        assert_eq!(first_request, 2);

        // Carol's send failed but the others went through
        let (calendar, statuses) = scheduled(outcome);
        assert!(statuses.iter().any(|s| s.recipient == CAROL && s.status == "5.1"));
        assert_eq!(attendee_status(&calendar, ALICE).as_deref(), Some("2.0"));
        assert_eq!(attendee_status(&calendar, BOB).as_deref(), Some("2.0"));
    }

    #[tokio::test]
    async fn test_organizer_listed_under_another_address_is_skipped() {
        let harness = Harness::new();
        let mut calendar = parse(MEETING);
        calendar.events[0]
            .attendees
            .push(crate::event::Attendee::new("urn:uuid:olivia"));

        harness.run(request(calendar, None, "olivia")).await.unwrap();

        let sent = harness.transport.sent();
        assert!(sent.iter().all(|s| s.recipients[0] != "urn:uuid:olivia"));
        assert!(sent.iter().all(|s| s.recipients[0] != OLIVIA));
        assert_eq!(sent.len(), 2);
    }

    fn harness_with_organizer_copy() -> Harness {
        let mut harness = Harness::new();
        harness.store.objects.insert(
            "/calendars/olivia/kickoff.ics".to_string(),
            parse(MEETING),
        );
        harness
    }

    #[tokio::test]
    async fn test_attendee_accepting_replies_to_organizer() {
        let harness = harness_with_organizer_copy();
        let mut new = parse(MEETING);
        new.events[0].attendees[1].partstat = Some(ParticipationStatus::Accepted);

        let outcome = harness
            .run(request(new, Some(parse(MEETING)), "alice"))
            .await
            .unwrap();

        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].originator, ALICE);
        assert_eq!(sent[0].recipients, vec![OLIVIA.to_string()]);
        assert_eq!(sent[0].message.method, ITipMethod::Reply);
        let replied = &sent[0].message.calendar.events[0].attendees;
        assert_eq!(replied.len(), 1);
        assert_eq!(replied[0].partstat, Some(ParticipationStatus::Accepted));

        let (calendar, statuses) = scheduled(outcome);
        assert_eq!(statuses[0].property, UserProperty::Organizer);
        assert_eq!(
            calendar.events[0].organizer.as_ref().unwrap().schedule_status.as_deref(),
            Some("2.0")
        );
    }

    #[tokio::test]
    async fn test_attendee_alarm_change_sends_nothing() {
        let harness = harness_with_organizer_copy();
        let mut new = parse(MEETING);
        new.events[0].reminders.push(Reminder { minutes: 30 });

        let outcome = harness
            .run(request(new, Some(parse(MEETING)), "alice"))
            .await
            .unwrap();

        assert_eq!(outcome, ScheduleOutcome::Unchanged);
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_attendee_rescheduling_is_forbidden() {
        let harness = harness_with_organizer_copy();
        let mut new = parse(MEETING);
        new.events[0].start = EventTime::DateTimeUtc("2024-01-15T12:00:00Z".parse().unwrap());

        let result = harness.run(request(new, Some(parse(MEETING)), "alice")).await;

        let err = result.unwrap_err();
        assert!(matches!(err, SchedulingError::ForbiddenAttendeeChange { .. }));
        assert_eq!(err.precondition(), Some("valid-attendee-change"));
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_attendee_change_is_trusted_when_organizer_copy_is_missing() {
        let harness = Harness::new();
        let mut new = parse(MEETING);
        new.events[0].attendees[1].partstat = Some(ParticipationStatus::Tentative);
        new.events[0].summary = Some("My kickoff".into());

        harness
            .run(request(new, Some(parse(MEETING)), "alice"))
            .await
            .unwrap();

        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.method, ITipMethod::Reply);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_trusting_the_attendee() {
        let mut harness = harness_with_organizer_copy();
        harness.store.broken = true;
        let mut new = parse(MEETING);
        new.events[0].attendees[1].partstat = Some(ParticipationStatus::Declined);

        let outcome = harness.run(request(new, None, "alice")).await.unwrap();

        assert!(matches!(outcome, ScheduleOutcome::Scheduled { .. }));
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_attendee_deleting_sends_declining_reply() {
        let harness = harness_with_organizer_copy();
        let mut req = request(parse(MEETING), None, "bob");
        req.deleting = true;

        harness.run(req).await.unwrap();

        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].originator, BOB);
        assert_eq!(sent[0].recipients, vec![OLIVIA.to_string()]);
        assert_eq!(sent[0].message.method, ITipMethod::Reply);
        assert_eq!(
            sent[0].message.calendar.events[0].attendees[0].partstat,
            Some(ParticipationStatus::Declined)
        );
    }
}
