//! Filesystem-backed collaborators.
//!
//! Calendar homes are directories under a common root: the home URL
//! `/calendars/olivia/` lives at `<root>/calendars/olivia/`, and every `.ics`
//! file below it (outside `inbox/`) is a calendar object resource. Delivered
//! messages are written to the recipient's `inbox/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use caldir_scheduling::transport::status;
use caldir_scheduling::{
    CalendarObject, CalendarStore, Directory, ITipMessage, InMemoryDirectory, RecipientStatus,
    SchedulingError, SchedulingResponse, SchedulingResult, SchedulingTransport,
};
use tracing::{debug, info};

const INBOX_DIR: &str = "inbox";

fn home_path(root: &Path, home_url: &str) -> PathBuf {
    root.join(home_url.trim_matches('/'))
}

/// Calendar homes stored as directories of .ics files.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: &Path) -> Self {
        LocalStore {
            root: root.to_path_buf(),
        }
    }

    /// Every .ics file under a home, as paths relative to it.
    async fn resources(&self, home: &Path) -> SchedulingResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        if !home.is_dir() {
            return Ok(found);
        }

        let mut pending = vec![home.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    if entry.file_name() != INBOX_DIR {
                        pending.push(path);
                    }
                } else if path.extension().is_some_and(|ext| ext == "ics") {
                    if let Ok(relative) = path.strip_prefix(home) {
                        found.push(relative.to_path_buf());
                    }
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

#[async_trait]
impl CalendarStore for LocalStore {
    async fn resource_name_for_uid(
        &self,
        home_url: &str,
        uid: &str,
    ) -> SchedulingResult<Option<String>> {
        let home = home_path(&self.root, home_url);
        for resource in self.resources(&home).await? {
            let content = tokio::fs::read_to_string(home.join(&resource)).await?;
            // Unparseable files in a home are not ours to judge here
            let Ok(object) = CalendarObject::from_ics(&content) else {
                debug!(path = %resource.display(), "Skipping unparseable resource");
                continue;
            };
            if object.uid() == uid {
                return Ok(Some(resource.to_string_lossy().into_owned()));
            }
        }
        Ok(None)
    }

    async fn calendar_object(
        &self,
        home_url: &str,
        resource_name: &str,
    ) -> SchedulingResult<Option<CalendarObject>> {
        let path = home_path(&self.root, home_url).join(resource_name);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SchedulingError::Store(format!("{}: {e}", path.display())))?;
        CalendarObject::from_ics(&content).map(Some)
    }
}

/// Delivers to the inbox of locally hosted recipients.
///
/// Recipients the directory does not know get "invalid user".
pub struct InboxTransport {
    directory: InMemoryDirectory,
    root: PathBuf,
}

impl InboxTransport {
    pub fn new(directory: InMemoryDirectory, root: &Path) -> Self {
        InboxTransport {
            directory,
            root: root.to_path_buf(),
        }
    }
}

#[async_trait]
impl SchedulingTransport for InboxTransport {
    async fn send(
        &self,
        originator: &str,
        recipients: &[String],
        message: &ITipMessage,
    ) -> SchedulingResult<SchedulingResponse> {
        let body = message.to_ics()?;
        let filename = format!(
            "{}-{}.ics",
            message.calendar.uid(),
            message.method.as_str().to_lowercase()
        );

        let mut responses = Vec::new();
        for recipient in recipients {
            let Some(principal) = self.directory.principal_for_address(recipient) else {
                info!(originator = %originator, recipient = %recipient, "Recipient is not hosted here");
                responses.push(RecipientStatus::new(recipient, status::INVALID_USER));
                continue;
            };

            let inbox = home_path(&self.root, &principal.home_url).join(INBOX_DIR);
            tokio::fs::create_dir_all(&inbox).await?;
            tokio::fs::write(inbox.join(&filename), &body).await?;
            info!(originator = %originator, recipient = %recipient, method = %message.method, "Delivered to inbox");
            responses.push(RecipientStatus::new(recipient, status::DELIVERED));
        }

        Ok(SchedulingResponse { responses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldir_scheduling::{ITipGenerator, MessageGenerator, Principal};

    const LUNCH: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:lunch
DTSTART:20240110T120000Z
ORGANIZER:mailto:olivia@example.com
ATTENDEE:mailto:alice@example.com
ATTENDEE:mailto:remote@elsewhere.org
END:VEVENT
END:VCALENDAR"#;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new(vec![Principal {
            url: "/principals/alice/".into(),
            addresses: vec!["mailto:alice@example.com".into()],
            home_url: "/calendars/alice/".into(),
        }])
    }

    #[tokio::test]
    async fn test_store_finds_resource_by_uid() {
        let root = tempfile::tempdir().unwrap();
        let calendar = root.path().join("calendars/olivia/work");
        std::fs::create_dir_all(&calendar).unwrap();
        std::fs::write(calendar.join("lunch.ics"), LUNCH).unwrap();
        std::fs::write(calendar.join("notes.txt"), "not a calendar").unwrap();

        let store = LocalStore::new(root.path());
        let name = store
            .resource_name_for_uid("/calendars/olivia/", "lunch")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Path::new(&name), Path::new("work/lunch.ics"));

        let object = store
            .calendar_object("/calendars/olivia/", &name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(object.uid(), "lunch");

        assert!(
            store
                .resource_name_for_uid("/calendars/nobody/", "lunch")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_inbox_delivery_statuses() {
        let root = tempfile::tempdir().unwrap();
        let transport = InboxTransport::new(directory(), root.path());
        let calendar = CalendarObject::from_ics(LUNCH).unwrap();
        let recipients = vec![
            "mailto:alice@example.com".to_string(),
            "mailto:remote@elsewhere.org".to_string(),
        ];
        let message = ITipGenerator.generate_request(&calendar, &recipients).unwrap();

        let response = transport
            .send("mailto:olivia@example.com", &recipients, &message)
            .await
            .unwrap();

        assert_eq!(
            response.responses,
            vec![
                RecipientStatus::new("mailto:alice@example.com", status::DELIVERED),
                RecipientStatus::new("mailto:remote@elsewhere.org", status::INVALID_USER),
            ]
        );
        let delivered = root.path().join("calendars/alice/inbox/lunch-request.ics");
        let content = std::fs::read_to_string(delivered).unwrap();
        assert!(content.contains("METHOD:REQUEST"));
    }
}
