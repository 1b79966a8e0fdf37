use super::IRecipientRepo;
use std::sync::Mutex;
use varsel_domain::Recipient;

pub struct InMemoryRecipientRepo {
    recipients: Mutex<Vec<Recipient>>,
}

impl InMemoryRecipientRepo {
    pub fn new() -> Self {
        Self {
            recipients: Mutex::new(Vec::new()),
        }
    }

    /// Seed helper for tests; the recipient store itself is owned by an
    /// external collaborator.
    pub fn insert(&self, recipient: &Recipient) {
        let mut recipients = self.recipients.lock().unwrap();
        recipients.push(recipient.clone());
    }
}

impl Default for InMemoryRecipientRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IRecipientRepo for InMemoryRecipientRepo {
    async fn find_opted_in(&self) -> anyhow::Result<Vec<Recipient>> {
        let recipients = self.recipients.lock().unwrap();
        Ok(recipients
            .iter()
            .filter(|r| r.is_eligible())
            .cloned()
            .collect())
    }
}
