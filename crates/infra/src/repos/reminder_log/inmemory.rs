use super::IReminderLogRepo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use varsel_domain::{ReminderKind, ReminderRecord, ID};

pub struct InMemoryReminderLogRepo {
    records: Mutex<Vec<ReminderRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryReminderLogRepo {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes reads fail, to exercise the caller's unreachable-ledger bias.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<ReminderRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for InMemoryReminderLogRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn same_triple(record: &ReminderRecord, appointment_id: &ID, kind: ReminderKind, recipient_id: &ID) -> bool {
    record.appointment_id == *appointment_id
        && record.kind == kind
        && record.recipient_id == *recipient_id
}

#[async_trait::async_trait]
impl IReminderLogRepo for InMemoryReminderLogRepo {
    async fn was_sent(
        &self,
        appointment_id: &ID,
        kind: ReminderKind,
        recipient_id: &ID,
    ) -> anyhow::Result<bool> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg("Reminder log is unavailable"));
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .any(|r| same_triple(r, appointment_id, kind, recipient_id)))
    }

    async fn record_attempt(&self, record: &ReminderRecord) -> anyhow::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg("Reminder log is unavailable"));
        }
        let mut records = self.records.lock().unwrap();
        let duplicate = records
            .iter()
            .any(|r| same_triple(r, &record.appointment_id, record.kind, &record.recipient_id));
        // Conflict on the composite key is a no-op, matching the postgres
        // ON CONFLICT DO NOTHING behavior.
        if !duplicate {
            records.push(record.clone());
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}
