use super::IAppointmentRepo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use varsel_domain::{Appointment, TimeSpan};

pub struct InMemoryAppointmentRepo {
    appointments: Mutex<Vec<Appointment>>,
    unavailable: AtomicBool,
}

impl InMemoryAppointmentRepo {
    pub fn new() -> Self {
        Self {
            appointments: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes lookups fail, to exercise the caller's abort path.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed helper for tests; the appointment store itself is owned by an
    /// external collaborator.
    pub fn insert(&self, appointment: &Appointment) {
        let mut appointments = self.appointments.lock().unwrap();
        appointments.push(appointment.clone());
    }
}

impl Default for InMemoryAppointmentRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for InMemoryAppointmentRepo {
    async fn find_in_timespan(&self, span: &TimeSpan) -> anyhow::Result<Vec<Appointment>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg("Appointment store is unavailable"));
        }
        let appointments = self.appointments.lock().unwrap();
        let mut found = appointments
            .iter()
            .filter(|a| span.contains(a.scheduled_at))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|a| a.scheduled_at);
        Ok(found)
    }
}
