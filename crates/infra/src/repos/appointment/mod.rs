mod inmemory;
mod postgres;

pub use inmemory::InMemoryAppointmentRepo;
pub use postgres::PostgresAppointmentRepo;
use varsel_domain::{Appointment, TimeSpan};

#[async_trait::async_trait]
pub trait IAppointmentRepo: Send + Sync {
    /// All appointments whose scheduled instant lies within the span,
    /// both ends inclusive, ordered by scheduled instant ascending.
    async fn find_in_timespan(&self, span: &TimeSpan) -> anyhow::Result<Vec<Appointment>>;
}
