mod inmemory;
mod postgres;

pub use inmemory::InMemoryRecipientRepo;
pub use postgres::PostgresRecipientRepo;
use varsel_domain::Recipient;

#[async_trait::async_trait]
pub trait IRecipientRepo: Send + Sync {
    /// All recipients that opted in to reminders and have a usable
    /// phone number.
    async fn find_opted_in(&self) -> anyhow::Result<Vec<Recipient>>;
}
