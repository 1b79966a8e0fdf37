mod appointment;
mod day_window;
mod recipient;
mod reminder;
mod shared;
mod timespan;

pub use appointment::{Appointment, AppointmentStatus};
pub use day_window::{day_window, DayWindowError};
pub use recipient::Recipient;
pub use reminder::{DeliveryStatus, InvalidReminderKindError, ReminderKind, ReminderRecord};
pub use shared::entity::{Entity, ID};
pub use timespan::{InvalidTimeSpanError, TimeSpan};
