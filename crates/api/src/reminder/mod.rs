mod compose;
mod send_reminders;
mod trigger_reminders;

use actix_web::web;

pub use send_reminders::{run_trigger, TriggerRun};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    trigger_reminders::configure_routes(cfg);
}
