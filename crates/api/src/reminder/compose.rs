use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use varsel_domain::{Appointment, ReminderKind};

// SMS real estate is scarce; long notes are cut hard.
const NOTES_MAX_CHARS: usize = 60;

/// Renders the notification body for one batch of appointments. One
/// appointment gets the detailed template, two or more the compact list.
/// Every message ends with the deep link back to the appointment view.
pub fn compose_message(
    kind: ReminderKind,
    appointments: &[Appointment],
    tz: Tz,
    appointments_url: &str,
) -> String {
    let mut message = if appointments.len() == 1 {
        single_message(kind, &appointments[0], tz)
    } else {
        batch_message(kind, appointments, tz)
    };
    message.push('\n');
    message.push_str(appointments_url);
    message
}

fn kind_phrase(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::DayBefore => "tomorrow",
        ReminderKind::DayOf => "today",
        ReminderKind::OneHour => "coming up",
    }
}

fn local_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%a %d %b %H:%M").to_string()
}

fn single_message(kind: ReminderKind, appointment: &Appointment, tz: Tz) -> String {
    let mut first = format!(
        "Appointment {}: {} ({}) at {}",
        kind_phrase(kind),
        appointment.customer_name,
        appointment.customer_phone,
        local_time(appointment.scheduled_at, tz)
    );
    if !appointment.status.is_default() {
        first.push_str(&format!(" [{}]", appointment.status));
    }

    let mut lines = vec![first];
    if !appointment.interests.is_empty() {
        lines.push(format!("Interests: {}", appointment.interests.join(", ")));
    }
    let notes = truncate_notes(&appointment.notes);
    if !notes.is_empty() {
        lines.push(format!("Notes: {}", notes));
    }
    lines.join("\n")
}

fn batch_message(kind: ReminderKind, appointments: &[Appointment], tz: Tz) -> String {
    let mut lines = vec![format!(
        "{} appointments {}:",
        appointments.len(),
        kind_phrase(kind)
    )];
    for (i, appointment) in appointments.iter().enumerate() {
        let mut line = format!(
            "{}. {} - {} - {}",
            i + 1,
            appointment.customer_name,
            appointment.customer_phone,
            local_time(appointment.scheduled_at, tz)
        );
        if !appointment.status.is_default() {
            line.push_str(&format!(" [{}]", appointment.status));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn truncate_notes(notes: &str) -> String {
    let trimmed = notes.trim();
    if trimmed.chars().count() <= NOTES_MAX_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(NOTES_MAX_CHARS).collect();
    format!("{}…", cut)
}
