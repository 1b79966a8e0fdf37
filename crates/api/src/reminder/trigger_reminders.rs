use crate::error::VarselError;
use crate::reminder::send_reminders::{
    run_trigger, RecipientResult, SendRemindersResponse, TriggerRun,
};
use crate::shared::state::SchedulerState;
use actix_web::{web, HttpResponse};
use varsel_api_structs::dtos::RecipientOutcomeDTO;
use varsel_api_structs::trigger_reminders::{APIResponse, PathParams};
use varsel_domain::ReminderKind;
use varsel_infra::VarselContext;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reminders/{kind}/trigger",
        web::post().to(trigger_reminders_controller),
    );
}

/// Administrative override: force-fire one reminder kind outside its
/// schedule. Runs the exact same path as the timers, so it is idempotent
/// with respect to already-sent records.
async fn trigger_reminders_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<VarselContext>,
    state: web::Data<SchedulerState>,
) -> Result<HttpResponse, VarselError> {
    let kind: ReminderKind = path
        .kind
        .parse()
        .map_err(|_| VarselError::NotFound(format!("Unknown reminder kind: {}", path.kind)))?;

    match run_trigger(kind, &ctx, &state).await {
        TriggerRun::Completed(response) => {
            Ok(HttpResponse::Ok().json(to_api_response(kind, response)))
        }
        TriggerRun::AlreadyRunning => Err(VarselError::Conflict(format!(
            "A {} firing is already running",
            kind
        ))),
        TriggerRun::Aborted(e) => Err(VarselError::Aborted(format!("{:?}", e))),
    }
}

fn to_api_response(kind: ReminderKind, response: SendRemindersResponse) -> APIResponse {
    match response {
        SendRemindersResponse::NothingDue => APIResponse {
            kind: kind.to_string(),
            status: "nothingDue".into(),
            appointments: 0,
            outcomes: Vec::new(),
        },
        SendRemindersResponse::Dispatched {
            appointments,
            outcomes,
            ..
        } => APIResponse {
            kind: kind.to_string(),
            status: "dispatched".into(),
            appointments,
            outcomes: outcomes
                .into_iter()
                .map(|o| {
                    let (outcome, message_sid, error) = match o.result {
                        RecipientResult::Skipped => ("skipped".to_string(), None, None),
                        RecipientResult::Sent { sid } => ("sent".to_string(), Some(sid), None),
                        RecipientResult::Failed { error } => {
                            ("failed".to_string(), None, Some(error))
                        }
                    };
                    RecipientOutcomeDTO {
                        recipient_id: o.recipient_id,
                        phone: o.phone,
                        outcome,
                        message_sid,
                        error,
                    }
                })
                .collect(),
        },
    }
}
