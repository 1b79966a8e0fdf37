use crate::shared::state::SchedulerState;
use actix_web::{web, HttpResponse};
use varsel_api_structs::get_service_health::*;
use varsel_infra::{IReminderLogRepo, VarselContext};

async fn status(
    ctx: web::Data<VarselContext>,
    state: web::Data<SchedulerState>,
) -> HttpResponse {
    let snapshot = state.snapshot();
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        sms_ready: ctx.sms.is_ready(),
        database_ready: ctx.repos.reminder_log.is_healthy().await,
        sent: snapshot.sent,
        errors: snapshot.errors,
        triggers: snapshot
            .last_run
            .into_iter()
            .map(|(kind, last_run)| KindStatsDTO {
                kind: kind.to_string(),
                last_run,
            })
            .collect(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}
