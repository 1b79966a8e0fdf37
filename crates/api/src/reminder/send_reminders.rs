use crate::reminder::compose::compose_message;
use crate::shared::state::SchedulerState;
use crate::shared::usecase::{execute, UseCase};
use chrono::Duration;
use tracing::{error, warn};
use varsel_domain::{
    day_window, Appointment, Recipient, ReminderKind, ReminderRecord, TimeSpan, ID,
};
use varsel_infra::{
    DeliveryOutcome, IAppointmentRepo, IRecipientRepo, IReminderLogRepo, ISys, VarselContext,
};

/// One firing of a reminder trigger: resolve the window for the kind, fetch
/// the appointments inside it, and drive composition, delivery and ledger
/// writes for every eligible recipient. Scheduled timers and the manual
/// trigger both run exactly this usecase.
#[derive(Debug)]
pub struct SendRemindersUseCase {
    pub kind: ReminderKind,
}

#[derive(Debug)]
pub enum UseCaseError {
    /// The window for this firing could not be expressed as absolute time.
    Window(String),
    AppointmentLookup(anyhow::Error),
    RecipientLookup(anyhow::Error),
}

#[derive(Debug)]
pub enum SendRemindersResponse {
    /// The window held no appointments; recipients were never resolved.
    NothingDue,
    Dispatched {
        window: TimeSpan,
        appointments: usize,
        outcomes: Vec<RecipientOutcome>,
    },
}

impl SendRemindersResponse {
    /// (sent, errors) for the stats tracker. Skips count as neither.
    pub fn counters(&self) -> (u64, u64) {
        match self {
            Self::NothingDue => (0, 0),
            Self::Dispatched { outcomes, .. } => outcomes.iter().fold((0, 0), |(s, e), o| {
                match o.result {
                    RecipientResult::Sent { .. } => (s + 1, e),
                    RecipientResult::Failed { .. } => (s, e + 1),
                    RecipientResult::Skipped => (s, e),
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientOutcome {
    pub recipient_id: ID,
    pub phone: String,
    pub result: RecipientResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecipientResult {
    /// Every appointment in the batch was already recorded for this
    /// recipient.
    Skipped,
    Sent {
        sid: String,
    },
    Failed {
        error: String,
    },
}

const ONE_HOUR_LEAD_MINS: i64 = 60;

impl SendRemindersUseCase {
    fn resolve_window(&self, ctx: &VarselContext) -> Result<TimeSpan, UseCaseError> {
        let now = ctx.sys.now();
        let tz = ctx.config.timezone;
        match self.kind {
            ReminderKind::DayBefore => {
                let tomorrow = now
                    .with_timezone(&tz)
                    .date_naive()
                    .succ_opt()
                    .ok_or_else(|| UseCaseError::Window("Tomorrow is out of range".into()))?;
                day_window(tomorrow, tz).map_err(|e| UseCaseError::Window(e.to_string()))
            }
            ReminderKind::DayOf => {
                let today = now.with_timezone(&tz).date_naive();
                day_window(today, tz).map_err(|e| UseCaseError::Window(e.to_string()))
            }
            ReminderKind::OneHour => {
                let center = now + Duration::minutes(ONE_HOUR_LEAD_MINS);
                let tolerance = Duration::minutes(ctx.config.one_hour_tolerance_mins);
                TimeSpan::create(center - tolerance, center + tolerance)
                    .map_err(|e| UseCaseError::Window(e.to_string()))
            }
        }
    }

    /// How many appointments of the batch have no ledger record yet for this
    /// recipient. A ledger read error is deliberately treated as "already
    /// sent": an occasionally missed reminder beats a duplicate SMS.
    async fn count_pending(
        &self,
        ctx: &VarselContext,
        appointments: &[Appointment],
        recipient: &Recipient,
    ) -> usize {
        let mut pending = 0;
        for appointment in appointments {
            let sent = match ctx
                .repos
                .reminder_log
                .was_sent(&appointment.id, self.kind, &recipient.id)
                .await
            {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(
                        appointment_id = %appointment.id,
                        recipient_id = %recipient.id,
                        kind = %self.kind,
                        error = %e,
                        "Reminder log unreachable, treating as already sent"
                    );
                    true
                }
            };
            if !sent {
                pending += 1;
            }
        }
        pending
    }
}

#[async_trait::async_trait]
impl UseCase for SendRemindersUseCase {
    type Response = SendRemindersResponse;

    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &VarselContext) -> Result<Self::Response, Self::Errors> {
        let window = self.resolve_window(ctx)?;

        let appointments = ctx
            .repos
            .appointments
            .find_in_timespan(&window)
            .await
            .map_err(UseCaseError::AppointmentLookup)?;
        if appointments.is_empty() {
            return Ok(SendRemindersResponse::NothingDue);
        }

        let recipients = ctx
            .repos
            .recipients
            .find_opted_in()
            .await
            .map_err(UseCaseError::RecipientLookup)?;

        let mut outcomes = Vec::with_capacity(recipients.len());
        let mut dispatched_before = false;
        for recipient in recipients {
            if self.count_pending(ctx, &appointments, &recipient).await == 0 {
                outcomes.push(RecipientOutcome {
                    recipient_id: recipient.id,
                    phone: recipient.phone,
                    result: RecipientResult::Skipped,
                });
                continue;
            }

            if dispatched_before {
                ctx.sms.throttle().await;
            }
            dispatched_before = true;

            let body = compose_message(
                self.kind,
                &appointments,
                ctx.config.timezone,
                &ctx.config.appointments_url,
            );
            let outcome = ctx.sms.deliver(&recipient.phone, &body).await;
            let sent_at = ctx.sys.now();

            // One record per (appointment, recipient) pair in the batch; the
            // conflict no-op absorbs the ones another firing already wrote.
            for appointment in &appointments {
                let record = ReminderRecord {
                    appointment_id: appointment.id.clone(),
                    kind: self.kind,
                    recipient_id: recipient.id.clone(),
                    phone: recipient.phone.clone(),
                    status: outcome.status(),
                    message_sid: outcome.message_sid(),
                    error: outcome.error(),
                    remind_at: appointment.scheduled_at,
                    sent_at,
                };
                if let Err(e) = ctx.repos.reminder_log.record_attempt(&record).await {
                    error!(
                        appointment_id = %appointment.id,
                        recipient_id = %recipient.id,
                        kind = %self.kind,
                        error = %e,
                        "Could not record the reminder attempt"
                    );
                }
            }

            let result = match outcome {
                DeliveryOutcome::Sent { sid } => RecipientResult::Sent { sid },
                DeliveryOutcome::Failed { error } => RecipientResult::Failed { error },
            };
            outcomes.push(RecipientOutcome {
                recipient_id: recipient.id,
                phone: recipient.phone,
                result,
            });
        }

        Ok(SendRemindersResponse::Dispatched {
            window,
            appointments: appointments.len(),
            outcomes,
        })
    }
}

#[derive(Debug)]
pub enum TriggerRun {
    Completed(SendRemindersResponse),
    /// A firing of the same kind is still in flight; this one was skipped.
    AlreadyRunning,
    /// The firing aborted before any send was attempted.
    Aborted(UseCaseError),
}

/// The single entry point for firing a trigger, shared by the timer jobs and
/// the administrative surface. Claims the per-kind in-flight guard, executes
/// the usecase and records the outcome in the scheduler stats.
pub async fn run_trigger(
    kind: ReminderKind,
    ctx: &VarselContext,
    state: &SchedulerState,
) -> TriggerRun {
    let _guard = match state.try_begin(kind) {
        Ok(guard) => guard,
        Err(_) => {
            warn!(%kind, "Skipping firing: the previous run of this kind is still in flight");
            return TriggerRun::AlreadyRunning;
        }
    };

    let result = execute(SendRemindersUseCase { kind }, ctx).await;
    let at = ctx.sys.now();
    match result {
        Ok(response) => {
            let (sent, errors) = response.counters();
            state.record_run(kind, at, sent, errors);
            TriggerRun::Completed(response)
        }
        Err(e) => {
            state.record_aborted(kind, at);
            TriggerRun::Aborted(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::Oslo;
    use chrono_tz::Tz;
    use std::sync::Arc;
    use varsel_domain::{Appointment, AppointmentStatus, DeliveryStatus};
    use varsel_infra::{
        DeliveryService, FakeSmsGateway, ISys, InMemoryAppointmentRepo, InMemoryRecipientRepo,
        InMemoryReminderLogRepo, SmsError, VarselContext,
    };

    struct StaticSys(DateTime<Utc>);
    impl ISys for StaticSys {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct TestContext {
        ctx: VarselContext,
        gateway: Arc<FakeSmsGateway>,
        appointments: Arc<InMemoryAppointmentRepo>,
        recipients: Arc<InMemoryRecipientRepo>,
        reminder_log: Arc<InMemoryReminderLogRepo>,
    }

    fn setup(now: DateTime<Utc>, tz: Tz) -> TestContext {
        let gateway = Arc::new(FakeSmsGateway::new());
        let appointments = Arc::new(InMemoryAppointmentRepo::new());
        let recipients = Arc::new(InMemoryRecipientRepo::new());
        let reminder_log = Arc::new(InMemoryReminderLogRepo::new());

        let mut ctx = VarselContext::create_inmemory();
        ctx.repos.appointments = appointments.clone();
        ctx.repos.recipients = recipients.clone();
        ctx.repos.reminder_log = reminder_log.clone();
        ctx.sms = Arc::new(DeliveryService::new(gateway.clone()));
        ctx.sys = Arc::new(StaticSys(now));
        ctx.config.timezone = tz;
        ctx.config.one_hour_tolerance_mins = 5;

        TestContext {
            ctx,
            gateway,
            appointments,
            recipients,
            reminder_log,
        }
    }

    fn appointment_at(name: &str, scheduled_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Default::default(),
            customer_name: name.into(),
            customer_phone: "+4791112233".into(),
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
            interests: Vec::new(),
        }
    }

    fn recipient(phone: &str) -> varsel_domain::Recipient {
        varsel_domain::Recipient {
            id: Default::default(),
            phone: phone.into(),
            opt_in: true,
        }
    }

    /// Day-before firing during the week the US switches to DST.
    fn setup_jane_doe() -> TestContext {
        // 2025-03-08 16:00 EST
        let now = Utc.with_ymd_and_hms(2025, 3, 8, 21, 0, 0).unwrap();
        let test = setup(now, New_York);
        // 2025-03-09 14:00 EDT: the day after the spring-forward transition
        let jane = appointment_at(
            "Jane Doe",
            Utc.with_ymd_and_hms(2025, 3, 9, 18, 0, 0).unwrap(),
        );
        test.appointments.insert(&jane);
        test.recipients.insert(&recipient("99887766"));
        test
    }

    #[tokio::test]
    async fn day_before_sends_one_reminder_with_the_zone_converted_time() {
        let test = setup_jane_doe();

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        let calls = test.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "+4799887766");
        assert!(calls[0].1.contains("Jane Doe"));
        assert!(calls[0].1.contains("14:00"));

        let records = test.reminder_log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DeliveryStatus::Sent);
        assert_eq!(records[0].kind, ReminderKind::DayBefore);
        assert_eq!(
            records[0].remind_at,
            Utc.with_ymd_and_hms(2025, 3, 9, 18, 0, 0).unwrap()
        );

        match response {
            SendRemindersResponse::Dispatched {
                appointments,
                outcomes,
                ..
            } => {
                assert_eq!(appointments, 1);
                assert_eq!(outcomes.len(), 1);
                assert!(matches!(outcomes[0].result, RecipientResult::Sent { .. }));
            }
            other => panic!("Expected a dispatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn an_immediate_second_firing_sends_and_records_nothing() {
        let test = setup_jane_doe();
        let usecase = || SendRemindersUseCase {
            kind: ReminderKind::DayBefore,
        };

        execute(usecase(), &test.ctx).await.unwrap();
        let response = execute(usecase(), &test.ctx).await.unwrap();

        assert_eq!(test.gateway.calls().len(), 1);
        assert_eq!(test.reminder_log.records().len(), 1);
        match response {
            SendRemindersResponse::Dispatched { outcomes, .. } => {
                assert_eq!(outcomes[0].result, RecipientResult::Skipped);
            }
            other => panic!("Expected a dispatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_window_is_nothing_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        let test = setup(now, Oslo);
        test.recipients.insert(&recipient("99887766"));

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayOf,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        assert!(matches!(response, SendRemindersResponse::NothingDue));
        assert!(test.gateway.calls().is_empty());
        assert!(test.reminder_log.records().is_empty());
    }

    #[tokio::test]
    async fn permanent_rejection_writes_a_failed_record_without_retry() {
        let test = setup_jane_doe();
        test.gateway.enqueue(Err(SmsError::Rejected {
            code: 21211,
            message: "Invalid 'To' number".into(),
        }));

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        assert_eq!(test.gateway.calls().len(), 1);
        let records = test.reminder_log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DeliveryStatus::Failed);
        assert!(records[0].error.as_ref().unwrap().contains("21211"));
        assert_eq!(response.counters(), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_and_do_not_count_as_errors() {
        let test = setup_jane_doe();
        test.gateway
            .enqueue(Err(SmsError::Transport("connection reset".into())));
        test.gateway
            .enqueue(Err(SmsError::Transport("connection reset".into())));
        test.gateway.enqueue_ok("SM3");

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        assert_eq!(test.gateway.calls().len(), 3);
        let records = test.reminder_log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DeliveryStatus::Sent);
        assert_eq!(records[0].message_sid, Some("SM3".into()));
        // Retries are invisible in the counters
        assert_eq!(response.counters(), (1, 0));
    }

    #[tokio::test]
    async fn unreachable_ledger_skips_rather_than_risking_duplicates() {
        let test = setup_jane_doe();
        test.reminder_log.set_unavailable(true);

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        assert!(test.gateway.calls().is_empty());
        match response {
            SendRemindersResponse::Dispatched { outcomes, .. } => {
                assert_eq!(outcomes[0].result, RecipientResult::Skipped);
            }
            other => panic!("Expected a dispatch, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_batch_sends_one_message_and_one_record_per_pair() {
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 15, 0, 0).unwrap();
        let test = setup(now, Oslo);
        // Two appointments tomorrow, two opted-in recipients
        test.appointments.insert(&appointment_at(
            "Jane Doe",
            Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap(),
        ));
        test.appointments.insert(&appointment_at(
            "Ola Nordmann",
            Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        ));
        test.recipients.insert(&recipient("99887766"));
        test.recipients.insert(&recipient("91112233"));

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        let calls = test.gateway.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.starts_with("2 appointments tomorrow:"));
        assert_eq!(test.reminder_log.records().len(), 4);
        assert_eq!(response.counters(), (2, 0));
    }

    #[tokio::test]
    async fn a_recipient_with_all_pairs_recorded_is_skipped_entirely() {
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 15, 0, 0).unwrap();
        let test = setup(now, Oslo);
        let jane = appointment_at(
            "Jane Doe",
            Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap(),
        );
        test.appointments.insert(&jane);
        let caught_up = recipient("99887766");
        let behind = recipient("91112233");
        test.recipients.insert(&caught_up);
        test.recipients.insert(&behind);

        // An earlier firing already reached the first recipient
        test.ctx
            .repos
            .reminder_log
            .record_attempt(&ReminderRecord {
                appointment_id: jane.id.clone(),
                kind: ReminderKind::DayBefore,
                recipient_id: caught_up.id.clone(),
                phone: caught_up.phone.clone(),
                status: DeliveryStatus::Sent,
                message_sid: Some("SM1".into()),
                error: None,
                remind_at: jane.scheduled_at,
                sent_at: now,
            })
            .await
            .unwrap();

        let response = execute(
            SendRemindersUseCase {
                kind: ReminderKind::DayBefore,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        let calls = test.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "+4791112233");
        assert_eq!(test.reminder_log.records().len(), 2);
        assert_eq!(response.counters(), (1, 0));
    }

    #[tokio::test]
    async fn one_hour_window_honors_the_tolerance_band() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        let test = setup(now, Oslo);
        // 58 minutes ahead: inside [55, 65]
        test.appointments
            .insert(&appointment_at("Inside", now + Duration::minutes(58)));
        // 70 minutes ahead: outside
        test.appointments
            .insert(&appointment_at("Outside", now + Duration::minutes(70)));
        test.recipients.insert(&recipient("99887766"));

        execute(
            SendRemindersUseCase {
                kind: ReminderKind::OneHour,
            },
            &test.ctx,
        )
        .await
        .unwrap();

        let calls = test.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("Inside"));
        assert!(!calls[0].1.contains("Outside"));
    }

    #[tokio::test]
    async fn run_trigger_records_stats_and_reports_aborts() {
        let test = setup_jane_doe();
        let state = SchedulerState::new();

        let run = run_trigger(ReminderKind::DayBefore, &test.ctx, &state).await;
        assert!(matches!(run, TriggerRun::Completed(_)));
        let snapshot = state.snapshot();
        assert_eq!((snapshot.sent, snapshot.errors), (1, 0));

        test.appointments.set_unavailable(true);
        let run = run_trigger(ReminderKind::DayBefore, &test.ctx, &state).await;
        assert!(matches!(run, TriggerRun::Aborted(UseCaseError::AppointmentLookup(_))));
        let snapshot = state.snapshot();
        assert_eq!((snapshot.sent, snapshot.errors), (1, 1));
    }
}
