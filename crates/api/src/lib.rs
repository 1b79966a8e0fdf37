mod error;
mod job_schedulers;
mod reminder;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use job_schedulers::start_reminder_jobs;
use shared::state::SchedulerState;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use varsel_infra::VarselContext;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    reminder::configure_routes(cfg);
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: VarselContext) -> Result<Self, std::io::Error> {
        let state = Arc::new(SchedulerState::new());
        let (server, port) =
            Application::configure_server(context.clone(), state.clone()).await?;

        Application::start_job_schedulers(context, state);

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_job_schedulers(context: VarselContext, state: Arc<SchedulerState>) {
        start_reminder_jobs(context, state);
    }

    async fn configure_server(
        context: VarselContext,
        state: Arc<SchedulerState>,
    ) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();
            let state = state.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::from(state))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
