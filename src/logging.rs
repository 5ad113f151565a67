use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket, Route,
};

use crate::store::PollStore;

/// Per-request bookkeeping, cached on the request when it arrives.
#[derive(Debug)]
struct RequestTrace {
    /// Sequence number, wrapping at `usize::MAX`.
    id: usize,
    start: Instant,
}

impl RequestTrace {
    fn begin() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            start: Instant::now(),
        }
    }

    fn of<'r>(req: &'r Request<'_>) -> &'r Self {
        req.local_cache(Self::begin)
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// `name (uri)` for a matched route.
fn describe(route: Option<&Route>) -> String {
    match route {
        Some(Route {
            name: Some(name),
            uri,
            ..
        }) => format!("{name} ({uri})"),
        Some(route) => route.uri.to_string(),
        None => "no route".to_string(),
    }
}

/// Logs launch, shutdown and every request/response pair.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let scheme = if config.tls_enabled() { "https" } else { "http" };
        info!("Serving on {scheme}://{}:{}", config.address, config.port);
        if let Some(store) = rocket.state::<PollStore>() {
            info!("Polls are kept in the {} store", store.backend());
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let trace = RequestTrace::of(req);
        info!("->req{} {} {}", trace.id, req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let trace = RequestTrace::of(req);
        let status = res.status();
        let line = format!(
            "<-rsp{} {status} {} in {}ms",
            trace.id,
            describe(req.route()),
            trace.elapsed().as_millis()
        );
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutting down");
    }
}
