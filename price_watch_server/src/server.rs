use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use price_watch_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ClaimPipeline,
    MockPreAuthGateway,
    PriceScanner,
    SqliteDatabase,
    SqliteScanner,
    WatchFlowApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::ScanKey,
    routes::{
        health,
        ArmWatchRoute,
        AuthorizePaymentRoute,
        CancelWatchRoute,
        MyWatchesRoute,
        ScanRoute,
        WatchByIdRoute,
        WatchHistoryRoute,
    },
    scan_worker::start_scan_worker,
};

type Db = SqliteDatabase;
type Gate = MockPreAuthGateway;
type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let producers = start_event_handlers().await;
    let pipeline = ClaimPipeline::new(db.clone(), db.clone(), db.clone(), db.clone(), db.clone(), producers, config.scan);
    let scanner = Arc::new(PriceScanner::new(pipeline));
    if config.disable_scan_worker {
        warn!("🕰️ The scan worker is disabled. Watches only trigger through POST /api/scan.");
    } else {
        let _worker = start_scan_worker(scanner.clone(), config.scan_interval);
    }
    let srv = create_server_instance(config, db, scanner)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

/// Hooks that surface engine events in the server log. A reconciliation anomaly is the operator alert.
pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_watch_executed(|ev| {
            Box::pin(async move {
                info!("📬️ {} bought {} for {} ({})", ev.watch.buyer_id, ev.order.item_id, ev.order.price, ev.order.id);
            }) as HookFuture
        })
        .on_watch_expired(|ev| {
            Box::pin(async move {
                debug!("📬️ {} of {} expired", ev.watch.id, ev.watch.buyer_id);
            }) as HookFuture
        })
        .on_anomaly(|ev| {
            Box::pin(async move {
                let queued = ev.anomaly.as_ref().map(|a| format!("queued as #{}", a.id));
                error!(
                    "🚨️ OPERATOR ACTION REQUIRED: {} on {} needs reconciliation ({}). {}",
                    ev.watch_id,
                    ev.item_id,
                    queued.as_deref().unwrap_or("NOT QUEUED"),
                    ev.reason
                );
            }) as HookFuture
        });
    hooks
}

async fn start_event_handlers() -> EventProducers {
    let handlers = EventHandlers::new(128, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    scanner: Arc<SqliteScanner>,
) -> Result<Server, ServerError> {
    let scan_key = ScanKey(config.scan_api_key.clone());
    let policy = config.scan.policy;
    let srv = HttpServer::new(move || {
        let watch_api = WatchFlowApi::new(db.clone(), db.clone(), db.clone(), MockPreAuthGateway::new(), db.clone(), policy);
        let api_scope = web::scope("/api")
            .service(AuthorizePaymentRoute::<Db, Db, Db, Gate, Db>::new())
            .service(ArmWatchRoute::<Db, Db, Db, Gate, Db>::new())
            .service(MyWatchesRoute::<Db, Db, Db, Gate, Db>::new())
            .service(WatchHistoryRoute::<Db, Db, Db, Gate, Db>::new())
            .service(CancelWatchRoute::<Db, Db, Db, Gate, Db>::new())
            .service(WatchByIdRoute::<Db, Db, Db, Gate, Db>::new())
            .service(ScanRoute::<Db, Db, Db, Db, Db>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pw::access_log"))
            .app_data(web::Data::new(watch_api))
            .app_data(web::Data::from(scanner.clone()))
            .app_data(web::Data::new(scan_key.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
