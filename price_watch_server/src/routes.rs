//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they pull the caller out of the request, call the
//! engine, and turn the result into JSON. Anything longer belongs in the engine.
//!
//! Every handler is async. Storage and collaborator calls are futures, so a slow catalog never blocks an actix worker
//! thread.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use price_watch_engine::{
    db_types::WatchId,
    traits::{
        AuditLog,
        Catalog,
        NotificationSink,
        OrderManagement,
        PaymentGateway,
        ReconciliationQueue,
        ShippingLabelGenerator,
        UserDirectory,
        WatchManagement,
    },
    watch_objects::ArmWatchRequest,
    PriceScanner,
    WatchFlowApi,
};

use crate::{
    data_objects::AuthorizeRequest,
    errors::ServerError,
    helpers::{Caller, ScanKey},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Storage needed by the buyer-facing routes.
pub trait WatchStore: WatchManagement + AuditLog {}
impl<T: WatchManagement + AuditLog> WatchStore for T {}

/// Storage needed to run a scan cycle.
pub trait ScanStore: WatchManagement + AuditLog + OrderManagement + ReconciliationQueue {}
impl<T: WatchManagement + AuditLog + OrderManagement + ReconciliationQueue> ScanStore for T {}

type WatchApi<B, C, U, G, N> = web::Data<WatchFlowApi<B, C, U, G, N>>;

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(authorize_payment => Post "/payments/authorize" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
/// Asks the payment gate for a hold. The returned authorization is what the caller then submits with
/// `POST /api/watches`. A declined card is a 200 with `authorized: false`.
pub async fn authorize_payment<B, C, U, G, N>(
    caller: Caller,
    body: web::Json<AuthorizeRequest>,
    api: WatchApi<B, C, U, G, N>,
) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    let AuthorizeRequest { instrument, amount } = body.into_inner();
    debug!("💻️ POST authorize {amount} for {}", caller.0);
    let outcome = api.authorize_payment(&instrument, amount).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

//----------------------------------------------   Watches  ----------------------------------------------------
route!(arm_watch => Post "/watches" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
pub async fn arm_watch<B, C, U, G, N>(
    caller: Caller,
    body: web::Json<ArmWatchRequest>,
    api: WatchApi<B, C, U, G, N>,
) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    let request = body.into_inner();
    debug!("💻️ POST arm watch on {} for {}", request.item_id, caller.0);
    let watch = api.arm(caller.0, request).await?;
    Ok(HttpResponse::Created().json(watch))
}

route!(my_watches => Get "/watches" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
pub async fn my_watches<B, C, U, G, N>(caller: Caller, api: WatchApi<B, C, U, G, N>) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    debug!("💻️ GET watches for {}", caller.0);
    let watches = api.watches_for_buyer(caller.0).await?;
    Ok(HttpResponse::Ok().json(watches))
}

route!(watch_by_id => Get "/watches/{id}" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
pub async fn watch_by_id<B, C, U, G, N>(
    caller: Caller,
    path: web::Path<i64>,
    api: WatchApi<B, C, U, G, N>,
) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    let id = WatchId::from(path.into_inner());
    debug!("💻️ GET {id} for {}", caller.0);
    let watch = api.watch(id, caller.0).await?;
    Ok(HttpResponse::Ok().json(watch))
}

route!(watch_history => Get "/watches/{id}/history" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
/// The audit trail of a watch: every price check and purchase attempt, oldest first.
pub async fn watch_history<B, C, U, G, N>(
    caller: Caller,
    path: web::Path<i64>,
    api: WatchApi<B, C, U, G, N>,
) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    let id = WatchId::from(path.into_inner());
    debug!("💻️ GET history of {id} for {}", caller.0);
    let history = api.history(id, caller.0).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(cancel_watch => Post "/watches/{id}/cancel" impl WatchStore, Catalog, UserDirectory, PaymentGateway, NotificationSink);
pub async fn cancel_watch<B, C, U, G, N>(
    caller: Caller,
    path: web::Path<i64>,
    api: WatchApi<B, C, U, G, N>,
) -> Result<HttpResponse, ServerError>
where
    B: WatchStore,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    let id = WatchId::from(path.into_inner());
    debug!("💻️ POST cancel {id} for {}", caller.0);
    let watch = api.cancel(id, caller.0).await?;
    Ok(HttpResponse::Ok().json(watch))
}

//----------------------------------------------   Scan  ----------------------------------------------------
route!(scan => Post "/scan" impl ScanStore, Catalog, UserDirectory, ShippingLabelGenerator, NotificationSink);
/// Runs one scan cycle now and returns its summary. Safe to call while the periodic worker is also scanning.
pub async fn scan<S, C, U, L, N>(
    req: HttpRequest,
    key: web::Data<ScanKey>,
    scanner: web::Data<PriceScanner<S, C, U, L, N>>,
) -> Result<HttpResponse, ServerError>
where
    S: ScanStore,
    C: Catalog,
    U: UserDirectory,
    L: ShippingLabelGenerator,
    N: NotificationSink,
{
    key.check(&req)?;
    info!("💻️ Manual scan requested");
    let summary = scanner.run_scan_cycle().await;
    Ok(HttpResponse::Ok().json(summary))
}
