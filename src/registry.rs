//! Wiring of handlers, middleware and the HTTP service.

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::handlers::{
    Contact, CreatePerson, Home, Login, PostImage, ShowPerson, ShowPersonById, UpdatePerson,
};
use crate::middleware::{MetricsMiddleware, TracingMiddleware};
use crate::openapi::build_openapi;
use crate::router::Router;
use crate::routes::route_table;
use crate::server::AppService;
use std::sync::Arc;
use tracing::info;

/// Register every handler of the route table.
///
/// # Safety
///
/// Spawns one coroutine per handler; see [`Dispatcher::register_handler`].
pub unsafe fn register_all(dispatcher: &mut Dispatcher, config: &AppConfig) {
    // SAFETY: forwarded to the caller.
    unsafe {
        dispatcher.register_typed("home", Home);
        dispatcher.register_typed("create_person", CreatePerson);
        dispatcher.register_typed("show_person", ShowPerson);
        dispatcher.register_typed(
            "show_person_by_id",
            ShowPersonById::new(&config.known_person_ids),
        );
        dispatcher.register_typed("update_person", UpdatePerson);
        dispatcher.register_typed("login", Login);
        dispatcher.register_typed("contact", Contact);
        dispatcher.register_typed("post_image", PostImage);
    }
}

/// Build the complete service: router, handlers, metrics, tracing and the
/// OpenAPI document.
///
/// # Safety
///
/// Spawns the handler coroutines; see [`register_all`].
pub unsafe fn build_service(config: AppConfig) -> AppService {
    let routes = route_table();
    let openapi = build_openapi(&routes);
    let router = Router::new(routes);

    let metrics = Arc::new(MetricsMiddleware::new());
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::clone(&metrics) as _);
    // SAFETY: forwarded to the caller.
    unsafe { register_all(&mut dispatcher, &config) };

    info!(
        handlers = ?dispatcher.handler_names(),
        known_person_ids = ?config.known_person_ids,
        "Service assembled"
    );

    AppService::new(router, dispatcher, openapi, config).with_metrics(metrics)
}
