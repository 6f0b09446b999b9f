use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{Router, middleware, routing::get};
use carebase_notifications::ChangeNotifier;
use carebase_storage::{DynRecordStore, RecordStore, TimeoutStore};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    handlers, middleware as app_middleware, realtime,
    service::ResourceService,
    storage_adapter::{StoreHandle, create_storage},
};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: ResourceService,
    /// Present when the realtime channel is enabled.
    pub notifier: Option<Arc<ChangeNotifier>>,
}

impl AppState {
    pub fn new(store: DynRecordStore, notifier: Option<Arc<ChangeNotifier>>) -> Self {
        let mut service = ResourceService::new(store);
        if let Some(n) = &notifier {
            service = service.with_notifier(n.clone());
        }
        Self { service, notifier }
    }
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            &cfg.api.resource_path,
            get(handlers::list_resources)
                .post(handlers::create_resource)
                // Only matched resource requests are checked; unknown paths stay 404.
                .route_layer(middleware::from_fn(app_middleware::content_negotiation)),
        );

    if cfg.realtime.enabled && state.notifier.is_some() {
        router = router.route(&cfg.realtime.path, get(realtime::realtime_handler));
    }

    router
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        // Outermost first: request id -> trace -> cors -> compression -> body limit
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = tracing::field::Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    store: Option<DynRecordStore>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            store: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use an already constructed store instead of the configured backend.
    /// It is still bounded by `storage.timeout_ms`.
    pub fn with_store(mut self, store: DynRecordStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Connects storage and assembles the router. Fails when the configured
    /// backend cannot be reached.
    pub async fn build(self) -> anyhow::Result<CarebaseServer> {
        let store = match self.store {
            Some(store) => StoreHandle::new(Arc::new(TimeoutStore::new(
                store,
                self.config.store_timeout(),
            ))),
            None => create_storage(&self.config).await?,
        };

        let notifier = self
            .config
            .realtime
            .enabled
            .then(|| {
                Arc::new(ChangeNotifier::with_capacity(
                    self.config.realtime.channel_capacity,
                ))
            });

        let state = AppState::new(store.store.clone(), notifier.clone());
        let app = build_app(&self.config, state);

        Ok(CarebaseServer {
            addr: self.addr,
            app,
            notifier,
            store,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CarebaseServer {
    addr: SocketAddr,
    app: Router,
    notifier: Option<Arc<ChangeNotifier>>,
    store: StoreHandle,
}

impl CarebaseServer {
    pub fn notifier(&self) -> Option<Arc<ChangeNotifier>> {
        self.notifier.clone()
    }

    /// Binds the configured address and serves until Ctrl+C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// drops every realtime subscriber and closes the store.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        tracing::info!(
            addr = %local,
            backend = self.store.store.backend_name(),
            realtime = self.notifier.is_some(),
            "listening on {}",
            local
        );

        let notifier = self.notifier.clone();
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                // Ends open websocket sessions so they do not hold the shutdown.
                if let Some(n) = notifier {
                    let dropped = n.clear();
                    tracing::info!(subscribers = dropped, "Realtime subscribers released");
                }
            })
            .await;

        self.store.close().await;
        result?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
