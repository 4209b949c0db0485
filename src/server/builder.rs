//! ServerBuilder for fluent API to build HTTP servers

use super::resource::Resource;
use super::router::build_resource_routes;
use crate::config::ResourcesConfig;
use crate::core::repository::CrudRepository;
use crate::interceptor::CustomRequestHook;
use anyhow::Result;
use axum::http::Method as HttpMethod;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

struct Registration {
    prefix: String,
    resource: Resource,
    repository: Arc<dyn CrudRepository>,
}

/// Builder for creating HTTP servers with generated CRUD routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .register("/comments", comments, InMemoryRepository::new(factory))
///     .build()?;
/// ```
pub struct ServerBuilder {
    registrations: Vec<Registration>,
    custom_routes: Vec<Router>,
    cors: Option<CorsLayer>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            custom_routes: Vec::new(),
            cors: None,
        }
    }

    /// Mount a resource under `prefix`, backed by `repository`
    pub fn register(
        self,
        prefix: impl Into<String>,
        resource: Resource,
        repository: impl CrudRepository + 'static,
    ) -> Self {
        self.register_shared(prefix, resource, Arc::new(repository))
    }

    /// Mount a resource backed by a shared repository
    pub fn register_shared(
        mut self,
        prefix: impl Into<String>,
        resource: Resource,
        repository: Arc<dyn CrudRepository>,
    ) -> Self {
        self.registrations.push(Registration {
            prefix: prefix.into(),
            resource,
            repository,
        });
        self
    }

    /// Register every resource of a configuration file
    ///
    /// `repository` is called once per resource to provide its storage.
    /// The optional hook is shared by every resource.
    pub fn register_config<F>(
        mut self,
        config: &ResourcesConfig,
        hook: Option<Arc<dyn CustomRequestHook>>,
        mut repository: F,
    ) -> Result<Self>
    where
        F: FnMut(&Resource) -> Arc<dyn CrudRepository>,
    {
        for resource_config in &config.resources {
            let mut builder = resource_config.builder();
            if let Some(hook) = &hook {
                builder = builder.shared_hook(hook.clone());
            }
            let resource = builder.build()?;
            let storage = repository(&resource);
            self = self.register_shared(resource_config.prefix(), resource, storage);
        }
        Ok(self)
    }

    /// Add custom routes to the server
    ///
    /// Use this to add routes that don't fit the CRUD pattern, such as
    /// authentication endpoints or webhooks.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Apply a CORS layer to every route
    pub fn with_cors(mut self, cors: CorsLayer) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Every generated route as `(http method, path)`
    pub fn route_list(&self) -> Vec<(HttpMethod, String)> {
        self.registrations
            .iter()
            .flat_map(|registration| {
                registration
                    .resource
                    .paths(&registration.prefix)
                    .into_iter()
                    .map(|(_, http_method, path)| (http_method, path))
            })
            .collect()
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health check routes
    /// - CRUD routes for all registered resources
    /// - Custom routes
    pub fn build(self) -> Result<Router> {
        let mut app = health_routes();

        for registration in &self.registrations {
            let routes = build_resource_routes(
                &registration.prefix,
                &registration.resource,
                registration.repository.clone(),
            )?;
            tracing::info!(
                resource = %registration.resource.name(),
                prefix = %registration.prefix,
                "mounted crud routes"
            );
            app = app.merge(routes);
        }

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        let app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        Ok(match self.cors {
            Some(cors) => app.layer(cors),
            None => app,
        })
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build health check routes
fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "crudgen"
    }))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
