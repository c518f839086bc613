/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::access::{strategy_for, AccessStrategy};
use taskboard_shared::auth::middleware::{authenticate, resolve_tenant, AuthContext};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler by Axum's `State` extractor; all fields are
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Project visibility policy chosen by `ACCESS_MODE`
    pub access: Arc<dyn AccessStrategy>,
}

impl AppState {
    /// Builds state, picking the access strategy from the config
    pub fn new(db: PgPool, config: Config) -> Self {
        let access = strategy_for(config.access_mode);
        Self {
            db,
            config: Arc::new(config),
            access,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn access(&self) -> &dyn AccessStrategy {
        self.access.as_ref()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                         (public)
/// └── /v1/
///     ├── /auth/                          (public)
///     │   ├── POST /signup
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /organizations                  GET, POST
///     │   ├── GET  /members
///     │   └── POST /invite
///     ├── /projects                       GET, POST
///     │   └── /:id                        GET, PATCH, DELETE
///     │       ├── /members                GET, POST
///     │       ├── /statuses               GET, POST
///     │       └── /tasks                  GET
///     ├── /statuses/:id                   PATCH, DELETE
///     ├── /tasks                          POST
///     │   └── /:id                        GET, PATCH, DELETE
///     │       ├── POST /take
///     │       └── POST /assign_users
///     └── GET /priorities
/// ```
///
/// # Middleware Stack
///
/// Protected routes run the JWT layer first, then the tenant-context layer,
/// so a handler always sees a verified [`AuthContext`] in its extensions.
/// The trace layer wraps everything.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/organizations",
            get(routes::organizations::list_organizations).post(routes::organizations::create_organization),
        )
        .route("/organizations/members", get(routes::organizations::list_members))
        .route("/organizations/invite", post(routes::organizations::invite_member))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/members",
            get(routes::projects::list_members).post(routes::projects::invite_member),
        )
        .route(
            "/projects/:id/statuses",
            get(routes::statuses::list_statuses).post(routes::statuses::create_status),
        )
        .route("/projects/:id/tasks", get(routes::tasks::list_tasks))
        .route(
            "/statuses/:id",
            patch(routes::statuses::update_status).delete(routes::statuses::delete_status),
        )
        .route("/tasks", post(routes::tasks::create_task))
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/take", post(routes::tasks::take_task))
        .route("/tasks/:id/assign_users", post(routes::tasks::assign_users))
        .route("/priorities", get(routes::tasks::list_priorities))
        // layers run bottom-up: jwt, then tenant
        .layer(from_fn_with_state(state.clone(), tenant_context_layer))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Validates the bearer token and inserts the principal's [`AuthContext`]
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Verifies an asserted `X-Organization-ID` and attaches it to the context
async fn tenant_context_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication context".to_string()))?;

    let ctx = resolve_tenant(&state.db, ctx, req.headers()).await?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
