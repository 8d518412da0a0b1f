use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::SqliteStore;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    model::{
        api::ErrorDto,
        configuration::{
            ConfigurationDto, ConfigurationStatus, CreateConfigurationDto, DynamicSnapshotDto,
            PaginatedConfigurationsDto, RefreshSummaryDto, RouterConcurrencyDto,
            SessionInterceptorDto, UpdateConfigurationDto,
        },
        user::AccountDto,
    },
    server::{
        controller::{
            common::{self, get_ip_location, ping},
            configuration::{
                self, create_configuration, delete_configuration, get_configuration,
                get_configurations, get_current_configuration, refresh_configurations,
                update_configuration,
            },
            user::{self, get_me},
        },
        middleware::{
            client_ip::client_ip, concurrency::limit_concurrency, interceptor::intercept_http,
            ip_blocker::block_ip, route::resolve_route, router_mock::mock_router,
            session_interceptor::intercept_session, tracker::track,
        },
        routing::ApiRouter,
        state::AppState,
    },
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Gatekeeper", description = "Request interception and dynamic configuration API"),
    paths(
        common::ping,
        common::get_ip_location,
        user::get_me,
        configuration::get_configurations,
        configuration::create_configuration,
        configuration::get_configuration,
        configuration::update_configuration,
        configuration::delete_configuration,
        configuration::refresh_configurations,
        configuration::get_current_configuration,
    ),
    components(schemas(
        ErrorDto,
        AccountDto,
        ConfigurationStatus,
        ConfigurationDto,
        CreateConfigurationDto,
        UpdateConfigurationDto,
        PaginatedConfigurationsDto,
        RefreshSummaryDto,
        RouterConcurrencyDto,
        SessionInterceptorDto,
        DynamicSnapshotDto,
    )),
    tags(
        (name = "common", description = "Liveness and outbound lookups"),
        (name = "user", description = "Caller identity"),
        (name = "configuration", description = "Dynamic configuration rows and refresh"),
    )
)]
pub struct ApiDoc;

/// Declares every API route.
///
/// The returned builder records method and template of each route, which feed the
/// route resolver and the concurrency limiter.
pub fn api_router() -> ApiRouter<AppState> {
    ApiRouter::new()
        .get("/ping", ping)
        .get("/users/v1/me", get_me)
        .get("/commons/v1/ip-locations/{ip}", get_ip_location)
        .get("/configurations/v1", get_configurations)
        .post("/configurations/v1", create_configuration)
        .get("/configurations/v1/current", get_current_configuration)
        .post("/configurations/v1/refresh", refresh_configurations)
        .get("/configurations/v1/{id}", get_configuration)
        .patch("/configurations/v1/{id}", update_configuration)
        .delete("/configurations/v1/{id}", delete_configuration)
}

/// Wraps the API router in the request middleware.
///
/// Layers added to a router run after it has routed the request, so the API router is
/// mounted as the fallback of an outer router that carries the layers. A URI rewritten
/// by an interceptor script is therefore routed afresh.
///
/// # Arguments
/// - `api` - Routes returned by [`api_router`]
/// - `state` - Application state
/// - `session` - Session layer, outermost
pub fn router(
    api: Router<AppState>,
    state: AppState,
    session: SessionManagerLayer<SqliteStore>,
) -> Router {
    let api = api
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state.clone());

    Router::new()
        .fallback_service(api)
        .layer(from_fn_with_state(state.clone(), intercept_http))
        .layer(from_fn_with_state(state.clone(), intercept_session))
        .layer(from_fn_with_state(state.clone(), mock_router))
        .layer(from_fn_with_state(state.clone(), limit_concurrency))
        .layer(from_fn_with_state(state.clone(), resolve_route))
        .layer(from_fn_with_state(state.clone(), track))
        .layer(from_fn_with_state(state, block_ip))
        .layer(from_fn(client_ip))
        .layer(session)
}
