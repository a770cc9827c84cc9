//! HTTP handler functions for the KSI map UI and API.

use actix_web::{HttpResponse, web};
use ksi_map_render::html::to_html;
use ksi_map_road_models::{Dataset, RoadId};
use ksi_map_server_models::{
    ApiError, ApiHealth, ApiSession, ApiShellState, ApiView, UploadRequest, ViewQueryParams,
};
use ksi_map_shell::{ShellError, ShellState, Upload, evaluate};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/upload`
///
/// Replaces the given files, reloads both datasets and discards any
/// previous selection and view.
pub async fn upload(state: web::Data<AppState>, body: web::Json<UploadRequest>) -> HttpResponse {
    let body = body.into_inner();
    let mut session = state.session();

    for (dataset, contents, name) in [
        (Dataset::Speed, body.speed_csv, body.speed_name),
        (Dataset::Ksi, body.ksi_csv, body.ksi_name),
    ] {
        if let Some(contents) = contents {
            let name = name.unwrap_or_else(|| format!("{dataset}.csv"));
            log::info!("Received {dataset} upload '{name}' ({} bytes)", contents.len());
            session.uploads.set(dataset, Upload::new(name, contents));
        }
    }

    session.state = ShellState::from_uploads(&session.uploads);
    session.generation += 1;
    session.last_view = None;

    HttpResponse::Ok().json(ApiSession {
        generation: session.generation,
        shell: ApiShellState::from(&session.state),
    })
}

/// `GET /api/view?road=`
///
/// Evaluates a road selection. The session lock is released while the
/// route is fetched; if another upload or selection arrives meanwhile the
/// result is dropped and `409 Conflict` returned.
pub async fn view(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    let (data, generation) = {
        let mut session = state.session();
        let data = match &session.state {
            ShellState::Ready(data) => data.clone(),
            other => {
                let message = other
                    .status()
                    .map_or_else(String::new, |status| status.text);
                return HttpResponse::Conflict().json(ApiError::new(message));
            }
        };
        session.generation += 1;
        (data, session.generation)
    };

    let road = params.road.as_deref().map(RoadId::from);

    let view = match evaluate(&data, road.as_ref(), state.router.as_ref()).await {
        Ok(view) => view,
        Err(e @ ShellError::Select(_)) => {
            return HttpResponse::NotFound().json(ApiError::new(e.to_string()));
        }
        Err(e) => {
            log::error!("Failed to evaluate selection: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new(e.to_string()));
        }
    };

    let mut session = state.session();
    if session.generation != generation {
        log::debug!(
            "Discarding view for road {} (generation {generation}, now {})",
            view.road,
            session.generation
        );
        return HttpResponse::Conflict().json(ApiError::new("Superseded by a newer request"));
    }

    session.last_view = Some(view.clone());
    HttpResponse::Ok().json(ApiView::new(generation, view))
}

/// `GET /api/map?road=`
///
/// The last evaluated view as a standalone Leaflet page.
pub async fn map(state: web::Data<AppState>, params: web::Query<ViewQueryParams>) -> HttpResponse {
    let view = {
        let session = state.session();
        session.last_view.clone()
    };

    let Some(view) = view.filter(|v| {
        params
            .road
            .as_deref()
            .is_none_or(|road| v.road.as_str() == road)
    }) else {
        return HttpResponse::NotFound().json(ApiError::new("No map has been rendered"));
    };

    let Some(map) = &view.map else {
        return HttpResponse::NotFound().json(ApiError::new(
            ksi_map_render::NO_ROUTE_DATA_MESSAGE,
        ));
    };

    match to_html(map, &format!("Road {}", view.road), view.table.as_ref()) {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("Failed to render map page: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to render map"))
        }
    }
}
