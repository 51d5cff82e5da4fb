//! Mock API server for local dashboard development.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/stats/overall` | Total and TA-eligible student counts |
//! | GET | `/api/stats/lab-distribution` | Share of students per lab |
//! | GET | `/api/students` | Generated student rows |
//! | GET | `/api/stats/trends` | Average GPA per cohort and semester |
//!
//! Routes match on the path alone: any method other than `OPTIONS` gets the
//! same JSON payload. Every other path answers 404 and any `OPTIONS` request
//! answers 204.
//! The dataset is generated once at startup and shared read-only.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use rand::Rng;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::eligibility;
use crate::generator;
use crate::models::{LabShare, OverallStats, StudentRecord, TrendPoint};
use crate::trend;

pub const DEFAULT_PORT: u16 = 9000;
pub const MOCK_STUDENT_COUNT: usize = 200;
pub const MOCK_COHORTS: [i32; 4] = [2020, 2021, 2022, 2023];

#[derive(Debug, Clone)]
pub struct MockData {
    pub overall: OverallStats,
    pub lab_distribution: Vec<LabShare>,
    pub students: Vec<StudentRecord>,
    pub trends: Vec<TrendPoint>,
}

impl MockData {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, reference_year: i32) -> Self {
        let students =
            generator::generate_students(rng, MOCK_STUDENT_COUNT, &MOCK_COHORTS, reference_year);
        let agg = eligibility::aggregate(&students);

        Self {
            overall: OverallStats {
                total_mhs: agg.total,
                eligible_mhs: agg.eligible_count,
            },
            lab_distribution: lab_distribution(),
            students,
            trends: mock_trends(),
        }
    }
}

fn lab_distribution() -> Vec<LabShare> {
    [("RPL", 35.0), ("NCC", 25.0), ("KCV", 20.0), ("AJK", 15.0), ("IGS", 5.0)]
        .into_iter()
        .map(|(label, percentage)| LabShare {
            label: label.to_string(),
            percentage,
        })
        .collect()
}

fn mock_trends() -> Vec<TrendPoint> {
    trend::dense_table(
        &MOCK_COHORTS,
        &[
            (1, &[Some(3.4), Some(3.5), Some(3.6), Some(3.55)]),
            (2, &[Some(3.45), Some(3.52), Some(3.62), Some(3.58)]),
            (3, &[Some(3.5), Some(3.55), Some(3.58), Some(3.6)]),
            (4, &[Some(3.55), Some(3.58), Some(3.55), None]),
            (5, &[Some(3.6), Some(3.6), None, None]),
            (6, &[Some(3.65), None, None, None]),
        ],
    )
}

pub type AppState = Arc<MockData>;

pub fn create_router(data: Arc<MockData>) -> Router {
    Router::new()
        .route("/api/stats/overall", any(handle_overall))
        .route("/api/stats/lab-distribution", any(handle_lab_distribution))
        .route("/api/students", any(handle_students))
        .route("/api/stats/trends", any(handle_trends))
        .fallback(handle_not_found)
        .layer(middleware::from_fn(answer_preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(data)
}

async fn answer_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    tracing::info!(method = %request.method(), uri = %request.uri(), "mock request");
    next.run(request).await
}

async fn handle_overall(State(data): State<AppState>) -> Json<OverallStats> {
    Json(data.overall)
}

async fn handle_lab_distribution(State(data): State<AppState>) -> Json<Vec<LabShare>> {
    Json(data.lab_distribution.clone())
}

async fn handle_students(State(data): State<AppState>) -> Json<Vec<StudentRecord>> {
    Json(data.students.clone())
}

async fn handle_trends(State(data): State<AppState>) -> Json<Vec<TrendPoint>> {
    Json(data.trends.clone())
}

async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
}

pub async fn serve(data: MockData, port: u16) -> anyhow::Result<()> {
    let app = create_router(Arc::new(data));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    tracing::info!(port, "mock API server listening");
    for path in [
        "/api/stats/overall",
        "/api/stats/lab-distribution",
        "/api/students",
        "/api/stats/trends",
    ] {
        tracing::info!("endpoint available: http://localhost:{port}{path}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mock API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}
