use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::info;

use adflow::config::AppConfig;
use adflow::error::AppError;
use adflow::telemetry;
use adflow::workflows::pipeline::{
    pipeline_router, status_board, visible_projects, Actor, ActorRole, DataLinkStatus,
    EntityStore, LocationRequestStatus, LogNotifier, MemoryStore, PoiCategory, PoiId,
    PointOfInterest, Project, ProjectId, Segment, SegmentId, StatusEngine,
};

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Advertising Pipeline Orchestrator",
    about = "Track advertising project pipelines and run the edit approval workflow",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the pipeline from the command line
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Derive statuses over the bundled sample data and print a board
    Report(PipelineReportArgs),
}

#[derive(Args, Debug)]
struct PipelineReportArgs {
    /// Evaluation date for the derivation (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Show the board as a specific viewer instead of the admin view
    #[arg(long)]
    viewer: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Pipeline {
            command: PipelineCommand::Report(args),
        } => run_pipeline_report(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = Arc::new(sample_store()?);
    let notifier = Arc::new(LogNotifier);
    let engine = StatusEngine::new(config.pipeline.status_config());

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(pipeline_router(store, notifier, engine))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "advertising pipeline orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_pipeline_report(args: PipelineReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = sample_store()?;
    let engine = StatusEngine::new(config.pipeline.status_config());
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let viewer = match args.viewer {
        Some(name) => Actor {
            user_id: name.clone(),
            name,
            role: ActorRole::Sales,
        },
        None => Actor {
            user_id: "admin".to_string(),
            name: "admin".to_string(),
            role: ActorRole::Admin,
        },
    };

    let board = status_board(&store, &engine, today)?;
    let rows = visible_projects(&store, &engine, &viewer, today)?;

    println!("Pipeline board (evaluated {today})");
    println!(
        "Totals: {} projects | draft {} | waiting input {} | in progress {} | requested {} | linked {} | expiring {}",
        board.total,
        board.draft,
        board.waiting_input(),
        board.in_progress,
        board.link_requested,
        board.linked,
        board.expiring_soon,
    );

    println!(
        "\nProjects visible to {} ({})",
        viewer.name,
        viewer.role.label()
    );
    for row in &rows {
        println!(
            "- {} | {} | {} | {} ({} segments, {} POIs)",
            row.project.project_id.0,
            row.project.advertiser_name,
            row.status.label,
            row.status.reason,
            row.status.segment_count,
            row.status.poi_count,
        );
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Seed a demo store covering each pipeline stage so the report and the HTTP
/// endpoints have data to show out of the box.
fn sample_store() -> Result<MemoryStore, AppError> {
    let store = MemoryStore::default();

    store.insert_project(sample_project(
        "PRJ-0001",
        "Hokuto Beverage",
        None,
        "sato",
        None,
    ))?;

    store.insert_project(sample_project(
        "PRJ-0002",
        "Northwind Foods",
        Some("SVC-2201"),
        "sato",
        Some("tanaka"),
    ))?;
    store.insert_segment(sample_segment(
        "SEG-0201",
        "PRJ-0002",
        Some("17890"),
        DataLinkStatus::BeforeRequest,
        None,
    ))?;
    store.insert_segment(sample_segment(
        "SEG-0202",
        "PRJ-0002",
        None,
        DataLinkStatus::NotRequested,
        None,
    ))?;
    store.insert_poi(sample_poi("POI-0201", "PRJ-0002", Some("SEG-0201")))?;
    store.insert_poi(sample_poi("POI-0202", "PRJ-0002", Some("SEG-0202")))?;

    store.insert_project(sample_project(
        "PRJ-0003",
        "Sakura Motors",
        Some("SVC-1830"),
        "tanaka",
        None,
    ))?;
    let expiring = Local::now().date_naive() + chrono::Duration::days(12);
    store.insert_segment(sample_segment(
        "SEG-0301",
        "PRJ-0003",
        Some("20411"),
        DataLinkStatus::Linked,
        Some(expiring),
    ))?;
    store.insert_poi(sample_poi("POI-0301", "PRJ-0003", Some("SEG-0301")))?;

    store.insert_project(sample_project(
        "PRJ-0004",
        "Aozora Fitness",
        Some("SVC-0975"),
        "suzuki",
        Some("sato"),
    ))?;
    store.insert_segment(sample_segment(
        "SEG-0401",
        "PRJ-0004",
        Some("31544"),
        DataLinkStatus::Requested,
        None,
    ))?;
    store.insert_poi(sample_poi("POI-0401", "PRJ-0004", Some("SEG-0401")))?;

    Ok(store)
}

fn sample_project(
    id: &str,
    advertiser: &str,
    service_id: Option<&str>,
    person: &str,
    sub_person: Option<&str>,
) -> Project {
    Project {
        project_id: ProjectId(id.to_string()),
        advertiser_name: advertiser.to_string(),
        agency_name: Some("Meridian Agency".to_string()),
        appeal_point: "Store visit lift".to_string(),
        universe_service_id: service_id.map(str::to_string),
        universe_service_name: service_id.map(|_| "UNIVERSE".to_string()),
        delivery_start_date: None,
        delivery_end_date: None,
        person_in_charge: person.to_string(),
        sub_person_in_charge: sub_person.map(str::to_string),
        remarks: None,
        registered_at: Utc::now(),
    }
}

fn sample_segment(
    id: &str,
    project_id: &str,
    ads_account_id: Option<&str>,
    data_link_status: DataLinkStatus,
    expire_date: Option<NaiveDate>,
) -> Segment {
    Segment {
        segment_id: SegmentId(id.to_string()),
        project_id: ProjectId(project_id.to_string()),
        segment_name: None,
        ads_account_id: ads_account_id.map(str::to_string),
        data_link_status,
        location_request_status: LocationRequestStatus::Completed,
        data_link_request_date: None,
        segment_expire_date: expire_date,
        registered_at: Utc::now(),
    }
}

fn sample_poi(id: &str, project_id: &str, segment_id: Option<&str>) -> PointOfInterest {
    PointOfInterest {
        poi_id: PoiId(id.to_string()),
        project_id: ProjectId(project_id.to_string()),
        segment_id: segment_id.map(|value| SegmentId(value.to_string())),
        poi_name: "Flagship store".to_string(),
        address: Some("1-2-3 Chuo, Osaka".to_string()),
        latitude: Some(34.6937),
        longitude: Some(135.5023),
        category: PoiCategory::Tg,
    }
}
