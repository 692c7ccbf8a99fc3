//! Integration specifications for the project pipeline core.
//!
//! Scenarios drive status derivation, visibility, and the edit approval
//! workflow end-to-end through the public facade and the HTTP router, without
//! reaching into private modules.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    use adflow::workflows::pipeline::{
        Actor, ActorRole, ChangeSet, DataLinkStatus, EditRequest, EditRequestDraft,
        EditRequestService, EditTargetKind, EntityStore, FieldChange, LocationRequestStatus,
        MemoryStore, NotifyError, PoiCategory, PoiId, PointOfInterest, Project, ProjectId,
        ReviewNotifier, Segment, SegmentId,
    };

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
    }

    pub(super) fn project(id: &str, person: &str) -> Project {
        Project {
            project_id: ProjectId(id.to_string()),
            advertiser_name: "Northwind Foods".to_string(),
            agency_name: Some("Meridian Agency".to_string()),
            appeal_point: "Store visit lift".to_string(),
            universe_service_id: Some("SVC-2201".to_string()),
            universe_service_name: Some("UNIVERSE".to_string()),
            delivery_start_date: None,
            delivery_end_date: None,
            person_in_charge: person.to_string(),
            sub_person_in_charge: None,
            remarks: None,
            registered_at: Utc
                .with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
                .single()
                .expect("valid"),
        }
    }

    pub(super) fn segment(id: &str, project_id: &str, status: DataLinkStatus) -> Segment {
        Segment {
            segment_id: SegmentId(id.to_string()),
            project_id: ProjectId(project_id.to_string()),
            segment_name: None,
            ads_account_id: Some("17890".to_string()),
            data_link_status: status,
            location_request_status: LocationRequestStatus::Completed,
            data_link_request_date: None,
            segment_expire_date: None,
            registered_at: Utc
                .with_ymd_and_hms(2025, 5, 2, 9, 0, 0)
                .single()
                .expect("valid"),
        }
    }

    pub(super) fn poi(id: &str, project_id: &str, segment_id: &str) -> PointOfInterest {
        PointOfInterest {
            poi_id: PoiId(id.to_string()),
            project_id: ProjectId(project_id.to_string()),
            segment_id: Some(SegmentId(segment_id.to_string())),
            poi_name: "Flagship store".to_string(),
            address: Some("1-2-3 Chuo, Osaka".to_string()),
            latitude: Some(34.6937),
            longitude: Some(135.5023),
            category: PoiCategory::Tg,
        }
    }

    pub(super) fn sales(name: &str) -> Actor {
        Actor {
            user_id: format!("{name}@example.com"),
            name: name.to_string(),
            role: ActorRole::Sales,
        }
    }

    pub(super) fn admin() -> Actor {
        Actor {
            user_id: "admin@example.com".to_string(),
            name: "admin".to_string(),
            role: ActorRole::Admin,
        }
    }

    /// One in-progress project assigned to sato, with one segment and POI.
    pub(super) fn seeded_store() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .insert_project(project("PRJ-1", "sato"))
            .expect("seed project");
        store
            .insert_segment(segment("SEG-1", "PRJ-1", DataLinkStatus::BeforeRequest))
            .expect("seed segment");
        store
            .insert_poi(poi("POI-1", "PRJ-1", "SEG-1"))
            .expect("seed poi");
        store
    }

    pub(super) fn rename_draft(project_id: &str) -> EditRequestDraft {
        let mut changes = ChangeSet::new();
        changes.insert(
            "advertiser_name".to_string(),
            FieldChange {
                before: json!("Northwind Foods"),
                after: json!("Northwind Holdings"),
            },
        );
        EditRequestDraft {
            request_type: EditTargetKind::Project,
            target_id: project_id.to_string(),
            project_id: ProjectId(project_id.to_string()),
            requested_by: "sato@example.com".to_string(),
            request_reason: "advertiser entity was renamed".to_string(),
            changes,
        }
    }

    pub(super) fn link_segment_draft(project_id: &str, segment_id: &str) -> EditRequestDraft {
        let mut changes = ChangeSet::new();
        changes.insert(
            "data_link_status".to_string(),
            FieldChange {
                before: json!("before_request"),
                after: json!("linked"),
            },
        );
        EditRequestDraft {
            request_type: EditTargetKind::Segment,
            target_id: segment_id.to_string(),
            project_id: ProjectId(project_id.to_string()),
            requested_by: "sato@example.com".to_string(),
            request_reason: "back office confirmed the linkage".to_string(),
            changes,
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryNotifier {
        events: Arc<Mutex<Vec<EditRequest>>>,
    }

    impl MemoryNotifier {
        pub(super) fn events(&self) -> Vec<EditRequest> {
            self.events.lock().expect("lock").clone()
        }
    }

    impl ReviewNotifier for MemoryNotifier {
        fn request_created(&self, request: &EditRequest) -> Result<(), NotifyError> {
            self.events.lock().expect("lock").push(request.clone());
            Ok(())
        }
    }

    pub(super) fn build_service() -> (
        EditRequestService<MemoryStore, MemoryNotifier>,
        MemoryStore,
        Arc<MemoryNotifier>,
    ) {
        let store = seeded_store();
        let notifier = Arc::new(MemoryNotifier::default());
        let service = EditRequestService::new(Arc::new(store.clone()), notifier.clone());
        (service, store, notifier)
    }
}

mod derivation {
    use super::common::*;
    use adflow::workflows::pipeline::{
        status_board, DataLinkStatus, EntityStore, PipelineStatus, StatusEngine,
    };

    #[test]
    fn seeded_project_is_in_progress() {
        let store = seeded_store();
        let engine = StatusEngine::default();
        let projects = store.projects().expect("projects");
        let segments = store.segments().expect("segments");
        let pois = store.pois().expect("pois");

        let info = engine.derive(&projects[0], &segments, &pois, today());
        assert_eq!(info.status, PipelineStatus::InProgress);
        assert_eq!(info.segment_count, 1);
        assert_eq!(info.poi_count, 1);
    }

    #[test]
    fn status_board_reflects_store_contents() {
        let store = seeded_store();
        store
            .insert_project(project("PRJ-2", "tanaka"))
            .expect("second project");
        store
            .insert_segment(segment("SEG-2", "PRJ-2", DataLinkStatus::Linked))
            .expect("linked segment");
        store
            .insert_poi(poi("POI-2", "PRJ-2", "SEG-2"))
            .expect("poi");

        let counts =
            status_board(&store, &StatusEngine::default(), today()).expect("board builds");
        assert_eq!(counts.total, 2);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.linked, 1);
    }
}

mod approvals {
    use super::common::*;
    use adflow::workflows::pipeline::{
        EntityStore, PipelineStatus, ProjectId, SegmentId, StatusEngine, WorkflowError,
    };

    #[test]
    fn approval_round_trip_updates_entity_and_request() {
        let (service, store, notifier) = build_service();

        let request = service.create(rename_draft("PRJ-1")).expect("create");
        assert_eq!(notifier.events().len(), 1);

        let approved = service
            .approve(&request.request_id, "admin@example.com", None)
            .expect("approve");
        assert_eq!(approved.reviewed_by.as_deref(), Some("admin@example.com"));

        let stored = store
            .project(&ProjectId("PRJ-1".to_string()))
            .expect("read")
            .expect("present");
        assert_eq!(stored.advertiser_name, "Northwind Holdings");
    }

    #[test]
    fn approving_a_link_change_flips_the_derived_stage() {
        let (service, store, _) = build_service();
        let engine = StatusEngine::default();

        let request = service
            .create(link_segment_draft("PRJ-1", "SEG-1"))
            .expect("create");
        service
            .approve(&request.request_id, "admin@example.com", None)
            .expect("approve");

        let segment = store
            .segment(&SegmentId("SEG-1".to_string()))
            .expect("read")
            .expect("present");
        assert_eq!(
            segment.data_link_status,
            adflow::workflows::pipeline::DataLinkStatus::Linked
        );

        let projects = store.projects().expect("projects");
        let info = engine.derive(
            &projects[0],
            &store.segments().expect("segments"),
            &store.pois().expect("pois"),
            today(),
        );
        assert_eq!(info.status, PipelineStatus::Linked);
    }

    #[test]
    fn double_resolution_is_refused() {
        let (service, _, _) = build_service();
        let request = service.create(rename_draft("PRJ-1")).expect("create");

        service
            .reject(&request.request_id, "admin@example.com", "not needed")
            .expect("reject");

        match service.approve(&request.request_id, "admin@example.com", None) {
            Err(WorkflowError::InvalidState { status, .. }) => assert_eq!(status, "rejected"),
            other => panic!("expected invalid state, got {other:?}"),
        }
    }
}

mod visibility {
    use super::common::*;
    use adflow::workflows::pipeline::{visible_projects, StatusEngine};

    #[test]
    fn approval_widens_peer_visibility() {
        let (service, store, _) = build_service();
        let engine = StatusEngine::default();
        let peer = sales("suzuki");

        // In-progress work of another sales rep is hidden.
        let before = visible_projects(&store, &engine, &peer, today()).expect("listing");
        assert!(before.is_empty());

        let request = service
            .create(link_segment_draft("PRJ-1", "SEG-1"))
            .expect("create");
        service
            .approve(&request.request_id, "admin@example.com", None)
            .expect("approve");

        // Once linked, the same project shows up for the peer.
        let after = visible_projects(&store, &engine, &peer, today()).expect("listing");
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].project.project_id.0, "PRJ-1");
    }

    #[test]
    fn admin_sees_everything_regardless_of_stage() {
        let (_, store, _) = build_service();
        let listing = visible_projects(&store, &StatusEngine::default(), &admin(), today())
            .expect("listing");
        assert_eq!(listing.len(), 1);
    }
}

mod routing {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::common::*;
    use adflow::workflows::pipeline::{pipeline_router, StatusEngine};

    fn build_router() -> axum::Router {
        pipeline_router(
            Arc::new(seeded_store()),
            Arc::new(MemoryNotifier::default()),
            StatusEngine::default(),
        )
    }

    #[tokio::test]
    async fn listing_endpoint_filters_by_viewer() {
        let router = build_router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/pipeline/projects?name=suzuki&role=sales")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.as_array().map(Vec::len), Some(0));

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/pipeline/projects?name=sato&role=sales")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn edit_request_lifecycle_over_http() {
        let router = build_router();
        let draft = rename_draft("PRJ-1");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/pipeline/edit-requests")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&draft).expect("serialize")))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let created: Value = serde_json::from_slice(&body).expect("json");
        let request_id = created
            .get("request_id")
            .and_then(Value::as_str)
            .expect("request id")
            .to_string();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/pipeline/edit-requests")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let pending: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(pending.as_array().map(Vec::len), Some(1));

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/pipeline/edit-requests/{request_id}/withdraw"
                    ))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let withdrawn: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            withdrawn.get("status").and_then(Value::as_str),
            Some("withdrawn")
        );
    }
}
