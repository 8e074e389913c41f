//! Controller scenarios over a scripted transport: activation, debounced
//! search, pagination, capability gating, not-found policies, and write
//! round-trips.

use async_trait::async_trait;
use movieship_sdk::{
    ApiRootCache, Anonymous, BindError, Environment, FilterKind, HttpTransport, LifecycleState,
    MemoryStore, Method, Notification, Notifier, NotFoundPolicy, OutboundRequest, RawReply,
    RequestPipeline, ResourceController, ResourceSchema, RouteParams, SearchCaps, SessionStore,
    Severity, TransportError,
};
use movieship_sdk::{Creatable, Destroyable, FieldSpec, Listable, Resource, SearchFieldSpec, Updatable};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTransport {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<String>) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply, TransportError> {
        self.requests.lock().unwrap().push(request);
        let body = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| r#"{"data": null, "errors": []}"#.to_string());
        Ok(RawReply { status: 200, body })
    }
}

#[derive(Default)]
struct CollectingNotifier(Mutex<Vec<Notification>>);

impl CollectingNotifier {
    fn collected(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

/// The discovery document, pre-seeded into the session store so tests
/// never spend a scripted reply on the root fetch.
fn root_document() -> String {
    json!({
        "API_ROOT": "/api/v1",
        "EXPLORE_LISTING": "/api/v1/explore",
        "EXPLORE_RESOURCE": "/api/v1/explore/<imdb_id>",
        "EXPLORE_PATH_IDENTIFIERS": ["imdb_id"],
        "EXPLORE_PRIMARY_IDENTIFIER": "imdb_id",
        "REVIEW_CREATE": "/api/v1/explore/<imdb_id>/review/create",
        "REVIEW_DELETE": "/api/v1/explore/<imdb_id>/review/delete",
        "REVIEW_LISTING": "/api/v1/explore/<imdb_id>/review/list",
        "REVIEW_RESOURCE": "/api/v1/explore/<imdb_id>/review",
        "REVIEW_UPDATE": "/api/v1/explore/<imdb_id>/review",
        "REVIEW_PATH_IDENTIFIERS": ["imdb_id"],
        "PROFILE_RESOURCE": "/api/v1/profile",
        "PROFILE_CREATE": "/api/v1/profile/create",
        "PROFILE_UPDATE": "/api/v1/profile",
    })
    .to_string()
}

fn fixture(
    schema: ResourceSchema,
    replies: Vec<String>,
) -> (
    ResourceController,
    Arc<ScriptedTransport>,
    Arc<CollectingNotifier>,
) {
    let transport = ScriptedTransport::new(replies);
    let notifier = Arc::new(CollectingNotifier::default());
    let store = Arc::new(MemoryStore::default());
    store.set("API_ROOT", &root_document());
    store.set(
        "API_TIMESTAMP",
        &chrono::Utc::now().timestamp_millis().to_string(),
    );

    let pipeline = RequestPipeline::new(transport.clone(), Arc::new(Anonymous));
    let controller = ResourceController::new(
        schema,
        Environment::new("http://api.test", "http://api.test/api/v1"),
        pipeline,
        Arc::new(ApiRootCache::new(store)),
        notifier.clone(),
    )
    .unwrap();
    (controller, transport, notifier)
}

fn explore_listing_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new("Explore");
    schema.operations.listable = Some(Listable {
        resolve_path: |api| api.template("EXPLORE_LISTING"),
        on_init_action: true,
    });
    schema.resolve_path_identifiers = |api| api.identifiers("EXPLORE_PATH_IDENTIFIERS");
    schema.resolve_primary_identifier = |api| api.template("EXPLORE_PRIMARY_IDENTIFIER");
    schema.search = vec![SearchFieldSpec {
        field: "primaryTitle".into(),
        caps: SearchCaps::all(),
        default_filter: Some(FilterKind::Like),
    }];
    schema
}

fn review_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new("Review");
    schema.operations.creatable = Some(Creatable {
        resolve_path: |api| api.template("REVIEW_CREATE"),
    });
    schema.operations.updatable = Some(Updatable {
        resolve_path: |api| api.template("REVIEW_UPDATE"),
    });
    schema.operations.destroyable = Some(Destroyable {
        resolve_path: |api| api.template("REVIEW_DELETE"),
    });
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("REVIEW_RESOURCE"),
        on_not_found: NotFoundPolicy::TreatAsCreate,
        on_init_action: true,
    });
    schema.resolve_path_identifiers = |api| api.identifiers("REVIEW_PATH_IDENTIFIERS");
    schema.fields.insert(
        "comment".into(),
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: true,
            enable_update: true,
        },
    );
    schema.fields.insert(
        "rating".into(),
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: true,
            enable_update: true,
        },
    );
    schema
}

fn page_body(ids: &[&str], next: Option<&str>) -> String {
    let cursor = match next {
        Some(next) => json!({"next": next, "previous": ""}),
        None => Value::Null,
    };
    json!({
        "data": {
            "page": ids.iter().map(|id| json!({"imdb_id": id, "primaryTitle": id})).collect::<Vec<_>>(),
            "cursor": cursor,
        },
        "errors": [],
    })
    .to_string()
}

fn route(entries: &[(&str, &str)]) -> RouteParams {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// Scenario A: activation of a listable-on-init schema issues one listing
// GET and populates listing and cursor.
#[tokio::test]
async fn activation_populates_the_listing() {
    let (mut controller, transport, _) = fixture(
        explore_listing_schema(),
        vec![page_body(&["tt1", "tt2"], Some("c1"))],
    );

    controller.activate().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, "http://api.test/api/v1/explore");
    assert_eq!(controller.listing().unwrap().len(), 2);
    assert_eq!(controller.cursor().unwrap().next, "c1");
    assert_eq!(controller.state(), LifecycleState::Listing);
}

// Scenario B: a burst of like-filter edits debounces into a single GET
// carrying the last value.
#[tokio::test(start_paused = true)]
async fn debounced_search_issues_one_filtered_fetch() {
    let (mut controller, transport, _) =
        fixture(explore_listing_schema(), vec![page_body(&["tt9"], None)]);

    let criterion = controller.search_criterion("primaryTitle").unwrap();
    for value in ["m", "ma", "matrix"] {
        let mut edit = criterion.clone();
        edit.value = value.into();
        controller.edit_search(edit);
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    tokio::time::advance(Duration::from_millis(600)).await;

    let update = controller.next_search_refresh().await.unwrap();
    assert_eq!(update.value, "matrix");
    controller.fetch_listing(Some(update)).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "http://api.test/api/v1/explore?sl=primaryTitle:matrix"
    );
}

// Scenario C: an operation without its capability fails before any
// network call.
#[tokio::test]
async fn create_without_capability_is_fatal_and_networkless() {
    let (mut controller, transport, _) = fixture(explore_listing_schema(), vec![]);

    let err = controller.create().await.unwrap_err();
    assert!(matches!(err, BindError::NotConfigured("create")));
    assert!(transport.requests().is_empty());
}

// Scenario D: a not-found resource under TreatAsCreate flips to create
// mode with blank fields and no notification.
#[tokio::test]
async fn not_found_with_treat_as_create_enters_create_mode() {
    let not_found = json!({
        "data": null,
        "errors": [{"code": 2, "message": "no review yet"}],
    })
    .to_string();
    let (mut controller, _, notifier) = fixture(review_schema(), vec![not_found]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    controller.fetch_resource().await.unwrap();

    assert_eq!(controller.state(), LifecycleState::Create);
    assert_eq!(controller.form().get("comment").unwrap(), &json!(""));
    assert_eq!(controller.form().get("rating").unwrap(), &json!(""));
    assert!(notifier.collected().is_empty());
}

#[tokio::test]
async fn not_found_with_error_policy_is_fatal() {
    let mut schema = review_schema();
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("REVIEW_RESOURCE"),
        on_not_found: NotFoundPolicy::Error,
        on_init_action: true,
    });
    let not_found = json!({
        "data": null,
        "errors": [{"code": 2, "message": "no review yet"}],
    })
    .to_string();
    let (mut controller, _, _) = fixture(schema, vec![not_found]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    let err = controller.fetch_resource().await.unwrap_err();
    assert!(matches!(err, BindError::ResourceNotFound(_)));
}

#[tokio::test]
async fn found_resource_enters_edit_mode_and_patches_the_form() {
    let found = json!({
        "data": {"comment": "great", "rating": 9},
        "errors": [],
    })
    .to_string();
    let (mut controller, _, _) = fixture(review_schema(), vec![found]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    controller.fetch_resource().await.unwrap();

    assert_eq!(controller.state(), LifecycleState::Edit);
    assert_eq!(controller.form().get("comment").unwrap(), &json!("great"));
    assert!(!controller.form().is_dirty());
}

// A primary identifier on the route means a detail screen: listing is
// skipped. Without it, the single-resource fetch is skipped instead.
#[tokio::test]
async fn primary_identifier_routes_detail_vs_listing() {
    let mut schema = explore_listing_schema();
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("EXPLORE_RESOURCE"),
        on_not_found: NotFoundPolicy::Error,
        on_init_action: true,
    });
    let detail = json!({"data": {"imdb_id": "tt1"}, "errors": []}).to_string();
    let (mut controller, transport, _) = fixture(schema, vec![detail]);
    controller.set_route_params(route(&[("imdb_id", "tt1")]));

    controller.activate().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1, "listing must be skipped on detail routes");
    assert_eq!(requests[0].url, "http://api.test/api/v1/explore/tt1");
    assert_eq!(controller.state(), LifecycleState::Edit);
}

// Idempotence: an unchanged query with an exhausted cursor does not
// refetch.
#[tokio::test]
async fn unchanged_listing_is_fetched_exactly_once() {
    let (mut controller, transport, _) =
        fixture(explore_listing_schema(), vec![page_body(&["tt1"], None)]);

    controller.fetch_listing(None).await.unwrap();
    controller.fetch_listing(None).await.unwrap();

    assert_eq!(transport.requests().len(), 1);
    assert_eq!(controller.listing().unwrap().len(), 1);
}

// Infinite scroll: a pending cursor on the same query appends the token
// and merges the page; a query change replaces the listing.
#[tokio::test]
async fn cursor_pages_merge_and_query_changes_replace() {
    let (mut controller, transport, _) = fixture(
        explore_listing_schema(),
        vec![
            page_body(&["tt1", "tt2"], Some("c1")),
            page_body(&["tt3"], Some("c2")),
            page_body(&["tt9"], None),
        ],
    );

    controller.fetch_listing(None).await.unwrap();
    controller.fetch_listing(None).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].url, "http://api.test/api/v1/explore?p=c1");
    assert_eq!(controller.listing().unwrap().len(), 3);

    let mut update = controller.search_criterion("primaryTitle").unwrap();
    update.value = "matrix".into();
    controller.fetch_listing(Some(update)).await.unwrap();

    let requests = transport.requests();
    assert_eq!(
        requests[2].url,
        "http://api.test/api/v1/explore?sl=primaryTitle:matrix"
    );
    assert_eq!(controller.listing().unwrap().len(), 1, "query change replaces");
}

#[tokio::test]
async fn create_posts_merged_payload_then_reloads() {
    let created = json!({
        "data": {"_id": "w1", "title": "noir"},
        "errors": [],
    })
    .to_string();
    let reload = json!({"data": null, "errors": []}).to_string();
    let captured: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let mut schema = review_schema();
    let slot = captured.clone();
    schema.hooks.after_create = Some(Box::new(move |resource| {
        let id = resource
            .and_then(|r| r.get("_id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        *slot.lock().unwrap() = id;
    }));
    schema.base_value = Box::new(|| {
        let mut base = serde_json::Map::new();
        base.insert("imdb_id".into(), json!("tt0133093"));
        base
    });

    let (mut controller, transport, notifier) = fixture(schema, vec![created, reload]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));
    controller.set_field("comment", json!("great"));

    controller.create().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(
        requests[0].url,
        "http://api.test/api/v1/explore/tt0133093/review/create"
    );
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["comment"], json!("great"));
    assert_eq!(body["imdb_id"], json!("tt0133093"));

    let notifications = notifier.collected();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Success);
    assert_eq!(captured.lock().unwrap().as_deref(), Some("w1"));
    // clear-and-reload re-ran the configured resource fetch
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn create_surfaces_each_application_error() {
    let conflict = json!({
        "data": null,
        "errors": [
            {"code": 4, "message": "already reviewed"},
            {"code": 3, "message": "profile not valid"},
        ],
    })
    .to_string();
    let (mut controller, _, notifier) = fixture(review_schema(), vec![conflict]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    controller.create().await.unwrap();

    let notifications = notifier.collected();
    assert_eq!(notifications.len(), 2);
    assert!(notifications
        .iter()
        .all(|n| n.severity == Severity::Error && n.summary == "Failed to create!"));
    assert_eq!(controller.api_errors().len(), 2);
}

#[tokio::test]
async fn update_defaults_to_the_dirty_field_diff() {
    let found = json!({
        "data": {"comment": "great", "rating": 9},
        "errors": [],
    })
    .to_string();
    let updated = json!({"data": {"comment": "fine"}, "errors": []}).to_string();
    let (mut controller, transport, notifier) =
        fixture(review_schema(), vec![found, updated]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    controller.fetch_resource().await.unwrap();
    controller.set_field("comment", json!("fine"));
    controller.update(None).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(
        requests[1].url,
        "http://api.test/api/v1/explore/tt0133093/review"
    );
    assert_eq!(
        requests[1].body.as_ref().unwrap(),
        &json!({"comment": "fine"})
    );
    assert_eq!(notifier.collected().len(), 1);
}

// Delete reports success without inspecting the reply, and goes out as a
// POST with an empty body.
#[tokio::test]
async fn remove_always_reports_success() {
    let failure = json!({
        "data": null,
        "errors": [{"code": 0, "message": "boom"}],
    })
    .to_string();
    let (mut controller, transport, notifier) = fixture(review_schema(), vec![failure]);
    controller.set_route_params(route(&[("imdb_id", "tt0133093")]));

    controller.remove().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(
        requests[0].url,
        "http://api.test/api/v1/explore/tt0133093/review/delete"
    );
    assert_eq!(requests[0].body.as_ref().unwrap(), &json!({}));

    let notifications = notifier.collected();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Success);
}

// Selected identifiers resolve placeholders the route cannot.
#[tokio::test]
async fn selected_identifiers_feed_delete_paths() {
    let mut schema = ResourceSchema::new("Watchlist");
    schema.operations.destroyable = Some(Destroyable {
        resolve_path: |_| Some("/api/v1/watchlist/<watchlist_id>/delete".into()),
    });
    let (mut controller, transport, _) = fixture(schema, vec![]);
    controller.select_identifier("watchlist_id", "w42");

    controller.remove().await.unwrap();

    assert_eq!(
        transport.requests()[0].url,
        "http://api.test/api/v1/watchlist/w42/delete"
    );
}

// An unresolvable placeholder skips the operation instead of building a
// broken URL.
#[tokio::test]
async fn unresolvable_path_parameters_skip_the_operation() {
    let (mut controller, transport, notifier) = fixture(review_schema(), vec![]);
    // no route params: <imdb_id> cannot resolve

    controller.create().await.unwrap();

    assert!(transport.requests().is_empty());
    assert!(notifier.collected().is_empty());
}
