//! The orchestrator: create/read/update/delete/list operations composed
//! from the schema, the discovery document, the request pipeline, and the
//! search/pagination/form state.

use crate::environment::Environment;
use crate::error::{ApiError, BindError, ErrorCode};
use crate::form::FormSync;
use crate::http::{Anonymous, Method, ReqwestTransport, RequestPipeline};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::page::PaginationState;
use crate::path;
use crate::response::{ApiEnvelope, Cursor, PageEnvelope};
use crate::root::{ApiRoot, ApiRootCache, MemoryStore};
use crate::schema::{self, NotFoundPolicy, ResourceSchema};
use crate::search::{SearchCriterion, SearchDebouncer, SearchState, DEBOUNCE_WINDOW};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Controller lifecycle. `Loading` is the only entry state; screens are
/// long-lived, so there is no terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Loading,
    Create,
    Edit,
    Listing,
}

/// Route parameters as the active route resolved them.
pub type RouteParams = BTreeMap<String, String>;

/// One controller per active screen. Owns the resource, listing, search,
/// and form state; every mutation goes through the operations below.
pub struct ResourceController {
    schema: ResourceSchema,
    environment: Environment,
    pipeline: RequestPipeline,
    root_cache: Arc<ApiRootCache>,
    notifier: Arc<dyn Notifier>,

    route_params: RouteParams,
    selected_identifiers: BTreeMap<String, String>,

    state: LifecycleState,
    is_loading: bool,
    resource: Option<Value>,
    form: FormSync,
    search: SearchState,
    pagination: PaginationState,
    api_errors: Vec<ApiError>,

    debouncer: SearchDebouncer,
    refreshes: mpsc::UnboundedReceiver<SearchCriterion>,

    /// Monotonic operation tag. A state-applying completion older than
    /// the newest issued operation is dropped, never applied.
    op_seq: u64,
}

impl ResourceController {
    /// Must be called inside a tokio runtime (the search debouncer spawns
    /// its consumer task here).
    pub fn new(
        schema: ResourceSchema,
        environment: Environment,
        pipeline: RequestPipeline,
        root_cache: Arc<ApiRootCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<ResourceController, BindError> {
        schema::validate(&schema)?;
        let form = FormSync::from_specs(&schema.fields);
        let (debouncer, refreshes) = SearchDebouncer::new(DEBOUNCE_WINDOW);
        Ok(ResourceController {
            schema,
            environment,
            pipeline,
            root_cache,
            notifier,
            route_params: RouteParams::new(),
            selected_identifiers: BTreeMap::new(),
            state: LifecycleState::Loading,
            is_loading: false,
            resource: None,
            form,
            search: SearchState::default(),
            pagination: PaginationState::default(),
            api_errors: Vec::new(),
            debouncer,
            refreshes,
            op_seq: 0,
        })
    }

    /// Production wiring: reqwest transport, anonymous identity,
    /// in-memory session store, tracing notifications.
    pub fn with_defaults(
        schema: ResourceSchema,
        environment: Environment,
    ) -> Result<ResourceController, BindError> {
        let pipeline = RequestPipeline::new(Arc::new(ReqwestTransport::new()), Arc::new(Anonymous));
        let root_cache = Arc::new(ApiRootCache::new(Arc::new(MemoryStore::default())));
        ResourceController::new(
            schema,
            environment,
            pipeline,
            root_cache,
            Arc::new(TracingNotifier),
        )
    }

    // ── screen-facing state ────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn resource(&self) -> Option<&Value> {
        self.resource.as_ref()
    }

    pub fn listing(&self) -> Option<&[Value]> {
        self.pagination.listing()
    }

    pub fn has_listing(&self) -> bool {
        self.pagination.has_listing()
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.pagination.cursor()
    }

    pub fn api_errors(&self) -> &[ApiError] {
        &self.api_errors
    }

    pub fn form(&self) -> &FormSync {
        &self.form
    }

    /// Edit one form field, marking it dirty.
    pub fn set_field(&mut self, field: &str, value: Value) {
        self.form.set(field, value);
    }

    pub fn set_route_params(&mut self, params: RouteParams) {
        self.route_params = params;
    }

    /// Track an explicitly selected identifier (e.g. the id of the row a
    /// delete or update targets).
    pub fn select_identifier(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.selected_identifiers.insert(name.into(), value.into());
    }

    pub fn unselect_identifier(&mut self, name: &str) {
        self.selected_identifiers.remove(name);
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    // ── search edits ───────────────────────────────────────────

    /// Blank criterion for a declared search field, carrying its
    /// capability set and default filter mode.
    pub fn search_criterion(&self, field: &str) -> Option<SearchCriterion> {
        self.schema.search_spec(field).map(|spec| SearchCriterion {
            field: spec.field.clone(),
            value: String::new(),
            order: None,
            filter: spec.default_filter,
            caps: spec.caps,
        })
    }

    /// Queue a search edit; a burst of edits coalesces into one listing
    /// refresh after the debounce window.
    pub fn edit_search(&self, update: SearchCriterion) {
        self.debouncer.push(update);
    }

    /// The next coalesced search refresh. Drive it back into
    /// `fetch_listing`:
    ///
    /// ```ignore
    /// while let Some(update) = controller.next_search_refresh().await {
    ///     controller.fetch_listing(Some(update)).await?;
    /// }
    /// ```
    pub async fn next_search_refresh(&mut self) -> Option<SearchCriterion> {
        self.refreshes.recv().await
    }

    // ── operations ─────────────────────────────────────────────

    /// Run the schema's on-init actions, as screen activation does.
    pub async fn activate(&mut self) -> Result<(), BindError> {
        let fetch_resource = self
            .schema
            .operations
            .resource
            .as_ref()
            .map(|spec| spec.on_init_action)
            .unwrap_or(false);
        let fetch_listing = self
            .schema
            .operations
            .listable
            .as_ref()
            .map(|spec| spec.on_init_action)
            .unwrap_or(false);

        if fetch_resource {
            self.fetch_resource().await?;
        }
        if fetch_listing {
            self.fetch_listing(None).await?;
        }
        Ok(())
    }

    /// POST the merged form-and-base payload to the create path.
    pub async fn create(&mut self) -> Result<(), BindError> {
        let api = self.resolve_root().await?;
        let resolve = match &self.schema.operations.creatable {
            Some(spec) => spec.resolve_path,
            None => return Err(BindError::NotConfigured("create")),
        };
        let template = resolve(&api).ok_or(BindError::NotConfigured("create"))?;
        let params = self.resolve_path_params(&api, false);
        if !path::resolvable(&template, &params) {
            tracing::warn!(resource = %self.schema.resource_name, template = %template, "path parameters unresolved; create skipped");
            return Ok(());
        }
        let built = path::build(&self.environment.api_base_url, &template, &params, None)?;

        let payload = self.form.create_payload(&(self.schema.base_value)());
        self.next_seq();
        let envelope = self
            .pipeline
            .execute(Method::Post, &built.url, Some(Value::Object(payload)))
            .await;

        self.report_outcome(&envelope, "create", "created");
        self.clear_value().await?;
        if let Some(hook) = &self.schema.hooks.after_create {
            hook(envelope.data.as_ref());
        }
        Ok(())
    }

    /// Issue the delete request. Goes out as a POST with an empty body:
    /// the backend's delete paths are POST endpoints.
    ///
    /// The response's error list is not inspected; success is reported
    /// unconditionally.
    pub async fn remove(&mut self) -> Result<(), BindError> {
        let api = self.resolve_root().await?;
        let resolve = match &self.schema.operations.destroyable {
            Some(spec) => spec.resolve_path,
            None => return Err(BindError::NotConfigured("delete")),
        };
        let template = resolve(&api).ok_or(BindError::NotConfigured("delete"))?;
        let params = self.resolve_path_params(&api, true);
        if !path::resolvable(&template, &params) {
            tracing::warn!(resource = %self.schema.resource_name, template = %template, "path parameters unresolved; delete skipped");
            return Ok(());
        }
        let built = path::build(&self.environment.api_base_url, &template, &params, None)?;

        self.next_seq();
        let _ = self
            .pipeline
            .execute(Method::Post, &built.url, Some(Value::Object(Map::new())))
            .await;

        self.notifier.notify(Notification::success(
            "Success!",
            format!(
                "{} has been successfully deleted.",
                self.schema.resource_name
            ),
        ));
        self.clear_value().await
    }

    /// POST a partial update. Without an explicit partial, the payload is
    /// the form's dirty-field diff.
    pub async fn update(&mut self, partial: Option<Map<String, Value>>) -> Result<(), BindError> {
        let api = self.resolve_root().await?;
        let resolve = match &self.schema.operations.updatable {
            Some(spec) => spec.resolve_path,
            None => return Err(BindError::NotConfigured("update")),
        };
        let template = resolve(&api).ok_or(BindError::NotConfigured("update"))?;
        let params = self.resolve_path_params(&api, true);
        if !path::resolvable(&template, &params) {
            tracing::warn!(resource = %self.schema.resource_name, template = %template, "path parameters unresolved; update skipped");
            return Ok(());
        }
        let built = path::build(&self.environment.api_base_url, &template, &params, None)?;

        let payload = partial.unwrap_or_else(|| self.form.diff());
        self.next_seq();
        let envelope = self
            .pipeline
            .execute(Method::Post, &built.url, Some(Value::Object(payload)))
            .await;

        self.report_outcome(&envelope, "update", "updated");
        self.clear_value().await
    }

    /// Fetch the single resource. Skipped when the schema declares a
    /// primary identifier the route does not supply (no detail to show).
    pub async fn fetch_resource(&mut self) -> Result<(), BindError> {
        let api = self.resolve_root().await?;
        let (resolve, policy) = match &self.schema.operations.resource {
            Some(spec) => (spec.resolve_path, spec.on_not_found),
            None => return Err(BindError::NotConfigured("resource")),
        };
        if let Some(primary) = (self.schema.resolve_primary_identifier)(&api) {
            if !primary.is_empty() && !self.route_params.contains_key(&primary) {
                tracing::debug!(resource = %self.schema.resource_name, "no primary identifier in route; resource fetch skipped");
                return Ok(());
            }
        }
        let template = resolve(&api).ok_or(BindError::NotConfigured("resource"))?;
        let params = self.resolve_path_params(&api, false);
        if !path::resolvable(&template, &params) {
            tracing::warn!(resource = %self.schema.resource_name, template = %template, "path parameters unresolved; resource fetch skipped");
            return Ok(());
        }
        let built = path::build(&self.environment.api_base_url, &template, &params, None)?;

        let seq = self.next_seq();
        let envelope = self.pipeline.execute(Method::Get, &built.url, None).await;
        if self.stale(seq) {
            tracing::debug!(url = %built.url, "stale resource completion dropped");
            return Ok(());
        }

        self.resource = envelope.data.clone();
        self.api_errors.extend(envelope.errors.iter().cloned());

        if envelope.has_error(ErrorCode::ResourceNotFound) {
            match policy {
                NotFoundPolicy::Error => {
                    return Err(BindError::ResourceNotFound(
                        self.schema.resource_name.clone(),
                    ))
                }
                NotFoundPolicy::TreatAsCreate => {
                    self.state = LifecycleState::Create;
                    self.form.patch(None);
                }
            }
        } else {
            self.state = LifecycleState::Edit;
            self.form.patch(envelope.data.as_ref());
        }
        Ok(())
    }

    /// Fetch the listing. Skipped on detail routes (primary identifier
    /// present) and when neither the query nor the cursor changed since
    /// the last fetch.
    pub async fn fetch_listing(
        &mut self,
        search_update: Option<SearchCriterion>,
    ) -> Result<(), BindError> {
        let api = self.resolve_root().await?;
        let resolve = match &self.schema.operations.listable {
            Some(spec) => spec.resolve_path,
            None => return Err(BindError::NotConfigured("listing")),
        };
        if let Some(primary) = (self.schema.resolve_primary_identifier)(&api) {
            if !primary.is_empty() && self.route_params.contains_key(&primary) {
                tracing::debug!(resource = %self.schema.resource_name, "detail route; listing fetch skipped");
                return Ok(());
            }
        }

        if let Some(update) = search_update {
            self.search.apply(update);
        }

        let template = resolve(&api).ok_or(BindError::NotConfigured("listing"))?;
        let params = self.resolve_path_params(&api, false);
        if !path::resolvable(&template, &params) {
            tracing::warn!(resource = %self.schema.resource_name, template = %template, "path parameters unresolved; listing fetch skipped");
            return Ok(());
        }
        let built = path::build(
            &self.environment.api_base_url,
            &template,
            &params,
            Some(&self.search),
        )?;

        if self.pagination.is_exhausted(&built.url) {
            tracing::debug!(url = %built.url, "listing unchanged; fetch skipped");
            return Ok(());
        }
        let paged_url = self.pagination.paged_path(&built.url, built.has_query);

        self.is_loading = true;
        let seq = self.next_seq();
        let envelope = self.pipeline.execute(Method::Get, &paged_url, None).await;
        if self.stale(seq) {
            tracing::debug!(url = %paged_url, "stale listing completion dropped");
            return Ok(());
        }

        self.api_errors.extend(envelope.errors.iter().cloned());

        let page = match envelope.data {
            Some(data) => match serde_json::from_value::<PageEnvelope<Value>>(data) {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(url = %paged_url, error = %err, "listing payload did not match the page envelope");
                    PageEnvelope::default()
                }
            },
            // An error round still pins the path, so identical refreshes
            // stop retrying until the query changes.
            None => PageEnvelope::default(),
        };
        self.pagination.advance(&built.url, page);

        if self.schema.operations.resource.is_none() {
            self.state = LifecycleState::Listing;
        }
        if let Some(hook) = &self.schema.hooks.after_load_listing {
            hook();
        }
        self.is_loading = false;
        Ok(())
    }

    /// Drop resource and listing state, then re-run the configured read
    /// operations. Every write ends here.
    pub async fn clear_value(&mut self) -> Result<(), BindError> {
        self.pagination.reset();
        self.resource = None;

        if self.schema.operations.listable.is_some() {
            self.fetch_listing(None).await?;
        }
        if self.schema.operations.resource.is_some() {
            self.fetch_resource().await?;
        }
        Ok(())
    }

    // ── internals ──────────────────────────────────────────────

    async fn resolve_root(&self) -> Result<ApiRoot, BindError> {
        self.root_cache
            .resolve(&self.pipeline, &self.environment.api_root_url)
            .await
    }

    /// Path parameters visible to this operation: route params named by
    /// the schema's identifier list, plus explicitly selected
    /// identifiers for operations that target a picked row.
    fn resolve_path_params(&self, api: &ApiRoot, include_selected: bool) -> BTreeMap<String, String> {
        let mut params = if include_selected {
            self.selected_identifiers.clone()
        } else {
            BTreeMap::new()
        };
        if let Some(names) = (self.schema.resolve_path_identifiers)(api) {
            for name in names {
                if let Some(value) = self.route_params.get(&name) {
                    params.insert(name, value.clone());
                }
            }
        }
        params
    }

    fn report_outcome(&mut self, envelope: &ApiEnvelope<Value>, action: &str, action_done: &str) {
        if envelope.is_success() {
            self.notifier.notify(Notification::success(
                "Success!",
                format!(
                    "{} has been successfully {}.",
                    self.schema.resource_name, action_done
                ),
            ));
        } else {
            for error in &envelope.errors {
                self.notifier.notify(Notification::error(
                    format!("Failed to {}!", action),
                    error.message.clone(),
                ));
            }
            self.api_errors.extend(envelope.errors.iter().cloned());
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.op_seq += 1;
        self.op_seq
    }

    fn stale(&self, seq: u64) -> bool {
        seq != self.op_seq
    }
}
