use crate::api::IncidentApi;
use crate::error::FetchFailure;
use crate::filter::{FilterUpdate, ListQuery};
use crate::state::{Busy, CacheProvenance, PostmortemResult, SessionState};
use std::future::Future;
use std::rc::Rc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use triage_contract::{validate_incident_list, validate_kpi_snapshot};

/// Outcome of [`TriageController::get_postmortem`] when no request failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostmortemDispatch {
    /// Nothing selected; no request was issued.
    NoSelection,
    Loaded(CacheProvenance),
}

/// KPI and list reload results, each independent of the other.
#[derive(Debug)]
pub struct ReloadOutcome {
    pub kpis: Result<(), FetchFailure>,
    pub incidents: Result<usize, FetchFailure>,
}

impl ReloadOutcome {
    pub fn is_ok(&self) -> bool {
        self.kpis.is_ok() && self.incidents.is_ok()
    }
}

#[derive(Debug)]
pub struct RefreshReport {
    /// Row count the backend reported, when its receipt was readable.
    pub refreshed: Option<u64>,
    pub reload: ReloadOutcome,
}

/// Orchestrates list, selection, postmortem, KPI and refresh requests over one
/// session state.
///
/// Cloning yields another handle to the same session. Handles are `!Send`;
/// spawned work (filter-triggered reloads) needs a `tokio::task::LocalSet`.
pub struct TriageController<A> {
    api: Rc<A>,
    state: Rc<watch::Sender<SessionState>>,
}

impl<A> Clone for TriageController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            state: Rc::clone(&self.state),
        }
    }
}

impl<A> TriageController<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api: Rc::new(api),
            state: Rc::new(state),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Reads the state in place. `f` must not call back into the controller.
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.last_error = None);
    }

    pub fn clear_selection(&self) {
        self.state.send_modify(SessionState::clear_selection);
    }

    fn record_failure(&self, operation: &str, failure: &FetchFailure) {
        warn!(operation, error = %failure, "request failed");
        let message = format!("{operation}: {failure}");
        self.state.send_modify(|s| s.last_error = Some(message));
    }
}

impl<A: IncidentApi + 'static> TriageController<A> {
    /// Applies a partial filter update. An update carrying `only_failed`
    /// spawns exactly one list reload with the filter as of this call, and
    /// returns its handle.
    ///
    /// # Panics
    ///
    /// When the update triggers a reload outside a `LocalSet`.
    pub fn set_filter(&self, update: FilterUpdate) -> Option<JoinHandle<()>> {
        let mut query = None;
        self.state.send_modify(|s| {
            s.filter.apply(&update);
            if update.triggers_reload() {
                query = Some(s.filter.query());
            }
        });

        let query = query?;
        debug!(status = ?query.status, search = ?query.search, "filter change reloads list");
        let this = self.clone();
        Some(tokio::task::spawn_local(async move {
            // Failures are already recorded in the session.
            let _ = this.fetch_incidents(query).await;
        }))
    }

    /// Reloads the incident list with the current filter, replacing the rows
    /// wholesale on success.
    pub async fn load_incidents(&self) -> Result<usize, FetchFailure> {
        let query = self.state.borrow().filter.query();
        self.fetch_incidents(query).await
    }

    async fn fetch_incidents(&self, query: ListQuery) -> Result<usize, FetchFailure> {
        let _busy = BusyGuard::enter(&self.state, Busy::List);
        let rows = match self.api.list_incidents(&query).await {
            Ok(rows) => rows,
            Err(failure) => {
                self.record_failure("load incidents", &failure);
                return Err(failure);
            }
        };

        if let Err(violation) = validate_incident_list(&rows) {
            warn!(%violation, "incident list failed contract check");
        }
        let count = rows.len();
        self.state.send_modify(|s| s.incidents = rows);
        info!(rows = count, status = ?query.status, search = ?query.search, "incident list loaded");
        Ok(count)
    }

    pub async fn load_kpis(&self) -> Result<(), FetchFailure> {
        let _busy = BusyGuard::enter(&self.state, Busy::Kpis);
        let kpis = match self.api.kpis().await {
            Ok(kpis) => kpis,
            Err(failure) => {
                self.record_failure("load kpis", &failure);
                return Err(failure);
            }
        };

        if let Err(violation) = validate_kpi_snapshot(&kpis) {
            warn!(%violation, "kpi snapshot failed contract check");
        }
        info!(
            total = kpis.total_incidents,
            failed = kpis.failed_incidents,
            "kpis loaded"
        );
        self.state.send_modify(|s| s.kpis = Some(kpis));
        Ok(())
    }

    /// Selects an incident and loads its detail.
    ///
    /// The selection switch, including clearing the previous detail and
    /// postmortem, happens when this is called, before the returned future is
    /// polled. Re-selecting the current id fetches again.
    pub fn select(
        &self,
        order_id: &str,
    ) -> impl Future<Output = Result<(), FetchFailure>> + 'static {
        let order_id = order_id.to_string();
        self.state.send_modify(|s| {
            s.selected_order_id = Some(order_id.clone());
            s.selected_detail = None;
            s.postmortem = None;
        });
        debug!(%order_id, "incident selected");

        let this = self.clone();
        async move { this.fetch_detail(order_id).await }
    }

    async fn fetch_detail(&self, order_id: String) -> Result<(), FetchFailure> {
        let _busy = BusyGuard::enter(&self.state, Busy::Detail);
        match self.api.incident_detail(&order_id).await {
            Ok(detail) => {
                info!(%order_id, messages = detail.messages.len(), "incident detail loaded");
                self.state.send_modify(|s| s.selected_detail = Some(detail));
                Ok(())
            }
            Err(failure) => {
                self.record_failure(&format!("load incident {order_id}"), &failure);
                Err(failure)
            }
        }
    }

    /// Fetches the postmortem of the selected incident; `regenerate` bypasses
    /// the backend cache. A failure keeps whatever postmortem is shown.
    pub async fn get_postmortem(
        &self,
        regenerate: bool,
    ) -> Result<PostmortemDispatch, FetchFailure> {
        let selected = self.state.borrow().selected_order_id.clone();
        let Some(order_id) = selected else {
            debug!(regenerate, "postmortem requested without a selection");
            return Ok(PostmortemDispatch::NoSelection);
        };

        let _busy = BusyGuard::enter(&self.state, Busy::Postmortem);
        match self.api.postmortem(&order_id, regenerate).await {
            Ok(payload) => {
                let result = PostmortemResult::from_payload(order_id.as_str(), payload);
                let provenance = result.provenance;
                info!(
                    %order_id,
                    regenerate,
                    provenance = provenance.label(),
                    chars = result.text.len(),
                    "postmortem loaded"
                );
                self.state.send_modify(|s| s.postmortem = Some(result));
                Ok(PostmortemDispatch::Loaded(provenance))
            }
            Err(failure) => {
                let operation = if regenerate {
                    format!("regenerate postmortem for {order_id}")
                } else {
                    format!("load postmortem for {order_id}")
                };
                self.record_failure(&operation, &failure);
                Err(failure)
            }
        }
    }

    /// Re-ingests upstream data, then reloads KPIs and the list and drops the
    /// selection. Steps run strictly in that order. If the trigger request
    /// fails nothing else runs and the error is returned.
    pub async fn refresh_from_source(&self) -> Result<RefreshReport, FetchFailure> {
        let _busy = BusyGuard::enter(&self.state, Busy::Refresh);
        let receipt = match self.api.trigger_refresh().await {
            Ok(receipt) => receipt,
            Err(failure) => {
                self.record_failure("refresh from source", &failure);
                return Err(failure);
            }
        };
        info!(refreshed = ?receipt.refreshed, "upstream refresh accepted");

        let reload = self.reload().await;
        self.clear_selection();

        Ok(RefreshReport {
            refreshed: receipt.refreshed,
            reload,
        })
    }

    /// Initial load of a fresh session: KPIs, then the list.
    pub async fn mount(&self) -> ReloadOutcome {
        self.reload().await
    }

    async fn reload(&self) -> ReloadOutcome {
        let kpis = self.load_kpis().await;
        let incidents = self.load_incidents().await;
        ReloadOutcome { kpis, incidents }
    }
}

/// Holds a busy flag for the lifetime of one request.
struct BusyGuard {
    state: Rc<watch::Sender<SessionState>>,
    which: Busy,
}

impl BusyGuard {
    fn enter(state: &Rc<watch::Sender<SessionState>>, which: Busy) -> Self {
        state.send_modify(|s| s.busy.set(which, true));
        Self {
            state: Rc::clone(state),
            which,
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let which = self.which;
        self.state.send_modify(|s| s.busy.set(which, false));
    }
}
