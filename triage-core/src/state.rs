use crate::filter::FilterState;
use serde::{Deserialize, Serialize};
use triage_contract::{IncidentDetail, IncidentSummary, KpiSnapshot, PostmortemPayload};

/// Where a served postmortem came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheProvenance {
    /// The backend did not report a cache flag.
    #[default]
    Unknown,
    Cached,
    Fresh,
}

impl CacheProvenance {
    pub fn from_flag(cached: Option<bool>) -> Self {
        match cached {
            Some(true) => CacheProvenance::Cached,
            Some(false) => CacheProvenance::Fresh,
            None => CacheProvenance::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CacheProvenance::Unknown => "unknown",
            CacheProvenance::Cached => "cached",
            CacheProvenance::Fresh => "generated",
        }
    }
}

/// Postmortem as shown for a selection. `order_id` is the id the request was
/// issued for, which a late response may no longer match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmortemResult {
    pub order_id: String,
    pub text: String,
    pub provenance: CacheProvenance,
    pub model: Option<String>,
}

impl PostmortemResult {
    pub fn from_payload(order_id: impl Into<String>, payload: PostmortemPayload) -> Self {
        Self {
            order_id: order_id.into(),
            text: payload.postmortem.unwrap_or_default(),
            provenance: CacheProvenance::from_flag(payload.cached),
            model: payload.model,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Busy {
    List,
    Detail,
    Postmortem,
    Kpis,
    Refresh,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyFlags {
    pub list: bool,
    pub detail: bool,
    pub postmortem: bool,
    pub kpis: bool,
    pub refresh: bool,
}

impl BusyFlags {
    pub fn get(&self, which: Busy) -> bool {
        match which {
            Busy::List => self.list,
            Busy::Detail => self.detail,
            Busy::Postmortem => self.postmortem,
            Busy::Kpis => self.kpis,
            Busy::Refresh => self.refresh,
        }
    }

    pub fn set(&mut self, which: Busy, value: bool) {
        let slot = match which {
            Busy::List => &mut self.list,
            Busy::Detail => &mut self.detail,
            Busy::Postmortem => &mut self.postmortem,
            Busy::Kpis => &mut self.kpis,
            Busy::Refresh => &mut self.refresh,
        };
        *slot = value;
    }

    pub fn any(&self) -> bool {
        self.list || self.detail || self.postmortem || self.kpis || self.refresh
    }
}

/// Everything a dashboard renders, owned by one controller session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub incidents: Vec<IncidentSummary>,
    pub filter: FilterState,
    pub selected_order_id: Option<String>,
    pub selected_detail: Option<IncidentDetail>,
    pub postmortem: Option<PostmortemResult>,
    pub kpis: Option<KpiSnapshot>,
    pub busy: BusyFlags,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn selected_summary(&self) -> Option<&IncidentSummary> {
        let id = self.selected_order_id.as_deref()?;
        self.incidents.iter().find(|row| row.order_id == id)
    }

    /// Drops selection and everything scoped to it.
    pub(crate) fn clear_selection(&mut self) {
        self.selected_order_id = None;
        self.selected_detail = None;
        self.postmortem = None;
    }
}
