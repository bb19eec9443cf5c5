use serde::{Deserialize, Serialize};
use triage_contract::FAILED_STATUS;

/// Current list filter. `search_text` is kept as typed; trimming happens when
/// a query is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub only_failed: bool,
    pub search_text: String,
}

impl FilterState {
    pub fn apply(&mut self, update: &FilterUpdate) {
        if let Some(only_failed) = update.only_failed {
            self.only_failed = only_failed;
        }
        if let Some(text) = &update.search_text {
            self.search_text = text.clone();
        }
    }

    pub fn query(&self) -> ListQuery {
        let search = self.search_text.trim();
        ListQuery {
            status: self.only_failed.then(|| FAILED_STATUS.to_string()),
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }
}

/// Partial update for [`FilterState`]; `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub only_failed: Option<bool>,
    pub search_text: Option<String>,
}

impl FilterUpdate {
    pub fn only_failed(value: bool) -> Self {
        Self {
            only_failed: Some(value),
            search_text: None,
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            only_failed: None,
            search_text: Some(text.into()),
        }
    }

    /// Only failed-only changes reload the list; text search waits for an
    /// explicit apply.
    pub fn triggers_reload(&self) -> bool {
        self.only_failed.is_some()
    }
}

/// Query parameters for `GET /incidents`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Parameters in wire order: `status` before `search`.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.as_str()));
        }
        pairs
    }
}
