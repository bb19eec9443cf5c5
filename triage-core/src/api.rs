use crate::error::FetchFailure;
use crate::filter::ListQuery;
use std::future::Future;
use triage_contract::{
    IncidentDetail, IncidentSummary, KpiSnapshot, PostmortemPayload, RefreshReceipt,
};

/// Backend operations the controller depends on.
///
/// Futures are not required to be `Send`: the controller runs on a single
/// thread inside a `LocalSet`.
pub trait IncidentApi {
    fn list_incidents(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Vec<IncidentSummary>, FetchFailure>>;

    fn incident_detail(
        &self,
        order_id: &str,
    ) -> impl Future<Output = Result<IncidentDetail, FetchFailure>>;

    /// `regenerate` asks the backend to bypass its postmortem cache.
    fn postmortem(
        &self,
        order_id: &str,
        regenerate: bool,
    ) -> impl Future<Output = Result<PostmortemPayload, FetchFailure>>;

    fn kpis(&self) -> impl Future<Output = Result<KpiSnapshot, FetchFailure>>;

    fn trigger_refresh(&self) -> impl Future<Output = Result<RefreshReceipt, FetchFailure>>;
}
