use anyhow::Context;
use serde::Serialize;
use triage_contract::IncidentSummary;
use triage_core::{FilterUpdate, IncidentApi, SessionState, TriageController};

/// Runs one command and prints its slice of the session as JSON. Each
/// invocation owns a fresh session, so a recorded `last_error` means this
/// command failed; returns `false` in that case.
pub(crate) async fn run<A: IncidentApi + 'static>(
    controller: &TriageController<A>,
    command: crate::Command,
) -> anyhow::Result<bool> {
    use crate::Command;

    match command {
        Command::Kpis => {
            let _ = controller.load_kpis().await;
            print_json(&controller.snapshot().kpis)?;
        }
        Command::Incidents { failed, search } => {
            if let Some(text) = search {
                controller.set_filter(FilterUpdate::search(text));
            }
            if let Some(reload) = controller.set_filter(FilterUpdate::only_failed(failed)) {
                reload.await.context("incident reload task failed")?;
            }
            print_json(&controller.snapshot().incidents)?;
        }
        Command::Show { order_id } => {
            let _ = controller.select(&order_id).await;
            print_json(&controller.snapshot().selected_detail)?;
        }
        Command::Postmortem {
            order_id,
            regenerate,
        } => {
            if controller.select(&order_id).await.is_ok() {
                let _ = controller.get_postmortem(regenerate).await;
                print_json(&controller.snapshot().postmortem)?;
            }
        }
        Command::Refresh => {
            if let Ok(report) = controller.refresh_from_source().await {
                let state = controller.snapshot();
                print_json(&RefreshSummary {
                    refreshed: report.refreshed,
                    incidents: state.incidents.len(),
                    kpis: state.kpis.as_ref(),
                })?;
            }
        }
        Command::Demo => {
            let _ = controller.mount().await;
            let pick = controller.with_state(|s| demo_incident(&s.incidents));
            if let Some(order_id) = pick {
                if controller.select(&order_id).await.is_ok() {
                    let _ = controller.get_postmortem(false).await;
                }
            }
            print_json(&controller.snapshot())?;
        }
    }

    Ok(report_error(&controller.snapshot()))
}

#[derive(Serialize)]
struct RefreshSummary<'a> {
    refreshed: Option<u64>,
    incidents: usize,
    kpis: Option<&'a triage_contract::KpiSnapshot>,
}

/// First failed incident, else the first row.
fn demo_incident(rows: &[IncidentSummary]) -> Option<String> {
    rows.iter()
        .find(|row| row.is_failed())
        .or_else(|| rows.first())
        .map(|row| row.order_id.clone())
}

fn report_error(state: &SessionState) -> bool {
    match &state.last_error {
        Some(message) => {
            eprintln!("error: {message}");
            false
        }
        None => true,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(order_id: &str, status: &str) -> IncidentSummary {
        IncidentSummary {
            order_id: order_id.into(),
            status: status.into(),
            ..IncidentSummary::default()
        }
    }

    #[test]
    fn demo_prefers_first_failed_incident() {
        let rows = vec![row("ORD-1", "SUCCESS"), row("ORD-2", "FAILED"), row("ORD-3", "FAILED")];
        assert_eq!(demo_incident(&rows).as_deref(), Some("ORD-2"));
    }

    #[test]
    fn demo_falls_back_to_first_row() {
        let rows = vec![row("ORD-1", "SUCCESS")];
        assert_eq!(demo_incident(&rows).as_deref(), Some("ORD-1"));
        assert_eq!(demo_incident(&[]), None);
    }

    #[test]
    fn report_error_flags_recorded_failure() {
        let mut state = SessionState::default();
        assert!(report_error(&state));
        state.last_error = Some("load kpis: HTTP 500: no detail".into());
        assert!(!report_error(&state));
    }
}
