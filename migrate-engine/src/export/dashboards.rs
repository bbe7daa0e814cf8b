//! Exports a dashboard and ensures every question its panels reference
//! has been exported (directly or transitively, via
//! [`QuestionExporter`]).

use migrate_client::Client;
use migrate_model::{checksum, sanitize, Dashboard};
use serde_json::Value;

use crate::error::EngineResult;
use crate::export::questions::QuestionExporter;
use crate::export::session::ExportSession;

pub struct DashboardExporter;

impl DashboardExporter {
    pub async fn export_dashboard(client: &dyn Client, session: &mut ExportSession, id: i64) -> EngineResult<()> {
        let payload = client.get_dashboard(id).await?;
        if payload.is_null() {
            tracing::warn!(dashboard_id = id, "dashboard not found on source; skipping");
            return Ok(());
        }

        let ordered_cards = panel_card_ids(&payload);
        for card_id in &ordered_cards {
            let mut chain = Vec::new();
            QuestionExporter::export_question(client, session, *card_id, &mut chain).await?;
        }

        let name = payload.get("name").and_then(Value::as_str).unwrap_or("untitled").to_string();
        let collection_id = payload.get("collection_id").and_then(Value::as_i64);
        let archived = payload.get("archived").and_then(Value::as_bool).unwrap_or(false);

        let base_dir = match collection_id {
            Some(cid) if session.is_in_scope(cid) => session.collection_path_map[&cid].clone(),
            _ => String::new(),
        };

        let file_name = sanitize::dashboard_file_name(id, &name);
        let relative_path = if base_dir.is_empty() {
            format!("dashboards/{file_name}")
        } else {
            format!("{base_dir}/dashboards/{file_name}")
        };
        let full_path = session.export_root.join(&relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::error::EngineError::other(format!("creating {}: {e}", parent.display())))?;
        }

        let mut bytes = serde_json::to_vec_pretty(&payload).map_err(|e| crate::error::EngineError::other(e.to_string()))?;
        bytes.push(b'\n');
        std::fs::write(&full_path, &bytes).map_err(|e| crate::error::EngineError::other(format!("writing {}: {e}", full_path.display())))?;
        let sum = checksum::checksum_bytes(&bytes);

        session.dashboards.push(Dashboard {
            id,
            name,
            collection_id: collection_id.filter(|cid| session.is_in_scope(*cid)),
            ordered_cards,
            file_path: relative_path,
            checksum: sum,
            archived,
        });

        Ok(())
    }
}

/// Extract the source card ids this dashboard depends on: one per
/// panel (in panel order, accepting either the legacy `ordered_cards`
/// key or the newer `dashcards` key) plus any card a parameter's
/// values-source config draws from, since such a card never appears on
/// a panel but still must be exported for the reference to resolve on
/// import.
fn panel_card_ids(dashboard: &Value) -> Vec<i64> {
    let panels = dashboard
        .get("dashcards")
        .or_else(|| dashboard.get("ordered_cards"))
        .and_then(Value::as_array);

    let mut ids: Vec<i64> = match panels {
        Some(panels) => panels.iter().filter_map(|panel| panel.get("card_id").and_then(Value::as_i64)).collect(),
        None => Vec::new(),
    };

    for parameter_card_id in parameter_values_source_card_ids(dashboard) {
        if !ids.contains(&parameter_card_id) {
            ids.push(parameter_card_id);
        }
    }

    ids
}

/// Source card ids referenced by `parameters[*].values_source_config.card_id`.
fn parameter_values_source_card_ids(dashboard: &Value) -> Vec<i64> {
    let Some(parameters) = dashboard.get("parameters").and_then(Value::as_array) else {
        return Vec::new();
    };

    parameters
        .iter()
        .filter_map(|parameter| parameter.get("values_source_config")?.get("card_id")?.as_i64())
        .collect()
}
