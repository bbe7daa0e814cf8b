//! Dashboard installer (spec §4.5). Each panel is rebuilt from scratch —
//! only position/size and visualization settings survive — rather than
//! patched in place, since panel identity on the target is meaningless.

use std::collections::{BTreeSet, HashMap};

use migrate_client::{Client, CollectionId, ItemsQuery};
use migrate_model::{Dashboard, EntityKind, Question, Report, ReportItem};
use migrate_query::rewrite_field_ref_tree;
use serde_json::{json, Value};

use crate::conflict::{ConflictStrategy, NameIndex, Resolution, DASHCARD_STRIPPED_FIELDS};
use crate::error::EngineResult;
use crate::import::loader::PackageLoader;
use crate::import::questions::classify_failure;
use crate::import::resolver::IdentityResolver;

pub struct DashboardInstaller;

impl DashboardInstaller {
    pub async fn install_all(
        client: &dyn Client,
        export_root: &std::path::Path,
        dashboards: &[Dashboard],
        questions: &[Question],
        strategy: ConflictStrategy,
        resolver: &mut IdentityResolver,
        report: &mut Report,
    ) -> EngineResult<()> {
        let questions_by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();
        let mut name_index = NameIndex::new();

        let target_scopes: BTreeSet<Option<i64>> = dashboards.iter().map(|d| d.collection_id.and_then(|cid| resolver.resolve_collection(cid))).collect();
        for scope in target_scopes {
            let collection_id = scope.map(CollectionId::Id).unwrap_or(CollectionId::Root);
            let query = ItemsQuery { models: vec!["dashboard".to_string()], archived: true };
            let items = client.get_collection_items(collection_id, &query).await?;
            for item in items.into_iter().filter(|i| i.is_dashboard()) {
                name_index.record(scope, &item.name, item.id);
            }
        }

        for dashboard in dashboards {
            let mut payload = PackageLoader::load_entity(export_root, &dashboard.file_path, &dashboard.checksum)?;

            let target_collection_id = dashboard.collection_id.and_then(|cid| resolver.resolve_collection(cid));
            let resolution = name_index.resolve(strategy, target_collection_id, &dashboard.name);

            if let Resolution::ReuseExisting { target_id } = &resolution {
                report.push(ReportItem::skipped(EntityKind::Dashboard, dashboard.id, *target_id, dashboard.name.clone()));
                continue;
            }
            let name = match &resolution {
                Resolution::Create { name } => name.clone(),
                Resolution::UpdateExisting { .. } => dashboard.name.clone(),
                Resolution::ReuseExisting { .. } => unreachable!(),
            };

            rewrite_panels(&mut payload, &questions_by_id, resolver);
            rewrite_dashboard_parameters(&mut payload, &questions_by_id, resolver);

            let update_payload = json!({
                "name": name,
                "description": payload.get("description").cloned().unwrap_or(Value::Null),
                "collection_id": target_collection_id,
                "parameters": payload.get("parameters").cloned().unwrap_or(json!([])),
                "dashcards": payload.get("dashcards").cloned().unwrap_or(json!([])),
            });

            let target_id = match resolution {
                Resolution::Create { .. } => {
                    let create_payload = json!({ "name": name, "collection_id": target_collection_id });
                    match client.create_dashboard(&create_payload).await {
                        Ok(id) => id,
                        Err(e) => {
                            report.push(classify_failure(EntityKind::Dashboard, dashboard.id, &dashboard.name, e));
                            continue;
                        }
                    }
                }
                Resolution::UpdateExisting { target_id } => target_id,
                Resolution::ReuseExisting { .. } => unreachable!(),
            };

            match client.update_dashboard(target_id, &update_payload).await {
                Ok(()) => {
                    let status = match resolution {
                        Resolution::Create { .. } => ReportItem::created(EntityKind::Dashboard, dashboard.id, target_id, name.clone()),
                        _ => ReportItem::updated(EntityKind::Dashboard, dashboard.id, target_id, name.clone()),
                    };
                    report.push(status);
                }
                Err(e) => report.push(classify_failure(EntityKind::Dashboard, dashboard.id, &dashboard.name, e)),
            }
        }

        Ok(())
    }
}

fn rewrite_panels(payload: &mut Value, questions_by_id: &HashMap<i64, &Question>, resolver: &IdentityResolver) {
    let Some(panels) = payload.get_mut("dashcards").and_then(Value::as_array_mut) else {
        return;
    };

    let mut next_temp_id = -1i64;
    let mut rewritten = Vec::with_capacity(panels.len());

    for panel in panels.drain(..) {
        let Some(card_id) = panel.get("card_id").and_then(Value::as_i64) else {
            continue;
        };
        let Some(question) = questions_by_id.get(&card_id) else {
            tracing::warn!(card_id, "dashboard panel references unknown source question; dropping");
            continue;
        };
        let Some(target_card_id) = resolver.resolve_question(card_id) else {
            tracing::warn!(card_id, "dashboard panel's question was not installed; dropping");
            continue;
        };

        let mut rebuilt = json!({
            "id": next_temp_id,
            "card_id": target_card_id,
            "col": panel.get("col").cloned().unwrap_or(Value::from(0)),
            "row": panel.get("row").cloned().unwrap_or(Value::from(0)),
            "size_x": panel.get("size_x").cloned().unwrap_or(Value::from(4)),
            "size_y": panel.get("size_y").cloned().unwrap_or(Value::from(4)),
            "visualization_settings": panel.get("visualization_settings").cloned().unwrap_or(json!({})),
        });
        next_temp_id -= 1;

        if let Some(mappings) = panel.get("parameter_mappings").and_then(Value::as_array) {
            let rewritten_mappings: Vec<Value> = mappings
                .iter()
                .filter_map(|m| rewrite_parameter_mapping(m, questions_by_id, resolver))
                .collect();
            rebuilt["parameter_mappings"] = Value::Array(rewritten_mappings);
        }

        if let Some(series) = panel.get("series").and_then(Value::as_array) {
            let rewritten_series: Vec<Value> = series
                .iter()
                .filter_map(|s| s.get("id").and_then(Value::as_i64))
                .filter_map(|source_id| resolver.resolve_question(source_id))
                .map(|target_id| json!({ "id": target_id }))
                .collect();
            rebuilt["series"] = Value::Array(rewritten_series);
        }

        if let Some(card) = panel.get("card") {
            let mut embedded = card.clone();
            if let Value::Object(map) = &mut embedded {
                for field in DASHCARD_STRIPPED_FIELDS {
                    map.remove(*field);
                }
                map.insert("id".to_string(), Value::from(target_card_id));
            }
            rebuilt["card"] = embedded;
        }

        rewritten.push(rebuilt);
    }

    payload["dashcards"] = Value::Array(rewritten);
}

fn rewrite_parameter_mapping(mapping: &Value, questions_by_id: &HashMap<i64, &Question>, resolver: &IdentityResolver) -> Option<Value> {
    let source_card_id = mapping.get("card_id").and_then(Value::as_i64)?;
    let target_card_id = resolver.resolve_question(source_card_id)?;
    let source_db_id = questions_by_id.get(&source_card_id)?.database_id;

    let mut rewritten = mapping.clone();
    rewritten["card_id"] = Value::from(target_card_id);
    if let Some(target) = rewritten.get_mut("target") {
        rewrite_field_ref_tree(target, source_db_id, resolver);
    }
    Some(rewritten)
}

fn rewrite_dashboard_parameters(payload: &mut Value, questions_by_id: &HashMap<i64, &Question>, resolver: &IdentityResolver) {
    let Some(parameters) = payload.get_mut("parameters").and_then(Value::as_array_mut) else {
        return;
    };

    for parameter in parameters.iter_mut() {
        let Some(config) = parameter.get_mut("values_source_config") else { continue };
        let Some(source_card_id) = config.get("card_id").and_then(Value::as_i64) else { continue };
        let Some(source_db_id) = questions_by_id.get(&source_card_id).map(|q| q.database_id) else { continue };

        if let Some(target_card_id) = resolver.resolve_question(source_card_id) {
            config["card_id"] = Value::from(target_card_id);
        }
        if let Some(value_field) = config.get_mut("value_field") {
            rewrite_field_ref_tree(value_field, source_db_id, resolver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeClient;
    use migrate_model::{checksum, DatabaseMap};
    use std::collections::BTreeMap;

    fn question(id: i64, database_id: i64) -> Question {
        Question {
            id,
            name: format!("Q{id}"),
            collection_id: None,
            database_id,
            file_path: String::new(),
            checksum: String::new(),
            archived: false,
            is_model: false,
        }
    }

    fn write_dashboard(dir: &std::path::Path, id: i64, payload: Value) -> Dashboard {
        let bytes = serde_json::to_vec(&payload).unwrap();
        let file_name = format!("dash_{id}.json");
        std::fs::write(dir.join(&file_name), &bytes).unwrap();
        Dashboard {
            id,
            name: "Overview".to_string(),
            collection_id: None,
            ordered_cards: vec![],
            file_path: file_name,
            checksum: checksum::checksum_bytes(&bytes),
            archived: false,
        }
    }

    #[tokio::test]
    async fn install_rewrites_panel_card_ids_and_assigns_negative_temp_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let dashboard = write_dashboard(
            tmp.path(),
            10,
            json!({
                "name": "Overview",
                "parameters": [],
                "dashcards": [{"card_id": 50, "col": 0, "row": 0, "size_x": 4, "size_y": 4}],
            }),
        );

        let client = FakeClient::new();
        let questions = vec![question(50, 1)];
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        resolver.register_question(50, 500);
        let mut report = Report::new();

        DashboardInstaller::install_all(&client, tmp.path(), &[dashboard], &questions, ConflictStrategy::Skip, &mut resolver, &mut report)
            .await
            .unwrap();

        assert_eq!(report.dashboards.created, 1);
        let sent = client.created_dashboards.lock().unwrap();
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn skip_strategy_reuses_existing_target_dashboard_with_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dashboard = write_dashboard(
            tmp.path(),
            10,
            json!({
                "name": "Overview",
                "parameters": [],
                "dashcards": [],
            }),
        );

        let mut items = BTreeMap::new();
        items.insert(
            "root".to_string(),
            vec![migrate_client::CollectionItem { id: 700, model: "dashboard".to_string(), name: "Overview".to_string(), archived: false }],
        );
        let client = FakeClient { items, ..FakeClient::new() };

        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        let mut report = Report::new();

        DashboardInstaller::install_all(&client, tmp.path(), &[dashboard], &[], ConflictStrategy::Skip, &mut resolver, &mut report)
            .await
            .unwrap();

        assert_eq!(report.dashboards.created, 0);
        assert_eq!(report.dashboards.skipped, 1);
        assert!(client.created_dashboards.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn panel_with_unresolved_question_is_dropped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dashboard = write_dashboard(
            tmp.path(),
            11,
            json!({
                "name": "Orphan panel",
                "parameters": [],
                "dashcards": [{"card_id": 999, "col": 0, "row": 0, "size_x": 4, "size_y": 4}],
            }),
        );

        let client = FakeClient::new();
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        let mut report = Report::new();

        DashboardInstaller::install_all(&client, tmp.path(), &[dashboard], &[], ConflictStrategy::Skip, &mut resolver, &mut report)
            .await
            .unwrap();

        assert_eq!(report.dashboards.created, 1);
    }
}
