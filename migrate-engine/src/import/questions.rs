//! Topological question installer (spec §4.4). Computes a dependency
//! order with Kahn's algorithm, breaking ties by ascending source id;
//! cycle participants and questions whose dependency set reaches
//! outside the install set are deferred to the tail and attempted last.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use migrate_client::{Client, CollectionId, ItemsQuery};
use migrate_model::{EntityKind, Question, Report, ReportItem};
use migrate_query::{rewrite_question, ReferenceCatalog, StandardCatalog};
use serde_json::Value;

use crate::conflict::{ConflictStrategy, NameIndex, Resolution};
use crate::error::EngineResult;
use crate::import::loader::PackageLoader;
use crate::import::resolver::IdentityResolver;

pub struct QuestionInstaller;

impl QuestionInstaller {
    pub async fn install_all(
        client: &dyn Client,
        export_root: &Path,
        questions: &[Question],
        strategy: ConflictStrategy,
        resolver: &mut IdentityResolver,
        report: &mut Report,
    ) -> EngineResult<()> {
        let mut payloads: HashMap<i64, Value> = HashMap::new();
        for q in questions {
            let payload = PackageLoader::load_entity(export_root, &q.file_path, &q.checksum)?;
            payloads.insert(q.id, payload);
        }

        let install_set: BTreeSet<i64> = questions.iter().map(|q| q.id).collect();
        let mut deps: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for q in questions {
            let dataset_query = payloads[&q.id].get("dataset_query").cloned().unwrap_or(Value::Null);
            let discovered = StandardCatalog.extract_dependencies(&dataset_query);
            let in_scope: BTreeSet<i64> = discovered.into_iter().filter(|id| install_set.contains(id) && *id != q.id).collect();
            deps.insert(q.id, in_scope);
        }

        let (order, cyclic) = topological_order(&deps);
        let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();
        let mut name_index = NameIndex::new();

        let target_scopes: BTreeSet<Option<i64>> = questions.iter().map(|q| q.collection_id.and_then(|cid| resolver.resolve_collection(cid))).collect();
        for scope in target_scopes {
            let collection_id = scope.map(CollectionId::Id).unwrap_or(CollectionId::Root);
            let query = ItemsQuery { models: vec!["card".to_string(), "dataset".to_string()], archived: true };
            let items = client.get_collection_items(collection_id, &query).await?;
            for item in items.into_iter().filter(|i| i.is_question_or_model()) {
                name_index.record(scope, &item.name, item.id);
            }
        }

        for source_id in order {
            let Some(question) = by_id.get(&source_id) else { continue };
            let mut payload = payloads.remove(&source_id).unwrap_or(Value::Null);

            let rewrite = rewrite_question(&mut payload, &*resolver);
            if !rewrite.ok {
                report.push(ReportItem::failed(EntityKind::Question, source_id, question.name.clone(), "no resolvable database reference"));
                continue;
            }
            if !rewrite.unresolved_cards.is_empty() {
                let reason = if cyclic.contains(&source_id) {
                    format!("cycle: unresolved dependent question(s) {:?}", rewrite.unresolved_cards)
                } else {
                    format!("missing dependency question(s) {:?}", rewrite.unresolved_cards)
                };
                report.push(ReportItem::failed(EntityKind::Question, source_id, question.name.clone(), reason));
                continue;
            }

            let target_collection_id = question.collection_id.and_then(|cid| resolver.resolve_collection(cid));
            let resolution = name_index.resolve(strategy, target_collection_id, &question.name);

            match resolution {
                Resolution::Create { name } => {
                    prepare_for_create(&mut payload, &name, target_collection_id);
                    match client.create_card(&payload).await {
                        Ok(target_id) => {
                            resolver.register_question(source_id, target_id);
                            report.push(ReportItem::created(EntityKind::Question, source_id, target_id, name));
                        }
                        Err(e) => report.push(classify_failure(EntityKind::Question, source_id, &question.name, e)),
                    }
                }
                Resolution::ReuseExisting { target_id } => {
                    resolver.register_question(source_id, target_id);
                    report.push(ReportItem::skipped(EntityKind::Question, source_id, target_id, question.name.clone()));
                }
                Resolution::UpdateExisting { target_id } => {
                    prepare_for_update(&mut payload, &question.name, target_collection_id);
                    match client.update_card(target_id, &payload).await {
                        Ok(()) => {
                            resolver.register_question(source_id, target_id);
                            report.push(ReportItem::updated(EntityKind::Question, source_id, target_id, question.name.clone()));
                        }
                        Err(e) => report.push(classify_failure(EntityKind::Question, source_id, &question.name, e)),
                    }
                }
            }
        }

        Ok(())
    }
}

fn prepare_for_create(payload: &mut Value, name: &str, collection_id: Option<i64>) {
    if let Value::Object(map) = payload {
        map.remove("id");
        map.remove("entity_id");
        map.remove("created_at");
        map.remove("updated_at");
        map.insert("name".to_string(), Value::String(name.to_string()));
        map.insert("collection_id".to_string(), collection_id.map(Value::from).unwrap_or(Value::Null));
    }
}

fn prepare_for_update(payload: &mut Value, name: &str, collection_id: Option<i64>) {
    if let Value::Object(map) = payload {
        map.insert("name".to_string(), Value::String(name.to_string()));
        map.insert("collection_id".to_string(), collection_id.map(Value::from).unwrap_or(Value::Null));
    }
}

pub(crate) fn classify_failure(kind: EntityKind, source_id: i64, name: &str, error: migrate_client::ClientError) -> ReportItem {
    let reason = if error.is_foreign_key_violation() {
        format!("schema drift: target rejected the payload ({error})")
    } else {
        format!("transport error: {error}")
    };
    ReportItem::failed(kind, source_id, name.to_string(), reason)
}

/// Kahn's algorithm with ascending-id tie-break. Returns the install
/// order plus the set of ids that could not reach in-degree zero
/// (cycle participants), which are appended to the tail in ascending
/// order.
pub(crate) fn topological_order(deps: &BTreeMap<i64, BTreeSet<i64>>) -> (Vec<i64>, BTreeSet<i64>) {
    let ids: BTreeSet<i64> = deps.keys().copied().collect();
    let mut in_degree: HashMap<i64, usize> = ids.iter().map(|&id| (id, deps[&id].len())).collect();
    let mut dependents: HashMap<i64, Vec<i64>> = HashMap::new();
    for (&id, ds) in deps {
        for &d in ds {
            dependents.entry(d).or_default().push(id);
        }
    }

    let mut ready: BTreeSet<i64> = ids.iter().copied().filter(|id| in_degree[id] == 0).collect();
    let mut order = Vec::with_capacity(ids.len());

    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        order.push(next);
        if let Some(list) = dependents.get(&next) {
            for &dependent in list {
                if let Some(count) = in_degree.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }

    let placed: BTreeSet<i64> = order.iter().copied().collect();
    let tail: Vec<i64> = ids.difference(&placed).copied().collect();
    let cyclic: BTreeSet<i64> = tail.iter().copied().collect();
    order.extend(tail);
    (order, cyclic)
}
