//! Installs collections parent-first (spec §4.4/§5: paths are
//! lexicographically prefix-ordered, so sorting by `path` puts every
//! parent before its children).

use migrate_client::{Client, CollectionId, CollectionNode};
use migrate_model::{Collection, EntityKind, Report, ReportItem};
use serde_json::json;

use crate::conflict::{ConflictStrategy, NameIndex, Resolution};
use crate::error::EngineResult;
use crate::import::resolver::IdentityResolver;

pub struct CollectionInstaller;

impl CollectionInstaller {
    pub async fn install_all(
        client: &dyn Client,
        collections: &[Collection],
        strategy: ConflictStrategy,
        resolver: &mut IdentityResolver,
        report: &mut Report,
    ) -> EngineResult<()> {
        let mut name_index = NameIndex::new();
        let existing = client.get_collections_tree(true).await?;
        for node in &existing {
            seed_existing(node, None, &mut name_index);
        }

        let mut ordered: Vec<&Collection> = collections.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        for collection in ordered {
            let target_parent_id = collection.parent_id.and_then(|pid| resolver.resolve_collection(pid));
            let resolution = name_index.resolve(strategy, target_parent_id, &collection.name);

            match resolution {
                Resolution::Create { name } => {
                    let payload = json!({
                        "name": name,
                        "parent_id": target_parent_id,
                        "description": collection.description,
                    });
                    let target_id = client.create_collection(&payload).await?;
                    resolver.register_collection(collection.id, target_id);
                    report.push(ReportItem::created(EntityKind::Collection, collection.id, target_id, name));
                }
                Resolution::ReuseExisting { target_id } => {
                    resolver.register_collection(collection.id, target_id);
                    report.push(ReportItem::skipped(EntityKind::Collection, collection.id, target_id, collection.name.clone()));
                }
                Resolution::UpdateExisting { target_id } => {
                    let payload = json!({ "name": collection.name, "description": collection.description });
                    client.update_collection(target_id, &payload).await?;
                    resolver.register_collection(collection.id, target_id);
                    report.push(ReportItem::updated(EntityKind::Collection, collection.id, target_id, collection.name.clone()));
                }
            }
        }

        Ok(())
    }
}

fn seed_existing(node: &CollectionNode, parent_target_id: Option<i64>, name_index: &mut NameIndex) {
    if let CollectionId::Id(id) = node.id {
        name_index.record(parent_target_id, &node.name, id);
        for child in &node.children {
            seed_existing(child, Some(id), name_index);
        }
    } else {
        for child in &node.children {
            seed_existing(child, parent_target_id, name_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeClient;
    use migrate_model::DatabaseMap;
    use std::collections::BTreeMap;

    fn collection(id: i64, name: &str, parent_id: Option<i64>, path: &str) -> Collection {
        Collection {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            parent_id,
            personal_owner_id: None,
            path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn installs_parent_before_child_and_registers_ids() {
        let client = FakeClient::new();
        let collections = vec![
            collection(2, "Sales", Some(1), "Analytics/Sales"),
            collection(1, "Analytics", None, "Analytics"),
        ];
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        let mut report = Report::new();

        CollectionInstaller::install_all(&client, &collections, ConflictStrategy::Skip, &mut resolver, &mut report)
            .await
            .unwrap();

        assert!(resolver.resolve_collection(1).is_some());
        let parent_target = resolver.resolve_collection(1).unwrap();
        assert_eq!(resolver.resolve_collection(2), Some(parent_target + 1));
        assert_eq!(report.collections.created, 2);
    }

    #[tokio::test]
    async fn skip_strategy_reuses_existing_collection_by_name() {
        let mut client = FakeClient::new();
        client.collections_tree = vec![CollectionNode {
            id: CollectionId::Id(900),
            name: "Analytics".to_string(),
            slug: None,
            description: None,
            personal_owner_id: None,
            archived: false,
            children: vec![],
        }];
        let collections = vec![collection(1, "Analytics", None, "Analytics")];
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        let mut report = Report::new();

        CollectionInstaller::install_all(&client, &collections, ConflictStrategy::Skip, &mut resolver, &mut report)
            .await
            .unwrap();

        assert_eq!(resolver.resolve_collection(1), Some(900));
        assert_eq!(report.collections.skipped, 1);
    }
}
