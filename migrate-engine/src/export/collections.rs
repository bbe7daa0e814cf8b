//! Walks the collections forest, recording each in-scope collection and
//! building the path map later stages key off of.
//!
//! Personal collections are skipped by default; one owned by a user id
//! in [`ExportConfig::include_personal_owner_ids`] is still recorded so
//! it round-trips its owner reference, but its `personal_owner_id`
//! marks it for diagnostics rather than normal collaborative use.
//! `root_collection_ids`, when set, restricts the walk to those
//! subtrees.

use migrate_client::{Client, CollectionId, CollectionNode};
use migrate_model::{sanitize, Collection};

use crate::error::EngineResult;
use crate::export::session::ExportSession;

pub struct CollectionWalker;

impl CollectionWalker {
    pub async fn walk(client: &dyn Client, session: &mut ExportSession) -> EngineResult<()> {
        let forest = client.get_collections_tree(session.config.include_archived).await?;
        let root_filter = session.config.root_collection_ids.clone();

        for node in &forest {
            let starts_in_scope = root_filter.is_none();
            walk_node(node, None, &[], starts_in_scope, &root_filter, session);
        }
        Ok(())
    }
}

fn walk_node(
    node: &CollectionNode,
    parent_id: Option<i64>,
    chain: &[&str],
    mut in_scope: bool,
    root_filter: &Option<Vec<i64>>,
    session: &mut ExportSession,
) {
    let CollectionId::Id(id) = node.id else {
        // The virtual root node itself is never recorded as an entity;
        // descend into its children with scope unchanged.
        for child in &node.children {
            walk_node(child, parent_id, chain, in_scope, root_filter, session);
        }
        return;
    };

    if let Some(ids) = root_filter {
        if !in_scope && ids.contains(&id) {
            in_scope = true;
        }
    }

    if node.archived && !session.config.include_archived {
        return;
    }

    let is_personal = node.personal_owner_id.is_some();
    let personal_whitelisted = node
        .personal_owner_id
        .map(|owner| session.config.include_personal_owner_ids.contains(&owner))
        .unwrap_or(false);
    if is_personal && !personal_whitelisted {
        // Don't record this collection, and don't descend — its
        // children are personal sub-folders too.
        return;
    }

    if !in_scope {
        // Outside root_collection_ids scope; still walk children in
        // case a descendant is itself a listed root.
        let mut next_chain = chain.to_vec();
        next_chain.push(node.name.as_str());
        for child in &node.children {
            walk_node(child, Some(id), &next_chain, in_scope, root_filter, session);
        }
        return;
    }

    let mut path_chain = chain.to_vec();
    path_chain.push(node.name.as_str());
    let path = sanitize::collection_path(&path_chain);
    let slug = sanitize::sanitize_slug(&node.name);

    session.collection_path_map.insert(id, path.clone());
    session.collections.push(Collection {
        id,
        name: node.name.clone(),
        slug,
        description: node.description.clone(),
        parent_id,
        personal_owner_id: node.personal_owner_id,
        path,
    });

    for child in &node.children {
        walk_node(child, Some(id), &path_chain, true, root_filter, session);
    }
}
