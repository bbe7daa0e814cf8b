//! The export pipeline: snapshot databases, walk collections, export
//! every question and (optionally) dashboard found in scope, optionally
//! snapshot permissions, and write the manifest last.

pub mod collections;
pub mod dashboards;
pub mod database;
pub mod permissions;
pub mod questions;
pub mod session;
pub mod writer;

pub use collections::CollectionWalker;
pub use dashboards::DashboardExporter;
pub use database::DatabaseSnapshotter;
pub use permissions::PermissionsSnapshotter;
pub use questions::QuestionExporter;
pub use session::{ExportConfig, ExportSession};
pub use writer::ManifestWriter;

use std::path::PathBuf;

use migrate_client::{Client, CollectionId, ItemsQuery};
use migrate_model::Manifest;

use crate::error::EngineResult;

/// Run the full export pipeline against an already-authenticated
/// client, writing the package under `export_root`.
pub async fn run_export(
    client: &dyn Client,
    config: ExportConfig,
    export_root: PathBuf,
    source_url: &str,
    tool_version: &str,
    cli_args: &[String],
) -> EngineResult<Manifest> {
    let mut session = ExportSession::new(config, export_root);

    DatabaseSnapshotter::snapshot(client, &mut session).await?;
    CollectionWalker::walk(client, &mut session).await?;

    let mut collection_ids: Vec<i64> = session.collection_path_map.keys().copied().collect();
    collection_ids.sort_unstable();
    if session.config.root_collection_ids.is_none() {
        // A `None` entry signals "also walk the root collection's own
        // items", represented out-of-band since `CollectionId::Root`
        // never appears as a key in `collection_path_map`.
        export_items_in(client, &mut session, CollectionId::Root).await?;
    }
    for id in collection_ids {
        export_items_in(client, &mut session, CollectionId::Id(id)).await?;
    }

    if session.config.include_permissions {
        PermissionsSnapshotter::snapshot(client, &mut session).await?;
    }

    ManifestWriter::write(&session, source_url, tool_version, cli_args)
}

async fn export_items_in(client: &dyn Client, session: &mut ExportSession, collection_id: CollectionId) -> EngineResult<()> {
    let include_archived = session.config.include_archived;
    let include_dashboards = session.config.include_dashboards;

    let cards_query = ItemsQuery { models: vec!["card".to_string(), "dataset".to_string()], archived: include_archived };
    let items = client.get_collection_items(collection_id, &cards_query).await?;
    for item in items.iter().filter(|i| i.is_question_or_model()) {
        let mut chain = Vec::new();
        QuestionExporter::export_question(client, session, item.id, &mut chain).await?;
    }

    if include_dashboards {
        let dash_query = ItemsQuery { models: vec!["dashboard".to_string()], archived: include_archived };
        let items = client.get_collection_items(collection_id, &dash_query).await?;
        for item in items.iter().filter(|i| i.is_dashboard()) {
            DashboardExporter::export_dashboard(client, session, item.id).await?;
        }
    }

    Ok(())
}
