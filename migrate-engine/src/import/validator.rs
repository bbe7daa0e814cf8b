//! Pre-flight validation and table/field map construction (spec §4.2,
//! §7 `MappingError`). Runs before any write; a failure here aborts the
//! run with a single consolidated message.

use std::collections::{BTreeMap, HashMap};

use migrate_client::Client;
use migrate_model::Manifest;

use crate::error::{EngineError, EngineResult, MappingFailure, UnmappedDatabase};
use crate::import::resolver::IdentityResolver;

pub struct Validator;

impl Validator {
    /// For each source database with a resolvable target, fetch the
    /// target's metadata once and record `(srcDb, srcTable) ->
    /// tgtTable` and `(srcDb, srcField) -> tgtField` by matching names.
    /// Missing targets are recorded as drift warnings, never fatal here.
    pub async fn build_table_and_field_maps(client: &dyn Client, manifest: &Manifest, resolver: &mut IdentityResolver) -> EngineResult<()> {
        let mut fetched: HashMap<i64, serde_json::Value> = HashMap::new();

        for (&src_db_id, metadata) in &manifest.database_metadata {
            let Some(target_db_id) = resolver.resolve_database_id(src_db_id) else {
                continue;
            };
            let target_metadata = match fetched.get(&target_db_id) {
                Some(v) => v.clone(),
                None => {
                    let v = client.get_database_metadata(target_db_id).await?;
                    fetched.insert(target_db_id, v.clone());
                    v
                }
            };
            let target_tables: HashMap<&str, &serde_json::Value> = target_metadata
                .get("tables")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|t| Some((t.get("name")?.as_str()?, t))).collect())
                .unwrap_or_default();

            for table in &metadata.tables {
                let Some(target_table) = target_tables.get(table.name.as_str()) else {
                    resolver.note_drift(format!("table `{}` not found on target database {target_db_id}", table.name));
                    continue;
                };
                let Some(target_table_id) = target_table.get("id").and_then(|v| v.as_i64()) else { continue };
                resolver.register_table(src_db_id, table.id, target_table_id);

                let target_fields: HashMap<&str, i64> = target_table
                    .get("fields")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|f| Some((f.get("name")?.as_str()?, f.get("id")?.as_i64()?)))
                            .collect()
                    })
                    .unwrap_or_default();

                for field in &table.fields {
                    match target_fields.get(field.name.as_str()) {
                        Some(&target_field_id) => resolver.register_field(src_db_id, field.id, target_field_id),
                        None => resolver.note_drift(format!(
                            "field `{}` on table `{}` not found on target database {target_db_id}",
                            field.name, table.name
                        )),
                    }
                }
            }
        }

        Ok(())
    }

    /// Refuse to start unless every database referenced by a
    /// non-archived question is mapped, and every mapped target
    /// database actually exists on the target instance.
    pub async fn validate(client: &dyn Client, manifest: &Manifest, resolver: &IdentityResolver) -> EngineResult<()> {
        let existing_target_ids = Self::existing_target_database_ids(client).await?;

        let mut offenders: BTreeMap<i64, UnmappedDatabase> = BTreeMap::new();
        for card in manifest.cards.iter().filter(|c| !c.archived) {
            let name = manifest.databases.get(&card.database_id).cloned().unwrap_or_default();
            match resolver.resolve_database(card.database_id) {
                None => {
                    offenders
                        .entry(card.database_id)
                        .or_insert_with(|| UnmappedDatabase {
                            source_database_id: card.database_id,
                            source_database_name: name,
                            affected_question_ids: vec![],
                            target_missing: false,
                        })
                        .affected_question_ids
                        .push(card.id);
                }
                Some(target_id) if !existing_target_ids.contains(&target_id) => {
                    offenders
                        .entry(card.database_id)
                        .or_insert_with(|| UnmappedDatabase {
                            source_database_id: card.database_id,
                            source_database_name: name,
                            affected_question_ids: vec![],
                            target_missing: true,
                        })
                        .affected_question_ids
                        .push(card.id);
                }
                Some(_) => {}
            }
        }

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Mapping(MappingFailure {
                unmapped_databases: offenders.into_values().collect(),
            }))
        }
    }

    async fn existing_target_database_ids(client: &dyn Client) -> EngineResult<std::collections::HashSet<i64>> {
        let databases = client.get_databases().await?;
        let entries = databases.get("data").and_then(|v| v.as_array()).or_else(|| databases.as_array());
        Ok(entries
            .map(|arr| arr.iter().filter_map(|e| e.get("id").and_then(|v| v.as_i64())).collect())
            .unwrap_or_default())
    }
}
