//! Traits and functions for defining or provisioning the database model.

use anyhow::Context as _;
use bson::{Bson, Document, doc};
use mongodb::error::{CommandError, Error, ErrorKind};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::Deserialize;

use super::sort::Sort;

/// Declares a type as being a collection type in MongoDB.
pub trait ModelCollection {
    /// The name of the MongoDB collection.
    const COLLECTION_NAME: &str;

    /// Gets the collection for this type on the given database.
    fn collection(db: &Database) -> Collection<Self>
    where
        Self: Sized + Send + Sync,
    {
        db.collection(Self::COLLECTION_NAME)
    }

    /// Gets the collection for this type on the given database without
    /// ascribing the type, instead using a raw [`Document`] collection.
    fn collection_raw(db: &Database) -> Collection<Document> {
        db.collection(Self::COLLECTION_NAME)
    }

    /// Gets the indices to create for this collection. This must always return
    /// the same values.
    ///
    /// To apply the indices, call [`ModelCollection::update_indices`].
    fn indices() -> Vec<IndexModel> {
        Vec::new()
    }

    /// Creates the collection for this model if it doesn't exist yet.
    ///
    /// Returns whether the collection was created by this call.
    fn ensure_collection(db: &Database) -> impl Future<Output = anyhow::Result<bool>> {
        ensure_collection(db, Self::COLLECTION_NAME)
    }

    /// Creates the indices for this model.
    ///
    /// What happens on a spec mismatch with an existing index is decided by
    /// `on_conflict`.
    fn update_indices(
        db: &Database,
        on_conflict: OnConflict,
    ) -> impl Future<Output = anyhow::Result<()>> {
        update_indices(Self::collection_raw(db), Self::indices, on_conflict)
    }

    /// Checks that every index from [`ModelCollection::indices`] exists on the
    /// collection, returning the names they have on the server.
    fn verify_indices(db: &Database) -> impl Future<Output = anyhow::Result<Vec<String>>> {
        verify_indices(Self::collection_raw(db), Self::indices)
    }
}

/// How to handle an existing index whose specification conflicts with the
/// one being created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnConflict {
    /// Fail provisioning.
    #[default]
    Fail,
    /// Drop the existing index and create it again.
    Recreate,
}

/// Errors in provisioning that are not just a failed driver call.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("conflicting index spec on collection `{collection}`")]
    IndexConflict {
        collection: String,
        #[source]
        source: Error,
    },
    #[error("collection `{collection}` is missing indices: {}", .names.join(", "))]
    MissingIndices {
        collection: String,
        names: Vec<String>,
    },
}

/// Builds an index over `keys` with the name the server would assign by
/// default, i.e. `company_name_1_scraped_at_-1`.
///
/// Naming it explicitly allows dropping it by name when it needs to be
/// replaced, while still matching indices created without explicit names.
pub fn index(keys: Document) -> IndexModel {
    let options = IndexOptions::builder()
        .name(index_name(&keys))
        .build();

    IndexModel::builder()
        .keys(keys)
        .options(options)
        .build()
}

/// Gets the server's default name for an index over `keys`.
pub fn index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, value)| match (Sort::from_bson(value), value) {
            (Some(sort), _) => format!("{field}_{}", sort.name_suffix()),
            (None, Bson::String(kind)) => format!("{field}_{kind}"),
            (None, value) => format!("{field}_{value}"),
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Determines whether the error code is `48 (NamespaceExists)`.
fn is_namespace_exists(err: &Error) -> bool {
    matches!(*err.kind, ErrorKind::Command(CommandError { code: 48, .. }))
}

/// Determines whether the error code is `85 (IndexOptionsConflict)` or
/// `86 (IndexKeySpecsConflict)`.
fn is_index_conflict(err: &Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Command(CommandError { code: 85 | 86, .. })
    )
}

/// Shared non-generic logic for [`ModelCollection::ensure_collection`].
async fn ensure_collection(db: &Database, name: &str) -> anyhow::Result<bool> {
    let existing = db
        .list_collection_names()
        .filter(doc! { "name": name })
        .await
        .with_context(|| format!("could not list collections in {}", db.name()))?;

    if existing.iter().any(|n| n == name) {
        log::debug!("Collection {}/{name} already exists.", db.name());
        return Ok(false);
    }

    // someone else may have created it since we checked
    match db.create_collection(name).await {
        Ok(()) => {
            log::info!("Created collection {}/{name}.", db.name());
            Ok(true)
        },
        Err(err) if is_namespace_exists(&err) => Ok(false),
        Err(err) => Err(err).with_context(|| format!("could not create {}/{name}", db.name())),
    }
}

/// Shared non-generic logic for [`ModelCollection::update_indices`].
///
/// This attempts to create all indices in bulk. If there is a conflict, either
/// fails or falls back to creating the indices one-by-one, dropping and
/// recreating any individual ones that run into a conflict.
///
/// The indices are provided as a function pointer so they can be created a
/// second time as needed rather than having to be cloned every time.
async fn update_indices(
    collection: Collection<Document>,
    indices_fn: fn() -> Vec<IndexModel>,
    on_conflict: OnConflict,
) -> anyhow::Result<()> {
    /// Slow path for [`update_indices`]. Indices are created one-by-one and, if
    /// a conflict arises, the existing conflicting indices are dropped and the
    /// index is created again.
    async fn recreate_indices(
        collection: Collection<Document>,
        indices_fn: fn() -> Vec<IndexModel>,
    ) -> anyhow::Result<()> {
        for index in indices_fn() {
            match collection.create_index(index.clone()).await {
                Ok(_) => {},
                Err(err) if is_index_conflict(&err) => {
                    let present = list_indices(&collection).await?;
                    let conflicting = conflicting_indices(&index, &present);
                    if conflicting.is_empty() {
                        return Err(err).with_context(|| {
                            format!(
                                "no existing index on {} conflicts with {}",
                                collection.name(),
                                model_name(&index)
                            )
                        });
                    }

                    for name in conflicting {
                        log::trace!("Detected index {}/{} mismatch.", collection.name(), name);
                        collection.drop_index(&name).await.with_context(|| {
                            format!("could not drop index {}/{name}", collection.name())
                        })?;
                    }

                    let create = collection.create_index(index).await?;
                    log::info!(
                        "Replaced index {}/{}.",
                        collection.name(),
                        create.index_name
                    );
                },
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    let indices = indices_fn();
    if indices.is_empty() {
        return Ok(());
    }

    // attempt to create all indices in bulk first
    // creating an index that already exists with the same spec is a no-op
    match collection.create_indexes(indices).await {
        Ok(created) => {
            log::info!(
                "Ensured indices on {}: {}.",
                collection.name(),
                created.index_names.join(", ")
            );
            Ok(())
        },
        Err(err) if is_index_conflict(&err) => match on_conflict {
            OnConflict::Recreate => recreate_indices(collection, indices_fn).await,
            OnConflict::Fail => Err(ProvisionError::IndexConflict {
                collection: collection.name().to_owned(),
                source: err,
            }
            .into()),
        },
        Err(err) => Err(err).context("could not create indices"),
    }
}

/// Shared non-generic logic for [`ModelCollection::verify_indices`].
///
/// Returns the names the expected indices have on the server.
async fn verify_indices(
    collection: Collection<Document>,
    indices_fn: fn() -> Vec<IndexModel>,
) -> anyhow::Result<Vec<String>> {
    let present = list_indices(&collection).await?;
    let expected = indices_fn();

    let missing = missing_indices(&expected, &present);
    if !missing.is_empty() {
        return Err(ProvisionError::MissingIndices {
            collection: collection.name().to_owned(),
            names: missing,
        }
        .into());
    }

    let names = verified_names(&expected, &present);
    log::debug!("Verified indices on {}: {}.", collection.name(), names.join(", "));
    Ok(names)
}

async fn list_indices(collection: &Collection<Document>) -> anyhow::Result<Vec<IndexModel>> {
    let mut cursor = collection
        .list_indexes()
        .await
        .with_context(|| format!("could not list indices on {}", collection.name()))?;

    let mut present = Vec::new();
    while cursor.advance().await? {
        present.push(cursor.deserialize_current()?);
    }

    Ok(present)
}

/// Gets the name of an index, falling back to the default name for its keys.
fn model_name(index: &IndexModel) -> String {
    match &index.options {
        Some(IndexOptions {
            name: Some(name), ..
        }) => name.clone(),
        _ => index_name(&index.keys),
    }
}

/// Gets the names of the indices in `present` that stand in the way of
/// creating `index`.
///
/// That is any index with the same name but a different spec, or with the
/// same key pattern under a different name or options.
fn conflicting_indices(index: &IndexModel, present: &[IndexModel]) -> Vec<String> {
    let name = model_name(index);
    let mut names = Vec::new();
    for p in present {
        let p_name = model_name(p);
        if (p_name == name || keys_match(&index.keys, &p.keys)) && !names.contains(&p_name) {
            names.push(p_name);
        }
    }

    names
}

/// Gets the names of the `expected` indices that have no counterpart with the
/// same key pattern in `present`.
///
/// Index names and options are not compared.
pub fn missing_indices(expected: &[IndexModel], present: &[IndexModel]) -> Vec<String> {
    expected
        .iter()
        .filter(|e| !present.iter().any(|p| keys_match(&e.keys, &p.keys)))
        .map(model_name)
        .collect()
}

/// Gets the server-side names of the `present` indices that match an
/// `expected` key pattern, in the order of `expected`.
fn verified_names(expected: &[IndexModel], present: &[IndexModel]) -> Vec<String> {
    expected
        .iter()
        .filter_map(|e| present.iter().find(|p| keys_match(&e.keys, &p.keys)))
        .map(model_name)
        .collect()
}

/// Compares key patterns by field order and direction, ignoring the numeric
/// type the direction is stored as.
fn keys_match(a: &Document, b: &Document) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|((a_field, a_value), (b_field, b_value))| {
            a_field == b_field
                && match (Sort::from_bson(a_value), Sort::from_bson(b_value)) {
                    (Some(a), Some(b)) => a == b,
                    _ => a_value == b_value,
                }
        })
}
