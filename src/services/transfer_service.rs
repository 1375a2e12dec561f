use std::collections::{HashMap, HashSet};

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::dao::{CatalogDao, DaoBase, DaoLayerError, DaoResult, ListDao, ListItemDao},
    db::entities::{ItemKind, list_item},
    error::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferOp {
    Copy,
    Move,
}

impl TransferOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOp::Copy => "copy",
            TransferOp::Move => "move",
        }
    }
}

/// Caller-selected strategy for an item that already exists in the target
/// list. `Block` asks for a decision and is therefore rejected in bulk
/// mode, where no per-item prompting is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    Block,
    Skip,
    Proceed,
    RemoveSourceOnly,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Ok,
    DuplicateFound,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{0}")]
    Validation(String),
    #[error("List not found")]
    ListNotFound,
    #[error("Source item not found")]
    ItemNotFound,
    #[error("Duplicate entries were inserted concurrently; retry with an explicit policy")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] DaoLayerError),
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Validation(message) => AppError::bad_request(message),
            TransferError::ListNotFound => AppError::not_found("List not found"),
            TransferError::ItemNotFound => AppError::not_found("Source item not found"),
            TransferError::Conflict => AppError::conflict(
                "Duplicate entries were inserted concurrently; retry with an explicit policy",
            ),
            TransferError::Storage(storage) => storage.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub item_id: Uuid,
    #[serde(rename = "item_type")]
    pub item_kind: ItemKind,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub item: ItemRef,
    pub source_list_id: Uuid,
    pub target_list_id: Uuid,
    pub operation: TransferOp,
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Serialize)]
pub struct TransferReport {
    pub status: TransferStatus,
    pub message: String,
    pub copied: u64,
    pub moved: u64,
    pub skipped: u64,
}

impl TransferReport {
    fn ok(message: impl Into<String>, copied: u64, moved: u64, skipped: u64) -> Self {
        Self {
            status: TransferStatus::Ok,
            message: message.into(),
            copied,
            moved,
            skipped,
        }
    }

    fn duplicate_found() -> Self {
        Self {
            status: TransferStatus::DuplicateFound,
            message: "duplicate_found".to_string(),
            copied: 0,
            moved: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkTransferRequest {
    pub items: Vec<ItemRef>,
    pub source_list_id: Uuid,
    pub target_list_id: Uuid,
    pub operation: TransferOp,
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub item_id: Uuid,
    #[serde(rename = "item_type")]
    pub item_kind: ItemKind,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BulkTransferReport {
    pub copied_count: u64,
    pub moved_count: u64,
    pub skipped_count: u64,
    pub errors: Vec<ItemError>,
}

type Leaf = (Uuid, ItemKind);
type SourceAttrs = HashMap<Leaf, (bool, Option<String>)>;

/// The mutation set of one transfer call, computed in memory from the
/// batched existence fetches before anything is written.
#[derive(Debug, Default, PartialEq, Eq)]
struct TransferPlan {
    to_insert: Vec<Leaf>,
    to_remove: Vec<Leaf>,
    skipped: u64,
}

/// A leaf already live in the target never plans an insert: the partial
/// unique index would reject it. `proceed` therefore collapses a duplicate
/// onto the existing target row. A copy counts it as skipped; a move still
/// removes the source row.
fn plan_leaves(
    leaves: &[Leaf],
    existing: &HashSet<Leaf>,
    in_source: &HashSet<Leaf>,
    operation: TransferOp,
    on_duplicate: DuplicatePolicy,
) -> TransferPlan {
    let mut plan = TransferPlan::default();
    for leaf in leaves {
        let duplicate = existing.contains(leaf);
        match operation {
            TransferOp::Copy => {
                if duplicate {
                    plan.skipped += 1;
                } else {
                    plan.to_insert.push(*leaf);
                }
            }
            TransferOp::Move => {
                if !in_source.contains(leaf) {
                    plan.skipped += 1;
                    continue;
                }
                if duplicate {
                    match on_duplicate {
                        DuplicatePolicy::Block | DuplicatePolicy::Skip => plan.skipped += 1,
                        DuplicatePolicy::Proceed | DuplicatePolicy::RemoveSourceOnly => {
                            plan.to_remove.push(*leaf)
                        }
                    }
                } else {
                    plan.to_insert.push(*leaf);
                    plan.to_remove.push(*leaf);
                }
            }
        }
    }
    plan
}

enum ExecOutcome {
    Done {
        inserted: u64,
        removed: u64,
        skipped: u64,
    },
    DuplicateBlocked,
}

#[derive(Clone)]
pub struct TransferService {
    db: DatabaseConnection,
    list_dao: ListDao,
    item_dao: ListItemDao,
    catalog_dao: CatalogDao,
}

impl TransferService {
    pub fn new(
        db: DatabaseConnection,
        list_dao: ListDao,
        item_dao: ListItemDao,
        catalog_dao: CatalogDao,
    ) -> Self {
        Self {
            db,
            list_dao,
            item_dao,
            catalog_dao,
        }
    }

    /// Flattens a composite item to the leaves a transfer operates on:
    /// collections to their member movies, series to their episodes,
    /// everything else to itself. An empty expansion is a valid result,
    /// not an error.
    pub async fn expand(&self, item_id: &Uuid, kind: ItemKind) -> Result<Vec<Leaf>, TransferError> {
        let leaves = match kind {
            ItemKind::Collection => self
                .catalog_dao
                .movie_ids_in_collection(item_id)
                .await?
                .into_iter()
                .map(|id| (id, ItemKind::Movie))
                .collect(),
            ItemKind::Series => self
                .catalog_dao
                .episode_ids_of_series(item_id)
                .await?
                .into_iter()
                .map(|id| (id, ItemKind::Episode))
                .collect(),
            _ => vec![(*item_id, kind)],
        };
        Ok(leaves)
    }

    /// Copies or moves one item (possibly expanding to many leaves)
    /// between two lists. All mutation happens in a single transaction.
    pub async fn transfer(&self, req: &TransferRequest) -> Result<TransferReport, TransferError> {
        self.validate_lists(&req.source_list_id, &req.target_list_id)
            .await?;
        if req.operation == TransferOp::Copy
            && req.on_duplicate == DuplicatePolicy::RemoveSourceOnly
        {
            return Err(TransferError::Validation(
                "remove_source_only applies to move operations only".to_string(),
            ));
        }
        if !req.item.item_kind.is_composite()
            && !self
                .catalog_dao
                .content_exists(&req.item.item_id, req.item.item_kind)
                .await?
        {
            return Err(TransferError::ItemNotFound);
        }

        let leaves = self.expand(&req.item.item_id, req.item.item_kind).await?;
        if leaves.is_empty() {
            return Ok(TransferReport::ok("nothing to transfer", 0, 0, 0));
        }

        let existing = self.probe_existing(&req.target_list_id, &leaves).await;
        if req.on_duplicate == DuplicatePolicy::Block
            && leaves.iter().any(|leaf| existing.contains(leaf))
        {
            return Ok(TransferReport::duplicate_found());
        }

        let attrs = self
            .source_attributes(&req.source_list_id, &leaves)
            .await?;
        if req.operation == TransferOp::Move && attrs.is_empty() {
            return Err(TransferError::ItemNotFound);
        }
        let in_source: HashSet<Leaf> = attrs.keys().copied().collect();

        match self
            .execute_with_retry(
                &req.source_list_id,
                &req.target_list_id,
                &leaves,
                existing,
                &in_source,
                req.operation,
                req.on_duplicate,
                &attrs,
            )
            .await?
        {
            ExecOutcome::DuplicateBlocked => Ok(TransferReport::duplicate_found()),
            ExecOutcome::Done {
                inserted,
                removed,
                skipped,
            } => Ok(match req.operation {
                TransferOp::Copy => TransferReport::ok("ok", inserted, 0, skipped),
                TransferOp::Move => TransferReport::ok("ok", 0, removed, skipped),
            }),
        }
    }

    /// Batched many-item transfer. Per-item resolution failures are
    /// reported in `errors` and excluded; the surviving batch commits as
    /// one transaction.
    pub async fn bulk_transfer(
        &self,
        req: &BulkTransferRequest,
    ) -> Result<BulkTransferReport, TransferError> {
        if req.on_duplicate == DuplicatePolicy::Block {
            return Err(TransferError::Validation(
                "bulk transfers require a resolved duplicate policy (skip, proceed, or remove_source_only)"
                    .to_string(),
            ));
        }
        if req.operation == TransferOp::Copy
            && req.on_duplicate == DuplicatePolicy::RemoveSourceOnly
        {
            return Err(TransferError::Validation(
                "remove_source_only applies to move operations only".to_string(),
            ));
        }
        if req.items.is_empty() {
            return Err(TransferError::Validation("items must not be empty".to_string()));
        }
        self.validate_lists(&req.source_list_id, &req.target_list_id)
            .await?;

        let mut errors = Vec::new();
        let mut seen: HashSet<Leaf> = HashSet::new();
        let mut resolved: Vec<(ItemRef, Vec<Leaf>)> = Vec::new();
        for item in &req.items {
            match self.resolve_item(item).await {
                Ok(leaves) => {
                    // Overlapping expansions (a movie named twice, two
                    // collections sharing a film) collapse to one leaf.
                    let fresh: Vec<Leaf> = leaves
                        .into_iter()
                        .filter(|leaf| seen.insert(*leaf))
                        .collect();
                    resolved.push((*item, fresh));
                }
                Err(message) => errors.push(ItemError {
                    item_id: item.item_id,
                    item_kind: item.item_kind,
                    message,
                }),
            }
        }

        let all_leaves: Vec<Leaf> = resolved
            .iter()
            .flat_map(|(_, leaves)| leaves.iter().copied())
            .collect();
        if all_leaves.is_empty() {
            return Ok(BulkTransferReport {
                errors,
                ..Default::default()
            });
        }

        let attrs = self
            .source_attributes(&req.source_list_id, &all_leaves)
            .await?;
        let in_source: HashSet<Leaf> = attrs.keys().copied().collect();

        let mut active: Vec<Leaf> = Vec::new();
        for (item, leaves) in &resolved {
            if req.operation == TransferOp::Move
                && !leaves.is_empty()
                && leaves.iter().all(|leaf| !in_source.contains(leaf))
            {
                errors.push(ItemError {
                    item_id: item.item_id,
                    item_kind: item.item_kind,
                    message: "not present in source list".to_string(),
                });
                continue;
            }
            active.extend(leaves.iter().copied());
        }
        if active.is_empty() {
            return Ok(BulkTransferReport {
                errors,
                ..Default::default()
            });
        }

        let existing = self
            .fetch_existing(&req.target_list_id, &active)
            .await?;

        match self
            .execute_with_retry(
                &req.source_list_id,
                &req.target_list_id,
                &active,
                existing,
                &in_source,
                req.operation,
                req.on_duplicate,
                &attrs,
            )
            .await?
        {
            // Unreachable: block policy is rejected up front in bulk mode.
            ExecOutcome::DuplicateBlocked => Err(TransferError::Conflict),
            ExecOutcome::Done {
                inserted,
                removed,
                skipped,
            } => Ok(BulkTransferReport {
                copied_count: if req.operation == TransferOp::Copy {
                    inserted
                } else {
                    0
                },
                moved_count: if req.operation == TransferOp::Move {
                    removed
                } else {
                    0
                },
                skipped_count: skipped,
                errors,
            }),
        }
    }

    async fn validate_lists(&self, source: &Uuid, target: &Uuid) -> Result<(), TransferError> {
        if source == target {
            return Err(TransferError::Validation(
                "source and target lists must differ".to_string(),
            ));
        }
        self.require_list(source).await?;
        self.require_list(target).await?;
        Ok(())
    }

    async fn require_list(&self, id: &Uuid) -> Result<(), TransferError> {
        self.list_dao
            .find_by_id(*id)
            .await
            .map(|_| ())
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => TransferError::ListNotFound,
                other => TransferError::Storage(other),
            })
    }

    /// Advisory duplicate probe: a failed read logs and yields "no
    /// duplicates" so it never blocks the primary operation. The unique
    /// index catches anything the probe missed.
    async fn probe_existing(&self, target: &Uuid, leaves: &[Leaf]) -> HashSet<Leaf> {
        match self.item_dao.find_active_many(&self.db, target, leaves).await {
            Ok(rows) => rows_to_pairs(rows),
            Err(err) => {
                tracing::warn!(error = %err, "duplicate check failed; continuing without it");
                HashSet::new()
            }
        }
    }

    /// Strict variant used for planning and for the post-conflict refresh.
    async fn fetch_existing(
        &self,
        target: &Uuid,
        leaves: &[Leaf],
    ) -> Result<HashSet<Leaf>, TransferError> {
        let rows = self
            .item_dao
            .find_active_many(&self.db, target, leaves)
            .await?;
        Ok(rows_to_pairs(rows))
    }

    async fn source_attributes(
        &self,
        source: &Uuid,
        leaves: &[Leaf],
    ) -> Result<SourceAttrs, TransferError> {
        let rows = self
            .item_dao
            .find_active_many(&self.db, source, leaves)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let kind = ItemKind::try_from(row.item_kind.as_str()).ok()?;
                Some(((row.item_id, kind), (row.watched, row.notes)))
            })
            .collect())
    }

    async fn resolve_item(&self, item: &ItemRef) -> Result<Vec<Leaf>, String> {
        if !item.item_kind.is_composite() {
            return match self
                .catalog_dao
                .content_exists(&item.item_id, item.item_kind)
                .await
            {
                Ok(true) => Ok(vec![(item.item_id, item.item_kind)]),
                Ok(false) => Err(format!("{} not found", item.item_kind.as_str())),
                Err(err) => Err(err.to_string()),
            };
        }
        self.expand(&item.item_id, item.item_kind)
            .await
            .map_err(|err| err.to_string())
    }

    /// Plans and applies the mutation set. A unique-violation on insert is
    /// the authoritative duplicate signal for a race the probe missed: the
    /// target state is refreshed and the plan recomputed once.
    #[allow(clippy::too_many_arguments)]
    async fn execute_with_retry(
        &self,
        source: &Uuid,
        target: &Uuid,
        leaves: &[Leaf],
        mut existing: HashSet<Leaf>,
        in_source: &HashSet<Leaf>,
        operation: TransferOp,
        on_duplicate: DuplicatePolicy,
        attrs: &SourceAttrs,
    ) -> Result<ExecOutcome, TransferError> {
        for attempt in 0..2 {
            let plan = plan_leaves(leaves, &existing, in_source, operation, on_duplicate);
            match self.apply_plan(source, target, &plan, attrs).await {
                Ok((inserted, removed)) => {
                    return Ok(ExecOutcome::Done {
                        inserted,
                        removed,
                        skipped: plan.skipped,
                    });
                }
                Err(err) if err.is_unique_violation() && attempt == 0 => {
                    if on_duplicate == DuplicatePolicy::Block {
                        return Ok(ExecOutcome::DuplicateBlocked);
                    }
                    existing = self.fetch_existing(target, leaves).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(TransferError::Conflict)
    }

    /// One transaction per call: the batched insert and the batched soft
    /// delete commit together or not at all.
    async fn apply_plan(
        &self,
        source: &Uuid,
        target: &Uuid,
        plan: &TransferPlan,
        attrs: &SourceAttrs,
    ) -> DaoResult<(u64, u64)> {
        if plan.to_insert.is_empty() && plan.to_remove.is_empty() {
            return Ok((0, 0));
        }
        let rows: Vec<list_item::ActiveModel> = plan
            .to_insert
            .iter()
            .map(|(item_id, kind)| {
                let (watched, notes) = attrs
                    .get(&(*item_id, *kind))
                    .cloned()
                    .unwrap_or((false, None));
                ListItemDao::new_entry(target, item_id, *kind, watched, notes)
            })
            .collect();

        let txn = self.db.begin().await.map_err(DaoLayerError::Db)?;
        let inserted = self.item_dao.insert_entries(&txn, rows).await?;
        let removed = self
            .item_dao
            .soft_delete_many(&txn, source, &plan.to_remove)
            .await?;
        txn.commit().await.map_err(DaoLayerError::Db)?;
        Ok((inserted, removed))
    }
}

fn rows_to_pairs(rows: Vec<list_item::Model>) -> HashSet<Leaf> {
    rows.into_iter()
        .filter_map(|row| {
            let kind = ItemKind::try_from(row.item_kind.as_str()).ok()?;
            Some((row.item_id, kind))
        })
        .collect()
}
