//! StoreEngine — owns ConnectionPool, implements IIndexStore, startup
//! pragma configuration, migrations, session lifecycle.

use std::path::Path;

use lore_core::config::StoreConfig;
use lore_core::errors::LoreResult;
use lore_core::intent::QueryIntent;
use lore_core::models::{
    ClaimState, ContextPack, Durability, Entity, EvidenceRecord, Fact, SemanticClaim,
};
use lore_core::traits::{ClaimEmbedding, IIndexStore, StoreOutcome};
use lore_core::types::{ClaimId, EntityId, PackId, QueryId};

use crate::durability;
use crate::migrations;
use crate::pool::ConnectionPool;

/// The main index store. Owns the connection pool and provides the
/// full IIndexStore interface.
pub struct StoreEngine {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
    config: StoreConfig,
}

impl StoreEngine {
    /// Open an index store backed by a file on disk.
    pub fn open(path: &Path, config: &StoreConfig) -> LoreResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size)?;
        let engine = Self {
            pool,
            use_read_pool: true,
            config: config.clone(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory index store (for testing).
    /// Routes all reads through the writer since in-memory read pool
    /// connections are isolated databases that can't see writer's changes.
    pub fn open_in_memory() -> LoreResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let engine = Self {
            pool,
            use_read_pool: false,
            config: StoreConfig::default(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// In-memory store with non-default durability thresholds. Lets
    /// tests promote entities without dozens of sessions.
    pub fn open_in_memory_with(config: &StoreConfig) -> LoreResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let engine = Self {
            pool,
            use_read_pool: false,
            config: config.clone(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Run migrations on the writer connection.
    fn initialize(&self) -> LoreResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    /// Get a reference to the connection pool (for the ledger's async
    /// append path and other advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Whether reads route through the read pool (file-backed) or the
    /// writer (in-memory). Subsystems sharing the pool need the same
    /// routing.
    pub fn uses_read_pool(&self) -> bool {
        self.use_read_pool
    }

    /// Truncate the WAL into the main database file. Called at the end
    /// of maintenance passes that wrote; a no-op for in-memory stores.
    pub fn checkpoint(&self) -> LoreResult<()> {
        if !self.use_read_pool {
            return Ok(());
        }
        self.pool
            .writer
            .with_conn_sync(crate::queries::maintenance::wal_checkpoint)
    }

    /// Run SQLite's integrity check. Returns false on corruption.
    pub fn verify_integrity(&self) -> LoreResult<bool> {
        self.pool
            .writer
            .with_conn_sync(crate::queries::maintenance::integrity_check)
    }

    /// Execute a read-only query on the best available connection.
    /// File-backed: uses the read pool (no writer contention).
    /// In-memory: uses the writer (read pool is isolated).
    fn with_reader<F, T>(&self, f: F) -> LoreResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> LoreResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }
}

impl IIndexStore for StoreEngine {
    fn admit(&self, entity: &Entity, facts: &[Fact]) -> LoreResult<StoreOutcome> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::entity_ops::admit(conn, entity, facts))
    }

    fn entity(&self, id: &EntityId) -> LoreResult<Option<Entity>> {
        self.with_reader(|conn| crate::queries::entity_ops::get_entity(conn, id))
    }

    fn entities(&self) -> LoreResult<Vec<Entity>> {
        self.with_reader(crate::queries::entity_ops::all_entities)
    }

    fn entities_in_path(&self, prefix: &str) -> LoreResult<Vec<Entity>> {
        self.with_reader(|conn| crate::queries::entity_ops::entities_in_path(conn, prefix))
    }

    fn remove_entity(&self, id: &EntityId) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::entity_ops::remove_entity(conn, id))
    }

    fn set_durability(&self, id: &EntityId, durability: Durability) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::entity_ops::set_durability(conn, id, durability))
    }

    fn facts(&self, entity_id: &EntityId) -> LoreResult<Vec<Fact>> {
        self.with_reader(|conn| crate::queries::fact_ops::facts_for_entity(conn, entity_id))
    }

    fn put_claim(&self, claim: &SemanticClaim) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::claim_ops::upsert_claim(conn, claim))
    }

    fn claim(&self, id: &ClaimId) -> LoreResult<Option<SemanticClaim>> {
        self.with_reader(|conn| crate::queries::claim_ops::get_claim(conn, id))
    }

    fn claims_for_entity(&self, entity_id: &EntityId) -> LoreResult<Vec<SemanticClaim>> {
        self.with_reader(|conn| crate::queries::claim_ops::claims_for_entity(conn, entity_id))
    }

    fn claims_in_state(&self, state: ClaimState) -> LoreResult<Vec<SemanticClaim>> {
        self.with_reader(|conn| crate::queries::claim_ops::claims_in_state(conn, state))
    }

    fn set_claim_state(&self, id: &ClaimId, state: ClaimState) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::claim_ops::set_claim_state(conn, id, state))
    }

    fn search_text(
        &self,
        query: &str,
        limit: usize,
    ) -> LoreResult<Vec<(Option<ClaimId>, EntityId, f64)>> {
        self.with_reader(|conn| crate::queries::claim_ops::search_text(conn, query, limit))
    }

    fn put_evidence(&self, record: &EvidenceRecord) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::evidence_ops::insert_evidence(conn, record))
    }

    fn evidence_for_claim(&self, claim_id: &ClaimId) -> LoreResult<Vec<EvidenceRecord>> {
        self.with_reader(|conn| crate::queries::evidence_ops::evidence_for_claim(conn, claim_id))
    }

    fn put_embedding(&self, embedding: &ClaimEmbedding) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::embedding_ops::upsert_embedding(conn, embedding))
    }

    fn embeddings(&self) -> LoreResult<Vec<ClaimEmbedding>> {
        self.with_reader(crate::queries::embedding_ops::all_embeddings)
    }

    fn begin_session(&self) -> LoreResult<u64> {
        self.pool.writer.with_conn_sync(|conn| {
            let session = crate::queries::session_ops::begin_session(conn)?;
            let (promoted_stable, promoted_immutable) =
                durability::apply_promotions(conn, session, &self.config)?;
            if promoted_stable > 0 || promoted_immutable > 0 {
                tracing::debug!(
                    session,
                    promoted_stable,
                    promoted_immutable,
                    "durability promotions applied"
                );
            }
            Ok(session)
        })
    }

    fn current_session(&self) -> LoreResult<u64> {
        self.with_reader(crate::queries::session_ops::current_session)
    }

    fn change_sessions(&self, entity_id: &EntityId) -> LoreResult<Vec<u64>> {
        self.with_reader(|conn| crate::queries::session_ops::change_sessions(conn, entity_id))
    }

    fn record_query(
        &self,
        query_id: &QueryId,
        text: &str,
        intent: QueryIntent,
        revision: u64,
    ) -> LoreResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            crate::queries::pack_ops::record_query(conn, query_id, text, intent, revision)
        })
    }

    fn query_exists(&self, query_id: &QueryId) -> LoreResult<bool> {
        self.with_reader(|conn| crate::queries::pack_ops::query_exists(conn, query_id))
    }

    fn put_pack(&self, pack: &ContextPack, query_id: &QueryId) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| crate::queries::pack_ops::put_pack(conn, pack, query_id))
    }

    fn pack(&self, id: &PackId) -> LoreResult<Option<ContextPack>> {
        self.with_reader(|conn| crate::queries::pack_ops::get_pack(conn, id))
    }

    fn packs_for_query(&self, query_id: &QueryId) -> LoreResult<Vec<ContextPack>> {
        self.with_reader(|conn| crate::queries::pack_ops::packs_for_query(conn, query_id))
    }

    fn vacuum(&self) -> LoreResult<()> {
        self.pool
            .writer
            .with_conn_sync(crate::queries::maintenance::full_vacuum)
    }
}
