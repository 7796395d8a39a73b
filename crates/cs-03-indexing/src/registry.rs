//! # Service Registry
//!
//! Owns the store handle, allocates service prefixes, and drives every
//! registered index through block connects and reorgs.
//!
//! ## Commit Discipline
//!
//! `commit_block` asks each service for its mutations in registration
//! order (which `register` has validated to be dependency order), appends
//! each service's tip update, and writes the whole block as ONE atomic
//! batch. Any error aborts before the batch is submitted, so a failed
//! commit leaves the store exactly as it was and the same block can be
//! retried. `handle_reorg` is symmetric for disconnects.

use std::sync::Arc;

use parking_lot::Mutex;

use cs_02_kv_store::{BatchOperation, KeyValueStore};
use shared_types::{hash_to_hex, Hash, Network};

use crate::error::IndexingError;
use crate::schema::{self, ServicePrefix, FIRST_SERVICE_PREFIX, SCHEMA_VERSION};
use crate::service::{ChainBlock, IndexService, ServiceTip};

struct RegisteredService {
    name: &'static str,
    service: Arc<dyn IndexService>,
}

/// Registry of index services sharing one prefix-partitioned store.
pub struct ServiceRegistry {
    store: Arc<dyn KeyValueStore>,
    network: Network,
    services: Mutex<Vec<RegisteredService>>,
}

impl ServiceRegistry {
    /// Opens the registry over a store, stamping the schema version into
    /// a fresh store and refusing one written by a different revision.
    pub fn open(store: Arc<dyn KeyValueStore>, network: Network) -> Result<Self, IndexingError> {
        match store.get(&schema::version_key())? {
            Some(bytes) => {
                let found = decode_u32_be(&bytes).ok_or_else(|| IndexingError::Corruption {
                    key: hex::encode(schema::version_key()),
                    reason: format!("schema version must be 4 bytes, got {}", bytes.len()),
                })?;
                if found != SCHEMA_VERSION {
                    return Err(IndexingError::SchemaVersionMismatch {
                        found,
                        expected: SCHEMA_VERSION,
                    });
                }
            }
            None => {
                store.put(&schema::version_key(), &SCHEMA_VERSION.to_be_bytes())?;
            }
        }
        tracing::info!(
            "[cs-03] opened index registry on {} (schema v{})",
            network,
            SCHEMA_VERSION
        );
        Ok(Self {
            store,
            network,
            services: Mutex::new(Vec::new()),
        })
    }

    /// Registers an index service.
    ///
    /// `dependencies` must already be registered — registration order is
    /// dependency order, and `commit_block` preserves it. The service's
    /// 2-byte prefix is retrieved if this name was ever registered
    /// before, otherwise allocated from the persisted counter; either
    /// way the constructor receives the stable prefix.
    pub fn register<S, F>(
        &self,
        name: &'static str,
        dependencies: &[&str],
        build: F,
    ) -> Result<Arc<S>, IndexingError>
    where
        S: IndexService + 'static,
        F: FnOnce(ServicePrefix) -> Result<S, IndexingError>,
    {
        let mut services = self.services.lock();

        if services.iter().any(|s| s.name == name) {
            return Err(IndexingError::DuplicateService { name: name.into() });
        }
        for dependency in dependencies {
            if !services.iter().any(|s| s.name == *dependency) {
                return Err(IndexingError::MissingDependency {
                    service: name.into(),
                    dependency: (*dependency).into(),
                });
            }
        }

        let prefix = self.load_or_allocate_prefix(name)?;
        let service = Arc::new(build(prefix)?);
        debug_assert_eq!(service.name(), name, "registered name must match name()");

        services.push(RegisteredService {
            name,
            service: service.clone(),
        });
        tracing::info!(
            "[cs-03] registered index service '{}' with prefix {:#06x}",
            name,
            prefix.get()
        );
        Ok(service)
    }

    /// Allocation is an atomic read-modify-write: one batch persists both
    /// the assignment and the bumped counter, under the registry lock
    /// held by `register`.
    fn load_or_allocate_prefix(&self, name: &str) -> Result<ServicePrefix, IndexingError> {
        let assignment_key = schema::prefix_key(name);
        if let Some(bytes) = self.store.get(&assignment_key)? {
            let value = decode_u16_be(&bytes).ok_or_else(|| IndexingError::Corruption {
                key: hex::encode(&assignment_key),
                reason: format!("prefix assignment must be 2 bytes, got {}", bytes.len()),
            })?;
            return Ok(ServicePrefix::new(value));
        }

        let counter_key = schema::prefix_counter_key();
        let next = match self.store.get(&counter_key)? {
            None => FIRST_SERVICE_PREFIX,
            Some(bytes) => decode_u16_be(&bytes).ok_or_else(|| IndexingError::Corruption {
                key: hex::encode(&counter_key),
                reason: format!("prefix counter must be 2 bytes, got {}", bytes.len()),
            })?,
        };
        // 0xffff stays unallocated so every sub-index range has an upper
        // bound inside the u16 keyspace.
        if next == u16::MAX {
            return Err(IndexingError::PrefixExhausted);
        }

        let prefix = ServicePrefix::new(next);
        self.store.write_batch(vec![
            BatchOperation::put(assignment_key, prefix.to_bytes()),
            BatchOperation::put(counter_key, (next + 1).to_be_bytes()),
        ])?;
        Ok(prefix)
    }

    /// Names of the registered services, in registration order.
    pub fn service_names(&self) -> Vec<&'static str> {
        self.services.lock().iter().map(|s| s.name).collect()
    }

    /// The persisted tip for a registered service, or `{0, genesis}` if
    /// the service has never committed a block.
    pub fn service_tip(&self, name: &str) -> Result<ServiceTip, IndexingError> {
        let services = self.services.lock();
        if !services.iter().any(|s| s.name == name) {
            return Err(IndexingError::UnknownService { name: name.into() });
        }
        drop(services);
        self.load_tip(name)
    }

    fn load_tip(&self, name: &str) -> Result<ServiceTip, IndexingError> {
        let key = schema::tip_key(name);
        match self.store.get(&key)? {
            None => Ok(ServiceTip::new(0, self.network.genesis_hash())),
            Some(bytes) => ServiceTip::decode(&bytes).ok_or_else(|| IndexingError::Corruption {
                key: hex::encode(&key),
                reason: format!("tip value must be 36 bytes, got {}", bytes.len()),
            }),
        }
    }

    /// Connects one block: every service's mutations plus every tip
    /// update land in one atomic batch, or nothing lands at all.
    pub fn commit_block(&self, block: &ChainBlock) -> Result<(), IndexingError> {
        let services = self.services.lock();
        let tip = ServiceTip::new(block.height, block.hash());

        let mut batch = Vec::new();
        for registered in services.iter() {
            batch.extend(registered.service.on_block(block)?);
            batch.push(BatchOperation::put(
                schema::tip_key(registered.name),
                tip.encode(),
            ));
        }
        self.store.write_batch(batch)?;

        tracing::debug!(
            "[cs-03] committed block {} at height {} across {} service(s)",
            hash_to_hex(&tip.hash),
            block.height,
            services.len()
        );
        Ok(())
    }

    /// Disconnects `orphaned_newest_first` down to `ancestor_hash`.
    ///
    /// The orphan list is validated against the indexed chain before any
    /// service runs: the newest orphan must be every service's tip, the
    /// list must chain parent-to-child without gaps, and the oldest
    /// orphan's parent must be the ancestor. Compensations and tip
    /// resets land as one atomic batch.
    pub fn handle_reorg(
        &self,
        ancestor_hash: &Hash,
        orphaned_newest_first: &[ChainBlock],
    ) -> Result<(), IndexingError> {
        let services = self.services.lock();

        let newest = orphaned_newest_first
            .first()
            .ok_or_else(|| IndexingError::InvalidReorg {
                reason: "empty orphan list".into(),
            })?;
        let oldest = orphaned_newest_first
            .last()
            .ok_or_else(|| IndexingError::InvalidReorg {
                reason: "empty orphan list".into(),
            })?;

        for pair in orphaned_newest_first.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            if newer.header().prev_hash != older.hash() || newer.height != older.height + 1 {
                return Err(IndexingError::InvalidReorg {
                    reason: format!(
                        "orphan list breaks between heights {} and {}",
                        newer.height, older.height
                    ),
                });
            }
        }
        if oldest.header().prev_hash != *ancestor_hash {
            return Err(IndexingError::InvalidReorg {
                reason: format!(
                    "oldest orphan at height {} does not descend from the ancestor",
                    oldest.height
                ),
            });
        }
        let ancestor_height =
            oldest
                .height
                .checked_sub(1)
                .ok_or_else(|| IndexingError::InvalidReorg {
                    reason: "cannot orphan the genesis block".into(),
                })?;

        let expected_tip = ServiceTip::new(newest.height, newest.hash());
        for registered in services.iter() {
            let tip = self.load_tip(registered.name)?;
            if tip != expected_tip {
                return Err(IndexingError::InvalidReorg {
                    reason: format!(
                        "service '{}' tip is height {} ({}), reorg disconnects from height {}",
                        registered.name,
                        tip.height,
                        hash_to_hex(&tip.hash),
                        expected_tip.height
                    ),
                });
            }
        }

        let new_tip = ServiceTip::new(ancestor_height, *ancestor_hash);
        let mut batch = Vec::new();
        for registered in services.iter() {
            batch.extend(
                registered
                    .service
                    .on_reorg(ancestor_hash, orphaned_newest_first)?,
            );
            batch.push(BatchOperation::put(
                schema::tip_key(registered.name),
                new_tip.encode(),
            ));
        }
        self.store.write_batch(batch)?;

        tracing::info!(
            "[cs-03] reorg: disconnected {} block(s) back to {} at height {}",
            orphaned_newest_first.len(),
            hash_to_hex(ancestor_hash),
            ancestor_height
        );
        Ok(())
    }
}

fn decode_u32_be(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn decode_u16_be(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.try_into().ok()?))
}
