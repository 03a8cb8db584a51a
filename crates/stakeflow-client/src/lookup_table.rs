//! Address lookup table management.
//!
//! Batches reference far more accounts than fit in a legacy message. A lookup
//! table owned by the connected wallet compresses them. The table address is
//! persisted through a [`LookupTableStore`] and reused across sessions. Tables
//! are append-only: this module creates and extends, it never removes entries.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use solana_sdk::address_lookup_table::instruction::{create_lookup_table, extend_lookup_table};
use solana_sdk::address_lookup_table::state::AddressLookupTable;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::{debug, info, warn};

use crate::config::{LookupTableConfig, PollConfig};
use crate::error::{ClientError, Result};
use crate::rpc::LedgerRpc;
use crate::submit::{TxOutcome, send_and_confirm};
use crate::transaction::build_versioned_transaction;

/// Maximum entries in one lookup table.
pub const MAX_TABLE_ADDRESSES: usize = 256;

// ============================================================================
// Store
// ============================================================================

/// Persists the lookup table address of each wallet.
pub trait LookupTableStore: Send + Sync {
    /// Table recorded for `authority`.
    fn load(&self, authority: &Pubkey) -> Result<Option<Pubkey>>;

    /// Record `table` for `authority`.
    fn save(&self, authority: &Pubkey, table: &Pubkey) -> Result<()>;

    /// Drop the record for `authority`.
    fn forget(&self, authority: &Pubkey) -> Result<()>;
}

/// In-memory store, for tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryLookupTableStore {
    tables: Mutex<HashMap<Pubkey, Pubkey>>,
}

impl MemoryLookupTableStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ClientError {
    ClientError::Store("lookup table store lock poisoned".into())
}

impl LookupTableStore for MemoryLookupTableStore {
    fn load(&self, authority: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(self.tables.lock().map_err(poisoned)?.get(authority).copied())
    }

    fn save(&self, authority: &Pubkey, table: &Pubkey) -> Result<()> {
        self.tables.lock().map_err(poisoned)?.insert(*authority, *table);
        Ok(())
    }

    fn forget(&self, authority: &Pubkey) -> Result<()> {
        self.tables.lock().map_err(poisoned)?.remove(authority);
        Ok(())
    }
}

/// JSON file mapping wallet address to table address.
#[derive(Debug)]
pub struct FileLookupTableStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLookupTableStore {
    /// Store backed by `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Store(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ClientError::Store(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Store(format!("{}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(map)
            .map_err(|e| ClientError::Store(e.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| ClientError::Store(format!("{}: {e}", self.path.display())))
    }
}

impl LookupTableStore for FileLookupTableStore {
    fn load(&self, authority: &Pubkey) -> Result<Option<Pubkey>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let map = self.read_map()?;
        match map.get(&authority.to_string()) {
            Some(table) => table
                .parse()
                .map(Some)
                .map_err(|e| ClientError::Store(format!("bad table address {table}: {e}"))),
            None => Ok(None),
        }
    }

    fn save(&self, authority: &Pubkey, table: &Pubkey) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut map = self.read_map()?;
        map.insert(authority.to_string(), table.to_string());
        self.write_map(&map)
    }

    fn forget(&self, authority: &Pubkey) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut map = self.read_map()?;
        if map.remove(&authority.to_string()).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Addresses worth seeding a new table with.
pub fn seed_addresses(platform_config: &Pubkey, fee_collector: &Pubkey, owner: &Pubkey) -> Vec<Pubkey> {
    vec![
        *platform_config,
        *fee_collector,
        stakeflow_interface::SPL_TOKEN_PROGRAM_ID,
        stakeflow_interface::SPL_TOKEN_2022_PROGRAM_ID,
        stakeflow_interface::ASSOCIATED_TOKEN_PROGRAM_ID,
        stakeflow_interface::SYSTEM_PROGRAM_ID,
        *owner,
    ]
}

/// Addresses of `wanted` not yet in `existing`, deduplicated, capped so the
/// table stays within [`MAX_TABLE_ADDRESSES`].
pub fn new_addresses(existing: &[Pubkey], wanted: &[Pubkey]) -> Vec<Pubkey> {
    let mut seen: HashSet<Pubkey> = existing.iter().copied().collect();
    let room = MAX_TABLE_ADDRESSES.saturating_sub(existing.len());
    wanted
        .iter()
        .filter(|address| seen.insert(**address))
        .copied()
        .take(room)
        .collect()
}

/// Decode a lookup table account; `None` when deactivated or empty.
pub fn decode_table(key: Pubkey, data: &[u8]) -> Result<Option<AddressLookupTableAccount>> {
    let table = AddressLookupTable::deserialize(data)
        .map_err(|e| ClientError::Rpc(format!("lookup table {key} is malformed: {e}")))?;
    if table.meta.deactivation_slot != u64::MAX || table.addresses.is_empty() {
        return Ok(None);
    }
    Ok(Some(AddressLookupTableAccount {
        key,
        addresses: table.addresses.to_vec(),
    }))
}

/// Discovers, creates and extends the wallet's lookup table.
pub struct LookupTableManager<'a, R: LedgerRpc + ?Sized> {
    rpc: &'a R,
    store: &'a dyn LookupTableStore,
    config: &'a LookupTableConfig,
    poll: &'a PollConfig,
}

impl<'a, R: LedgerRpc + ?Sized> LookupTableManager<'a, R> {
    /// New manager.
    pub fn new(
        rpc: &'a R,
        store: &'a dyn LookupTableStore,
        config: &'a LookupTableConfig,
        poll: &'a PollConfig,
    ) -> Self {
        Self {
            rpc,
            store,
            config,
            poll,
        }
    }

    /// Resolve the stored table of `authority`, if it is still usable.
    pub async fn discover(&self, authority: &Pubkey) -> Result<Option<AddressLookupTableAccount>> {
        let Some(key) = self.store.load(authority)? else {
            return Ok(None);
        };
        let Some(account) = self.rpc.get_account(&key).await? else {
            warn!(table = %key, "stored lookup table no longer exists");
            self.store.forget(authority)?;
            return Ok(None);
        };
        let table = decode_table(key, &account.data)?;
        match &table {
            Some(table) => debug!(table = %key, entries = table.addresses.len(), "lookup table discovered"),
            None => {
                warn!(table = %key, "stored lookup table is empty or deactivated");
                self.store.forget(authority)?;
            }
        }
        Ok(table)
    }

    /// Create a table seeded with `seeds` and persist its address.
    pub async fn create(
        &self,
        signer: &Keypair,
        seeds: &[Pubkey],
    ) -> Result<AddressLookupTableAccount> {
        let authority = signer.pubkey();
        let slot = self.rpc.get_slot().await?;
        let (create_ix, key) = create_lookup_table(authority, authority, slot);

        let initial = new_addresses(&[], seeds);
        let first_chunk: Vec<Pubkey> = initial
            .iter()
            .take(self.chunk_size())
            .copied()
            .collect();
        let extend_ix = extend_lookup_table(key, authority, Some(authority), first_chunk.clone());
        self.submit(signer, vec![create_ix, extend_ix]).await?;
        self.store.save(&authority, &key)?;
        info!(table = %key, entries = first_chunk.len(), "lookup table created");

        let table = AddressLookupTableAccount {
            key,
            addresses: first_chunk,
        };
        let table = self.append(signer, table, &initial).await?;
        tokio::time::sleep(self.config.activation_delay()).await;
        Ok(table)
    }

    /// Extend `table` with whichever of `wanted` it lacks.
    ///
    /// Waits for activation when anything was added.
    pub async fn extend(
        &self,
        signer: &Keypair,
        table: AddressLookupTableAccount,
        wanted: &[Pubkey],
    ) -> Result<AddressLookupTableAccount> {
        let before = table.addresses.len();
        let table = self.append(signer, table, wanted).await?;
        if table.addresses.len() > before {
            tokio::time::sleep(self.config.activation_delay()).await;
        }
        Ok(table)
    }

    /// Table covering `referenced`, creating or extending as needed.
    pub async fn ensure(
        &self,
        signer: &Keypair,
        seeds: &[Pubkey],
        referenced: &[Pubkey],
    ) -> Result<AddressLookupTableAccount> {
        let authority = signer.pubkey();
        let table = match self.discover(&authority).await? {
            Some(table) => table,
            None => self.create(signer, seeds).await?,
        };
        self.extend(signer, table, referenced).await
    }

    async fn append(
        &self,
        signer: &Keypair,
        mut table: AddressLookupTableAccount,
        wanted: &[Pubkey],
    ) -> Result<AddressLookupTableAccount> {
        let additions = new_addresses(&table.addresses, wanted);
        if additions.is_empty() {
            return Ok(table);
        }
        let authority = signer.pubkey();
        for chunk in additions.chunks(self.chunk_size()) {
            let ix = extend_lookup_table(table.key, authority, Some(authority), chunk.to_vec());
            self.submit(signer, vec![ix]).await?;
            table.addresses.extend_from_slice(chunk);
            debug!(table = %table.key, added = chunk.len(), total = table.addresses.len(), "lookup table extended");
        }
        Ok(table)
    }

    async fn submit(&self, signer: &Keypair, instructions: Vec<Instruction>) -> Result<()> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = build_versioned_transaction(signer, &instructions, &[], blockhash)?;
        match send_and_confirm(self.rpc, &tx, self.poll).await? {
            TxOutcome::Confirmed(_) => Ok(()),
            other => Err(ClientError::Rpc(format!(
                "lookup table transaction not confirmed: {other:?}"
            ))),
        }
    }

    fn chunk_size(&self) -> usize {
        self.config.extend_chunk_size.max(1)
    }
}
