//! # Redis
//!
//! Shared durable store used by every server instance.
//!
//! ## Layout
//!
//! - `{prefix}:entry:{address}`: hash with `version` (decimal) and `data` (borsh `KeypairEntry`)
//! - `{prefix}:queue`: sorted set of every address scored by queue position
//! - `{prefix}:open`: the subset that is `Available` and unpinned
//! - `{prefix}:reserved`: the subset currently `Reserved`
//! - `{prefix}:assigned:{wallet}`: entries pinned to `wallet`, any state
//! - `{prefix}:project:{mint}`: borsh `PendingProjectRecord`, expires with `EX`
//! - `{prefix}:token:{mint}`: borsh `TokenRecord`
//! - `{prefix}:token-name:{lower}` / `{prefix}:token-symbol:{lower}`: mint of the latest launch
//!
//! ## Atomicity
//!
//! Entry transitions run as a Lua script comparing the stored `version` with
//! the caller's revision, so the check, the write and the index updates are
//! one Redis command. Allocation and the expiry sweep read only the index
//! sets, never the whole queue.
//! Redis executes scripts serially which gives the compare-and-swap semantics
//! the reservation manager relies on across processes.

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use redis::{aio::ConnectionManager, Client, Script};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::{
    error::StoreError,
    state::{EntryFilter, KeypairStore, NameConflict, PendingProjectStore, TokenRegistry},
    types::{KeypairEntry, KeypairState, PendingProjectRecord, TokenRecord},
};

// KEYS: entry, queue, open, reserved, assigned
// ARGV: version, data, score, address, open?, reserved?, assigned?
const INSERT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then return 0 end
redis.call('HSET', KEYS[1], 'version', ARGV[1], 'data', ARGV[2])
redis.call('ZADD', KEYS[2], ARGV[3], ARGV[4])
if ARGV[5] == '1' then redis.call('ZADD', KEYS[3], ARGV[3], ARGV[4]) end
if ARGV[6] == '1' then redis.call('ZADD', KEYS[4], ARGV[3], ARGV[4]) end
if ARGV[7] == '1' then redis.call('ZADD', KEYS[5], ARGV[3], ARGV[4]) end
return 1
";

// KEYS: entry, open, reserved, previous assigned, next assigned
// ARGV: current version, next version, data, score, address, open?, reserved?,
//       was assigned?, is assigned?
const CAS_SCRIPT: &str = r"
local current = redis.call('HGET', KEYS[1], 'version')
if current == false then return -1 end
if current ~= ARGV[1] then return 0 end
redis.call('HSET', KEYS[1], 'version', ARGV[2], 'data', ARGV[3])
local score, address = ARGV[4], ARGV[5]
if ARGV[6] == '1' then redis.call('ZADD', KEYS[2], score, address) else redis.call('ZREM', KEYS[2], address) end
if ARGV[7] == '1' then redis.call('ZADD', KEYS[3], score, address) else redis.call('ZREM', KEYS[3], address) end
if ARGV[8] == '1' then redis.call('ZREM', KEYS[4], address) end
if ARGV[9] == '1' then redis.call('ZADD', KEYS[5], score, address) end
return 1
";

/// Placeholder key for entries without a pin; the scripts never touch it
const UNASSIGNED_KEY: &str = "unassigned";

/// Entries fetched per pipeline round trip while scanning the queue
const SCAN_CHUNK: usize = 128;

pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
    insert_script: Script,
    cas_script: Script,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, prefix: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self::with_connection(connection, prefix))
    }

    pub fn with_connection(connection: ConnectionManager, prefix: &str) -> Self {
        Self {
            connection,
            prefix: prefix.to_string(),
            insert_script: Script::new(INSERT_SCRIPT),
            cas_script: Script::new(CAS_SCRIPT),
        }
    }

    fn entry_key(&self, address: &Pubkey) -> String {
        format!("{}:entry:{}", self.prefix, address)
    }

    fn queue_key(&self) -> String {
        format!("{}:queue", self.prefix)
    }

    fn open_key(&self) -> String {
        format!("{}:open", self.prefix)
    }

    fn reserved_key(&self) -> String {
        format!("{}:reserved", self.prefix)
    }

    fn assigned_key(&self, assigned_to: Option<&Pubkey>) -> String {
        match assigned_to {
            Some(wallet) => format!("{}:assigned:{}", self.prefix, wallet),
            None => format!("{}:{}", self.prefix, UNASSIGNED_KEY),
        }
    }

    /// The sorted set holding exactly the entries `filter` selects, if one is kept.
    fn index_key(&self, filter: &EntryFilter) -> Option<String> {
        match filter {
            EntryFilter::All => Some(self.queue_key()),
            EntryFilter::OpenPool => Some(self.open_key()),
            EntryFilter::AssignedTo(wallet) => Some(self.assigned_key(Some(wallet))),
            EntryFilter::State(KeypairState::Reserved) => Some(self.reserved_key()),
            EntryFilter::State(_) => None,
        }
    }

    fn project_key(&self, mint: &Pubkey) -> String {
        format!("{}:project:{}", self.prefix, mint)
    }

    fn token_key(&self, mint: &Pubkey) -> String {
        format!("{}:token:{}", self.prefix, mint)
    }

    fn token_name_key(&self, name: &str) -> String {
        format!("{}:token-name:{}", self.prefix, name.to_lowercase())
    }

    fn token_symbol_key(&self, symbol: &str) -> String {
        format!("{}:token-symbol:{}", self.prefix, symbol.to_lowercase())
    }

    /// Reads one page of an index set in queue order.
    async fn indexed_entries(&self, index_key: &str, offset: usize, limit: usize) -> Result<Vec<KeypairEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = offset
            .checked_add(limit - 1)
            .and_then(|last| i64::try_from(last).ok())
            .unwrap_or(-1);
        let mut conn = self.connection.clone();
        let addresses: Vec<String> = redis::cmd("ZRANGE")
            .arg(index_key)
            .arg(offset)
            .arg(stop)
            .query_async(&mut conn)
            .await?;
        self.fetch_entries(&addresses).await
    }

    async fn fetch_entries(&self, addresses: &[String]) -> Result<Vec<KeypairEntry>, StoreError> {
        let mut conn = self.connection.clone();
        let mut out = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(SCAN_CHUNK) {
            let mut pipe = redis::pipe();
            for address in chunk {
                pipe.cmd("HGET").arg(format!("{}:entry:{}", self.prefix, address)).arg("data");
            }
            let blobs: Vec<Option<Vec<u8>>> = pipe.query_async(&mut conn).await?;

            for (address, blob) in chunk.iter().zip(blobs) {
                let Some(bytes) = blob else {
                    debug!("Index member {} has no entry hash, skipping", address);
                    continue;
                };
                out.push(decode::<KeypairEntry>(address, &bytes)?);
            }
        }
        Ok(out)
    }

    /// Walks the whole queue. Only used for filters without an index set.
    async fn filtered_walk(&self, filter: EntryFilter, offset: usize, limit: usize) -> Result<Vec<KeypairEntry>, StoreError> {
        let mut conn = self.connection.clone();
        let addresses: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.queue_key())
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        let entries = self.fetch_entries(&addresses).await?;
        Ok(entries
            .into_iter()
            .filter(|e| filter.matches(e))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn token_by_index(&self, index_key: String) -> Result<Option<TokenRecord>, StoreError> {
        let mut conn = self.connection.clone();
        let mint: Option<String> = redis::cmd("GET").arg(&index_key).query_async(&mut conn).await?;
        let Some(mint) = mint else {
            return Ok(None);
        };
        let mint = Pubkey::from_str(&mint).map_err(|e| StoreError::Corrupt {
            key: index_key,
            reason: e.to_string(),
        })?;
        TokenRegistry::get(self, &mint).await
    }
}

/// Membership of `entry` in the open and reserved index sets.
fn index_flags(entry: &KeypairEntry) -> (bool, bool) {
    (
        EntryFilter::OpenPool.matches(entry),
        entry.state == KeypairState::Reserved,
    )
}

fn flag(set: bool) -> u8 {
    u8::from(set)
}

fn decode<T: BorshDeserialize>(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
    T::try_from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn encode<T: BorshSerialize>(key: &str, value: &T) -> Result<Vec<u8>, StoreError> {
    value.try_to_vec().map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl KeypairStore for RedisStore {
    async fn insert(&self, entry: KeypairEntry) -> Result<(), StoreError> {
        let key = self.entry_key(&entry.address);
        let data = encode(&key, &entry)?;
        let (open, reserved) = index_flags(&entry);
        let mut conn = self.connection.clone();
        let inserted: i64 = self
            .insert_script
            .key(&key)
            .key(self.queue_key())
            .key(self.open_key())
            .key(self.reserved_key())
            .key(self.assigned_key(entry.assigned_to.as_ref()))
            .arg(entry.version)
            .arg(data)
            .arg(entry.queue_position)
            .arg(entry.address.to_string())
            .arg(flag(open))
            .arg(flag(reserved))
            .arg(flag(entry.assigned_to.is_some()))
            .invoke_async(&mut conn)
            .await?;
        if inserted == 0 {
            return Err(StoreError::AlreadyExists(entry.address.to_string()));
        }
        Ok(())
    }

    async fn get(&self, address: &Pubkey) -> Result<Option<KeypairEntry>, StoreError> {
        let key = self.entry_key(address);
        let mut conn = self.connection.clone();
        let blob: Option<Vec<u8>> = redis::cmd("HGET").arg(&key).arg("data").query_async(&mut conn).await?;
        blob.map(|bytes| decode(&key, &bytes)).transpose()
    }

    async fn compare_and_swap(&self, current: &KeypairEntry, next: &KeypairEntry) -> Result<bool, StoreError> {
        if current.address != next.address {
            return Ok(false);
        }
        let key = self.entry_key(&current.address);
        let data = encode(&key, next)?;
        let mut conn = self.connection.clone();
        let (open, reserved) = index_flags(next);
        let swapped: i64 = self
            .cas_script
            .key(&key)
            .key(self.open_key())
            .key(self.reserved_key())
            .key(self.assigned_key(current.assigned_to.as_ref()))
            .key(self.assigned_key(next.assigned_to.as_ref()))
            .arg(current.version)
            .arg(next.version)
            .arg(data)
            .arg(next.queue_position)
            .arg(next.address.to_string())
            .arg(flag(open))
            .arg(flag(reserved))
            .arg(flag(current.assigned_to.is_some()))
            .arg(flag(next.assigned_to.is_some()))
            .invoke_async(&mut conn)
            .await?;
        Ok(swapped == 1)
    }

    async fn scan(&self, filter: EntryFilter, offset: usize, limit: usize) -> Result<Vec<KeypairEntry>, StoreError> {
        match self.index_key(&filter) {
            Some(index_key) => {
                let entries = self.indexed_entries(&index_key, offset, limit).await?;
                Ok(entries.into_iter().filter(|e| filter.matches(e)).collect())
            }
            None => self.filtered_walk(filter, offset, limit).await,
        }
    }

    async fn count(&self, filter: EntryFilter) -> Result<usize, StoreError> {
        match self.index_key(&filter) {
            Some(index_key) => {
                let mut conn = self.connection.clone();
                let total: usize = redis::cmd("ZCARD").arg(index_key).query_async(&mut conn).await?;
                Ok(total)
            }
            None => Ok(self.filtered_walk(filter, 0, usize::MAX).await?.len()),
        }
    }
}

#[async_trait]
impl PendingProjectStore for RedisStore {
    async fn put(&self, record: &PendingProjectRecord, ttl_secs: i64) -> Result<(), StoreError> {
        let key = self.project_key(&record.mint);
        let data = encode(&key, record)?;
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(data)
            .arg("EX")
            .arg(ttl_secs.max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, mint: &Pubkey) -> Result<Option<PendingProjectRecord>, StoreError> {
        let key = self.project_key(mint);
        let mut conn = self.connection.clone();
        let blob: Option<Vec<u8>> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;
        blob.map(|bytes| decode(&key, &bytes)).transpose()
    }

    async fn remove(&self, mint: &Pubkey) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: i64 = redis::cmd("DEL").arg(self.project_key(mint)).query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenRegistry for RedisStore {
    async fn find_conflict(
        &self,
        name: &str,
        symbol: &str,
        now: i64,
        lock_window_secs: i64,
    ) -> Result<Option<NameConflict>, StoreError> {
        for index_key in [self.token_name_key(name), self.token_symbol_key(symbol)] {
            if let Some(record) = self.token_by_index(index_key).await? {
                if let Some(field) = record.conflicts_with(name, symbol, now, lock_window_secs) {
                    return Ok(Some(NameConflict { field, record }));
                }
            }
        }
        Ok(None)
    }

    async fn register(&self, record: TokenRecord) -> Result<(), StoreError> {
        let key = self.token_key(&record.mint);
        let data = encode(&key, &record)?;
        let mint = record.mint.to_string();
        let mut conn = self.connection.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("SET").arg(&key).arg(data).ignore()
            .cmd("SET").arg(self.token_name_key(&record.name)).arg(&mint).ignore()
            .cmd("SET").arg(self.token_symbol_key(&record.symbol)).arg(&mint).ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, mint: &Pubkey) -> Result<Option<TokenRecord>, StoreError> {
        let key = self.token_key(mint);
        let mut conn = self.connection.clone();
        let blob: Option<Vec<u8>> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;
        blob.map(|bytes| decode(&key, &bytes)).transpose()
    }

    async fn attach_metadata(&self, mint: &Pubkey, refs: &[String]) -> Result<(), StoreError> {
        let mut record = TokenRegistry::get(self, mint)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("token {} not registered", mint)))?;
        record.aux_metadata.extend(refs.iter().cloned());
        let key = self.token_key(mint);
        let data = encode(&key, &record)?;
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET").arg(&key).arg(data).query_async(&mut conn).await?;
        Ok(())
    }

    async fn mark_graduated(&self, mint: &Pubkey) -> Result<bool, StoreError> {
        let Some(mut record) = TokenRegistry::get(self, mint).await? else {
            return Ok(false);
        };
        record.graduated = true;
        let key = self.token_key(mint);
        let data = encode(&key, &record)?;
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET").arg(&key).arg(data).query_async(&mut conn).await?;
        Ok(true)
    }
}
