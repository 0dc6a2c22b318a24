//! Redis-backed store
//!
//! Uses one multiplexed connection per instance. WATCH state lives on the
//! connection, which is safe here because an instance drives the store from a
//! single sequential loop.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::{decode_message, ttl_arg, Store, Transaction, TxCommand, TxGuard, TxOutcome};

pub struct RedisStore {
    url: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisStore {
    /// Open a connection to the Redis server at `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let conn = client.get_multiplexed_async_connection().await?;
        info!(url = %url, "Connected to Redis");

        Ok(Self {
            url: url.to_string(),
            conn: Mutex::new(Some(conn)),
        })
    }

    fn connection(&self) -> Result<MultiplexedConnection> {
        self.conn.lock().clone().ok_or(StoreError::Closed)
    }

    /// WATCH the key, then confirm it is still absent.
    ///
    /// Returns false (after UNWATCH) if the key already exists.
    async fn watch_absent(conn: &mut MultiplexedConnection, key: &str) -> Result<bool> {
        redis::cmd("WATCH").arg(key).query_async::<()>(conn).await?;

        let present: bool = conn.exists(key).await?;
        if present {
            redis::cmd("UNWATCH").query_async::<()>(conn).await?;
            return Ok(false);
        }
        Ok(true)
    }
}

#[async_trait]
impl Store for RedisStore {
    fn identifier(&self) -> &str {
        &self.url
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        Ok(conn.exists(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.connection()?;
        Ok(conn.expire(key, ttl_arg(ttl_seconds)?).await?)
    }

    async fn push_tail(&self, list: &str, value: &str) -> Result<u64> {
        let mut conn = self.connection()?;
        Ok(conn.rpush(list, value).await?)
    }

    async fn pop_head(&self, list: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let popped: Option<Vec<u8>> = conn.lpop(list, None).await?;
        Ok(popped.map(decode_message))
    }

    async fn commit(&self, tx: Transaction) -> Result<TxOutcome> {
        let mut conn = self.connection()?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in tx.commands() {
            match command {
                TxCommand::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                TxCommand::Expire { key, ttl_seconds } => {
                    pipe.expire(key, ttl_arg(*ttl_seconds)?).ignore();
                }
                TxCommand::PushTail { key, value } => {
                    pipe.rpush(key, value).ignore();
                }
            }
        }

        // Built before WATCH: a rejected TTL must not leave the key watched
        if let Some(TxGuard::Absent(key)) = tx.guard() {
            if !Self::watch_absent(&mut conn, key).await? {
                debug!(key = %key, "Guarded key present, transaction not attempted");
                return Ok(TxOutcome::Aborted);
            }
        }

        // EXEC replies nil when a watched key changed
        let reply: Option<()> = pipe.query_async(&mut conn).await?;
        Ok(match reply {
            Some(()) => TxOutcome::Committed,
            None => TxOutcome::Aborted,
        })
    }

    async fn close(&self) {
        if self.conn.lock().take().is_some() {
            info!(url = %self.url, "Closed Redis connection");
        }
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}
