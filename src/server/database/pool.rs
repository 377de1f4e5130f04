use anyhow::{anyhow, Context, Error};
use log::{error, info};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio::time;
use tokio_postgres::{Client, NoTls};

pub(crate) struct CommonPool<C> {
    /// pool name, for logs
    name: String,
    /// idle clients, handed out in a FIFO manner
    connections: Mutex<VecDeque<C>>,
    /// signalled every time a client goes back to the pool
    available: Notify,
}

/// Fixed size pool of clients, cheap to clone.
pub(crate) struct Pool<C>(Arc<CommonPool<C>>);

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Pool<C> {
        Pool(self.0.clone())
    }
}

/// A client borrowed from the pool, given back on drop.
pub(crate) struct Connection<C> {
    client: Option<C>,
    pool: Pool<C>,
}

impl<C> Deref for Connection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // only taken in drop
        self.client.as_ref().expect("connection already released")
    }
}

impl<C> DerefMut for Connection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client.as_mut().expect("connection already released")
    }
}

impl<C> Drop for Connection<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}

impl<C> Pool<C> {
    pub const DEFAULT_SIZE: usize = 10;

    /// create an empty pool
    pub fn new(name: &str) -> Self {
        Self(Arc::new(CommonPool {
            name: name.to_string(),
            connections: Mutex::new(VecDeque::with_capacity(Self::DEFAULT_SIZE)),
            available: Notify::new(),
        }))
    }

    /// hand clients over to the pool
    pub fn fill(&self, clients: impl IntoIterator<Item = C>) {
        for client in clients {
            self.release(client);
        }
    }

    /// acquire a connection, bail out once `timeout` elapses.
    pub async fn acquire(&self, timeout: Duration) -> Option<Connection<C>> {
        let sleep = time::sleep(timeout);
        tokio::pin!(sleep);
        loop {
            let notified = self.0.available.notified();
            if let Some(client) = self.pop() {
                return Some(Connection {
                    client: Some(client),
                    pool: self.clone(),
                });
            }
            tokio::select! {
                _ = notified => continue,
                _ = &mut sleep => {
                    error!("timed out to acquire a connection from pool {} after {:?}", self.0.name, timeout);
                    return None;
                },
            }
        }
    }

    pub fn idle(&self) -> usize {
        self.0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn pop(&self) -> Option<C> {
        self.0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn release(&self, client: C) {
        self.0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(client);
        self.0.available.notify_one();
    }
}

impl Pool<Client> {
    /// open `size` postgres connections concurrently
    pub async fn connect(name: &str, conn_str: &str, size: usize) -> Result<Self, Error> {
        let pool = Self::new(name);
        let mut set = JoinSet::new();
        for _ in 0..size {
            let conn_str = conn_str.to_string();
            set.spawn(async move {
                let (client, conn) = tokio_postgres::connect(conn_str.as_str(), NoTls)
                    .await
                    .context("failed to create connection")?;
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!("connection returned error and aborted, {}", e);
                    }
                });
                Ok::<Client, Error>(client)
            });
        }
        while let Some(res) = set.join_next().await {
            let client = res.context("connection task panicked")??;
            info!("connection created for pool {}", name);
            pool.fill([client]);
        }
        if pool.idle() == 0 {
            return Err(anyhow!("pool {} has no connections", name));
        }
        Ok(pool)
    }
}
