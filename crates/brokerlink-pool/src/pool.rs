use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use brokerlink_session::{BrokerConfig, Cipher, Session};
use tracing::{debug, info, warn};

use crate::error::{PoolError, Result};

struct PoolInner {
    idle: Vec<Session>,
    /// Sessions in existence, leased or idle. Never exceeds capacity.
    live: usize,
    closed: bool,
}

/// Bounded pool of authenticated sessions for one broker profile.
///
/// Sessions are built lazily up to the profile's `pool_capacity`; once the
/// cap is reached, checkout blocks until a lease is returned or the wait
/// deadline passes. Returned sessions that are no longer `Ready` are
/// discarded, so one faulted connection never poisons its neighbours.
pub struct SessionPool {
    inner: Mutex<PoolInner>,
    available: Condvar,
    config: BrokerConfig,
    cipher: Arc<dyn Cipher>,
    capacity: usize,
}

impl SessionPool {
    /// Create an empty pool. No connection is opened until the first
    /// checkout (or an explicit [`SessionPool::warm`]).
    pub fn new(config: BrokerConfig, cipher: Arc<dyn Cipher>) -> Result<Self> {
        config.validate()?;
        let capacity = config.pool_capacity;
        Ok(Self {
            inner: Mutex::new(PoolInner {
                idle: Vec::with_capacity(capacity),
                live: 0,
                closed: false,
            }),
            available: Condvar::new(),
            config,
            cipher,
            capacity,
        })
    }

    /// Lease a session, blocking up to `timeout` when the pool is at
    /// capacity with every session checked out.
    pub fn checkout(&self, timeout: Duration) -> Result<PooledSession<'_>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.closed {
                return Err(PoolError::Closed);
            }
            if let Some(session) = inner.idle.pop() {
                debug!(idle = inner.idle.len(), "leased idle session");
                return Ok(PooledSession {
                    pool: self,
                    session: Some(session),
                });
            }
            if inner.live < self.capacity {
                inner.live += 1;
                drop(inner);
                // The handshake runs outside the lock; other callers keep
                // leasing idle sessions meanwhile.
                return match Session::connect(self.config.clone(), self.cipher.as_ref()) {
                    Ok(session) => Ok(PooledSession {
                        pool: self,
                        session: Some(session),
                    }),
                    Err(err) => {
                        let mut inner = self.inner.lock().unwrap();
                        inner.live -= 1;
                        drop(inner);
                        self.available.notify_one();
                        Err(err.into())
                    }
                };
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PoolError::Exhausted(timeout));
            }
            let (guard, _) = self.available.wait_timeout(inner, remaining).unwrap();
            inner = guard;
        }
    }

    /// Open up to `count` sessions ahead of demand, bounded by capacity.
    /// Returns how many were actually created.
    pub fn warm(&self, count: usize) -> Result<usize> {
        let mut created = 0;
        while created < count {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed {
                return Err(PoolError::Closed);
            }
            if inner.live >= self.capacity {
                break;
            }
            inner.live += 1;
            drop(inner);

            match Session::connect(self.config.clone(), self.cipher.as_ref()) {
                Ok(mut session) => {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.closed {
                        inner.live -= 1;
                        drop(inner);
                        session.close();
                        return Err(PoolError::Closed);
                    }
                    inner.idle.push(session);
                    created += 1;
                    drop(inner);
                    self.available.notify_one();
                }
                Err(err) => {
                    let mut inner = self.inner.lock().unwrap();
                    inner.live -= 1;
                    drop(inner);
                    self.available.notify_one();
                    return Err(err.into());
                }
            }
        }
        info!(created, capacity = self.capacity, "pool warmed");
        Ok(created)
    }

    /// Close every idle session and refuse further leases. Sessions
    /// currently leased are closed as they come back.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        inner.closed = true;
        let idle = std::mem::take(&mut inner.idle);
        inner.live -= idle.len();
        drop(inner);

        for mut session in idle {
            session.close();
        }
        self.available.notify_all();
        info!("pool shut down");
    }

    /// Sessions currently idle in the pool.
    pub fn idle_count(&self) -> usize {
        self.inner.lock().unwrap().idle.len()
    }

    /// Sessions in existence, leased or idle.
    pub fn live_count(&self) -> usize {
        self.inner.lock().unwrap().live
    }

    /// Maximum sessions this pool will ever hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn checkin(&self, mut session: Session) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.closed && session.is_ready() {
            inner.idle.push(session);
            drop(inner);
        } else {
            inner.live -= 1;
            drop(inner);
            if !session.is_ready() {
                warn!("discarding unusable session on return");
            }
            session.close();
        }
        self.available.notify_one();
    }
}

/// Exclusive lease on one pooled session. Returns the session on drop.
pub struct PooledSession<'a> {
    pool: &'a SessionPool,
    session: Option<Session>,
}

impl Deref for PooledSession<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session.as_ref().expect("session present until drop")
    }
}

impl DerefMut for PooledSession<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session.as_mut().expect("session present until drop")
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.checkin(session);
        }
    }
}

impl fmt::Debug for PooledSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledSession")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
