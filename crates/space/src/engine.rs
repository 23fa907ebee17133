use crate::{Conn, WaitingClient};
use policy::Composable;
use proto::Operation;
use registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tuple::{Template, Tuple};

/// TupleSpace is a concurrent multiset of tuples with blocking-waiter
/// rendezvous. Two locks guard its state: a read-write lock over the
/// tuple list, and an exclusive lock over the waiter list.
#[derive(Clone)]
pub struct TupleSpace {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    tuples: RwLock<Vec<Tuple>>,
    waiters: Mutex<Vec<WaitingClient>>,
    policy: Option<Composable>,
    registry: Registry,
    serving: Option<Serving>,
}

pub(crate) struct Serving {
    pub(crate) local_addr: SocketAddr,
    pub(crate) conn_tx: mpsc::Sender<Conn>,
}

impl TupleSpace {
    /// A space without a transport endpoint, reachable only through its
    /// engine operations.
    pub fn detached(policy: Option<Composable>, registry: Registry) -> Self {
        Self::build(policy, registry, None)
    }

    pub(crate) fn build(
        policy: Option<Composable>,
        registry: Registry,
        serving: Option<Serving>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tuples: RwLock::new(Vec::new()),
                waiters: Mutex::new(Vec::new()),
                policy,
                registry,
                serving,
            }),
        }
    }

    pub fn policy(&self) -> Option<&Composable> {
        self.inner.policy.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The bound endpoint of a serving space.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.serving.as_ref().map(|s| s.local_addr)
    }

    pub(crate) fn serving(&self) -> Option<&Serving> {
        self.inner.serving.as_ref()
    }

    /// The number of tuples in the space at this instant.
    pub async fn size(&self) -> usize {
        self.inner.tuples.read().await.len()
    }

    /// Blocking placement: places the tuple and acknowledges. The space
    /// never rejects a put, but the protocol requires the ack.
    pub async fn put(&self, t: Tuple) -> bool {
        self.put_p(t).await;
        true
    }

    /// Non-blocking placement. Consuming waiters parked at the moment the
    /// waiter lock is taken claim the tuple exclusively, in insertion
    /// order; observing waiters are each delivered a copy first.
    pub async fn put_p(&self, t: Tuple) {
        let mut waiters = self.inner.waiters.lock().await;

        let mut i = 0;
        while i < waiters.len() {
            if !t.matches(waiters[i].template()) {
                i += 1;
                continue;
            }
            let waiter = waiters.remove(i);
            let consuming = waiter.is_consuming();

            // A waiter whose receiving side has gone away neither
            // consumes nor observes.
            if waiter.deliver(t.clone()) && consuming {
                return;
            }
        }

        // The tuple is stored while the waiter lock is still held, so a
        // client which misses its scan and parks cannot lose a tuple
        // placed concurrently.
        self.inner.tuples.write().await.push(t);
    }

    /// Blocking retrieval: the first matching tuple is removed and
    /// returned, parking until one arrives.
    pub async fn get(&self, template: Template) -> Tuple {
        self.find_blocking(template, true).await
    }

    /// Blocking query: as [`TupleSpace::get`], but the tuple stays in
    /// the space.
    pub async fn query(&self, template: Template) -> Tuple {
        self.find_blocking(template, false).await
    }

    async fn find_blocking(&self, template: Template, remove: bool) -> Tuple {
        let rx = {
            // Hold the waiter lock across the find and the registration:
            // every placement also stores under this lock, so the miss
            // and the park are atomic against concurrent puts.
            let mut waiters = self.inner.waiters.lock().await;

            if let Some(found) = self.find(&template, remove).await {
                return found;
            }
            let operation = if remove {
                Operation::GetRequest
            } else {
                Operation::QueryRequest
            };
            let (tx, rx) = oneshot::channel();
            waiters.push(WaitingClient::new(template, tx, operation));
            rx
        };

        rx.await
            .expect("a parked waiter is removed from the list only upon delivery")
    }

    /// Non-blocking retrieval of the first matching tuple, if any.
    pub async fn get_p(&self, template: &Template) -> Option<Tuple> {
        self.find(template, true).await
    }

    /// Non-blocking query of the first matching tuple, if any.
    pub async fn query_p(&self, template: &Template) -> Option<Tuple> {
        self.find(template, false).await
    }

    /// Scans the tuple list in index order for the first match. With
    /// `remove`, the match is removed by moving the last tuple into its
    /// slot; match and removal are atomic under the tuple write lock.
    pub async fn find(&self, template: &Template, remove: bool) -> Option<Tuple> {
        if remove {
            let mut tuples = self.inner.tuples.write().await;
            let i = tuples.iter().position(|t| t.matches(template))?;
            Some(tuples.swap_remove(i))
        } else {
            let tuples = self.inner.tuples.read().await;
            tuples.iter().find(|t| t.matches(template)).cloned()
        }
    }

    /// Removes and returns every matching tuple.
    pub async fn get_all(&self, template: &Template) -> Vec<Tuple> {
        self.find_all(template, true).await
    }

    /// Returns a copy of every matching tuple.
    pub async fn query_all(&self, template: &Template) -> Vec<Tuple> {
        self.find_all(template, false).await
    }

    /// Collects all matches; with `remove`, matched indices are deleted
    /// in reverse order so earlier removals do not shift later ones.
    pub async fn find_all(&self, template: &Template, remove: bool) -> Vec<Tuple> {
        if remove {
            let mut tuples = self.inner.tuples.write().await;

            let mut matched = Vec::new();
            let mut indices = Vec::new();
            for (i, t) in tuples.iter().enumerate() {
                if t.matches(template) {
                    indices.push(i);
                    matched.push(t.clone());
                }
            }
            for &i in indices.iter().rev() {
                tuples.swap_remove(i);
            }
            matched
        } else {
            self.inner
                .tuples
                .read()
                .await
                .iter()
                .filter(|t| t.matches(template))
                .cloned()
                .collect()
        }
    }

    /// Reinitializes the tuple list. Parked waiters stay parked.
    pub async fn clear(&self) {
        self.inner.tuples.write().await.clear();
    }
}
