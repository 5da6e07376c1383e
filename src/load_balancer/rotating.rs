//! Rotating-queue selection.
//!
//! A pool is a list in the shared store. Selecting pops the tail and pushes
//! it back onto the head of the same list in one atomic store call, so every
//! router sharing the pool walks it round-robin without a cursor of its own.
//! Members removed by the pool manager simply stop coming around.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{RouteError, Stage};
use crate::resilience::timeouts::bounded;
use crate::store::RuleStore;

/// A pool entry decoded from its stored `[rule_id, ...fields]` form.
pub trait PoolMember: Sized + Send {
    /// Stage reported when selection from this kind of pool fails.
    const STAGE: Stage;

    /// Decode the fields following the rule id.
    fn decode(fields: &[Value]) -> Result<Self, String>;
}

/// A member picked from a pool, with the id of the rule that placed it there.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<M> {
    pub rule_id: Value,
    pub member: M,
}

/// Round-robin selector over one kind of pool.
pub struct RotatingSelector<M> {
    store: Arc<dyn RuleStore>,
    /// How long the store waits for an empty pool to gain a member.
    wait: Duration,
    /// Extra time allowed for the round trip itself.
    grace: Duration,
    _member: PhantomData<fn() -> M>,
}

impl<M: PoolMember> RotatingSelector<M> {
    pub fn new(store: Arc<dyn RuleStore>, wait: Duration, grace: Duration) -> Self {
        Self {
            store,
            wait,
            grace,
            _member: PhantomData,
        }
    }

    /// Rotate `pool` and decode the member that came off its tail.
    pub async fn select(&self, pool: &str) -> Result<Selected<M>, RouteError> {
        let raw = bounded(self.wait + self.grace, self.store.rotate(pool, self.wait))
            .await
            .map_err(RouteError::store(M::STAGE))?
            .ok_or_else(|| RouteError::PoolExhausted {
                stage: M::STAGE,
                pool: pool.to_string(),
            })?;

        decode_entry(&raw).map_err(|reason| RouteError::MalformedEntry {
            key: pool.to_string(),
            reason,
        })
    }
}

fn decode_entry<M: PoolMember>(raw: &str) -> Result<Selected<M>, String> {
    let parts: Vec<Value> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let (rule_id, fields) = parts
        .split_first()
        .ok_or_else(|| "empty pool entry".to_string())?;

    Ok(Selected {
        rule_id: rule_id.clone(),
        member: M::decode(fields)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq)]
    struct Named(String);

    impl PoolMember for Named {
        const STAGE: Stage = Stage::Backend;

        fn decode(fields: &[Value]) -> Result<Self, String> {
            fields
                .first()
                .and_then(Value::as_str)
                .map(|s| Named(s.to_string()))
                .ok_or_else(|| "missing name".to_string())
        }
    }

    fn selector(store: Arc<MemoryStore>) -> RotatingSelector<Named> {
        RotatingSelector::new(store, Duration::from_millis(20), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_rotation_is_fair() {
        let store = Arc::new(MemoryStore::new());
        for name in ["a", "b", "c"] {
            store.push("pool", format!(r#"[1, "{}"]"#, name));
        }
        let lb = selector(store);

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut order = Vec::new();
        for _ in 0..30 {
            let picked = lb.select("pool").await.unwrap().member.0;
            order.push(picked.clone());
            *seen.entry(picked).or_default() += 1;
        }

        assert_eq!(seen.len(), 3);
        assert!(seen.values().all(|&n| n == 10));
        // Steady cycle: every window of three holds each member once.
        assert_eq!(&order[0..3], &["a", "b", "c"]);
        assert_eq!(&order[3..6], &order[0..3]);
    }

    #[tokio::test]
    async fn test_empty_pool_is_exhausted() {
        let store = Arc::new(MemoryStore::new());
        let err = selector(store).select("empty").await.unwrap_err();
        assert!(matches!(err, RouteError::PoolExhausted { stage: Stage::Backend, .. }));
    }

    #[tokio::test]
    async fn test_removed_member_drops_out_of_rotation() {
        let store = Arc::new(MemoryStore::new());
        store.push("pool", r#"[1, "a"]"#);
        store.push("pool", r#"[2, "b"]"#);
        let lb = selector(store.clone());

        assert_eq!(lb.select("pool").await.unwrap().member, Named("a".into()));
        store.remove("pool", r#"[2, "b"]"#);
        for _ in 0..3 {
            assert_eq!(lb.select("pool").await.unwrap().member, Named("a".into()));
        }
    }

    #[tokio::test]
    async fn test_malformed_entry() {
        let store = Arc::new(MemoryStore::new());
        store.push("pool", "[]");
        let err = selector(store).select("pool").await.unwrap_err();
        assert!(matches!(err, RouteError::MalformedEntry { .. }));
    }

    #[tokio::test]
    async fn test_store_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let err = selector(store).select("pool").await.unwrap_err();
        assert!(matches!(err, RouteError::Store { stage: Stage::Backend, .. }));
    }
}
