use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::{
	sync::Mutex,
	time::{Duration, Instant},
};

struct Slot<V> {
	value: Option<(V, Instant)>,
}

impl<V> Default for Slot<V> {
	fn default() -> Self {
		Self { value: None }
	}
}

/// Per-key memoization with expiry.
///
/// Every key owns an async lock that is held for the whole
/// look-or-compute sequence, so concurrent callers for the same key
/// collapse onto a single computation and all observe its value.
/// Whatever else the compute future does (the notification transition,
/// for one) is serialized per key by the same lock.
///
/// Entries are replaced wholesale: a slot holds at most one live value.
pub struct TtlCache<V> {
	ttl: Duration,
	slots: Mutex<HashMap<String, Arc<Mutex<Slot<V>>>>>,
}

impl<V: Clone> TtlCache<V> {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			slots: Mutex::new(HashMap::new()),
		}
	}

	/// A live value for `key`, or the result of `compute`, stored and
	/// shared with every caller that arrives while it runs.
	pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> V
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = V>,
	{
		let slot = {
			let mut slots = self.slots.lock().await;
			slots.entry(key.to_owned()).or_default().clone()
		};

		let mut slot = slot.lock().await;
		if let Some((value, stored)) = &slot.value {
			if stored.elapsed() < self.ttl {
				return value.clone();
			}
		}

		let value = compute().await;
		slot.value = Some((value.clone(), Instant::now()));

		value
	}
}
