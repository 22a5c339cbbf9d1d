use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Collapses calls made within `wait` of each other into the last one.
///
/// Must be called from inside a tokio runtime.
pub struct Debouncer<T: Send + 'static> {
    wait: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(wait: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            wait,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    pub fn call(&self, value: T) {
        let action = Arc::clone(&self.action);
        let wait = self.wait;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            action(value);
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Search box auto-search hook: fires once typing pauses, for empty queries
/// or queries of at least three characters.
pub struct SearchBox {
    debouncer: Debouncer<String>,
}

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const MIN_QUERY_LEN: usize = 3;

impl SearchBox {
    pub fn new<F>(on_search: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            debouncer: Debouncer::new(SEARCH_DEBOUNCE, move |query: String| {
                let len = query.chars().count();
                if len == 0 || len >= MIN_QUERY_LEN {
                    tracing::debug!("Auto-search for {:?}", query);
                    on_search(query);
                }
            }),
        }
    }

    pub fn input(&self, value: &str) {
        self.debouncer.call(value.to_string());
    }

    /// Enter submits right away.
    pub fn submit(&self, value: &str, on_submit: impl FnOnce(String)) {
        self.debouncer.cancel();
        on_submit(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_to_last() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let debouncer = Debouncer::new(Duration::from_millis(300), move |v: u32| {
            sink.lock().unwrap().push(v);
        });

        debouncer.call(1);
        advance(Duration::from_millis(100)).await;
        debouncer.call(2);
        advance(Duration::from_millis(100)).await;
        debouncer.call(3);
        advance(Duration::from_millis(400)).await;

        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let debouncer = Debouncer::new(Duration::from_millis(50), move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.call(());
        advance(Duration::from_millis(100)).await;
        debouncer.call(());
        advance(Duration::from_millis(100)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_box_skips_short_queries() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let search = SearchBox::new(move |q| sink.lock().unwrap().push(q));

        search.input("ga");
        advance(Duration::from_millis(600)).await;
        search.input("gab");
        advance(Duration::from_millis(600)).await;
        search.input("");
        advance(Duration::from_millis(600)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["gab".to_string(), String::new()]);
    }
}
