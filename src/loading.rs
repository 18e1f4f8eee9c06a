//! Asset loading coordination.
//!
//! A [`LoadingManager`] counts every fetch that goes through
//! [`LoadingManager::track`] and reports to a [`LoadObserver`]:
//!
//! - `on_progress(url, loaded, total)` whenever an item ends (successfully or not)
//! - `on_error(url, error)` right before a failed item ends
//! - `on_load()` exactly once, when the last registered item has ended
//!
//! Items are registered when `track` is *called*, not when the returned future
//! is first polled. Creating every future of a batch before joining them keeps
//! `total` fixed while items resolve, so the reported ratio never goes back.
//!
//! There is no retry, cancellation or timeout: a fetch that never resolves keeps
//! `on_load` from ever firing.

use std::cell::Cell;

use crate::error::AssetLoadError;

/// Receiver of loading events.
pub trait LoadObserver {
    fn on_progress(&self, url: &str, loaded: usize, total: usize);

    fn on_error(&self, url: &str, error: &AssetLoadError);

    fn on_load(&self);
}

/// Snapshot of the loading counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(loaded: usize, total: usize) -> Self {
        Self { loaded, total }
    }

    /// Fraction of ended items in `[0, 1]`; `0.0` while nothing is registered.
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.loaded as f32 / self.total as f32).clamp(0.0, 1.0)
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.loaded >= self.total
    }
}

pub struct LoadingManager<O: LoadObserver> {
    observer: O,
    progress: Cell<Progress>,
    completed: Cell<bool>,
}

impl<O: LoadObserver> LoadingManager<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            progress: Cell::new(Progress::default()),
            completed: Cell::new(false),
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress.get()
    }

    /// Whether `on_load` has fired.
    pub fn is_complete(&self) -> bool {
        self.completed.get()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Registers `url` immediately and returns a future that resolves `fetch`
    /// and then marks the item as ended.
    pub fn track<'a, T, F>(
        &'a self,
        url: &str,
        fetch: F,
    ) -> impl Future<Output = Result<T, AssetLoadError>> + use<'a, O, T, F>
    where
        F: Future<Output = Result<T, AssetLoadError>> + 'a,
        T: 'a,
    {
        self.item_start(url);
        let url = url.to_string();
        async move {
            let result = fetch.await;
            if let Err(e) = &result {
                self.item_error(&url, e);
            }
            self.item_end(&url);
            result
        }
    }

    fn item_start(&self, url: &str) {
        let mut progress = self.progress.get();
        progress.total += 1;
        self.progress.set(progress);
        log::debug!("Loading {} ({} items registered)", url, progress.total);
    }

    fn item_error(&self, url: &str, error: &AssetLoadError) {
        log::error!("Failed to load {}: {}", url, error);
        self.observer.on_error(url, error);
    }

    fn item_end(&self, url: &str) {
        let mut progress = self.progress.get();
        progress.loaded += 1;
        self.progress.set(progress);
        log::debug!("Loaded {} ({}/{})", url, progress.loaded, progress.total);
        self.observer
            .on_progress(url, progress.loaded, progress.total);

        if progress.loaded == progress.total && !self.completed.get() {
            self.completed.set(true);
            log::info!("All {} assets loaded", progress.total);
            self.observer.on_load();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::{
        channel::oneshot,
        executor::block_on,
        future::{join, join_all},
    };

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Progress(String, usize, usize),
        Error(String),
        Load,
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Seen>>);

    impl LoadObserver for Recorder {
        fn on_progress(&self, url: &str, loaded: usize, total: usize) {
            self.0
                .borrow_mut()
                .push(Seen::Progress(url.to_string(), loaded, total));
        }

        fn on_error(&self, url: &str, _: &AssetLoadError) {
            self.0.borrow_mut().push(Seen::Error(url.to_string()));
        }

        fn on_load(&self) {
            self.0.borrow_mut().push(Seen::Load);
        }
    }

    fn missing(url: &str) -> AssetLoadError {
        AssetLoadError::Io {
            url: url.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    #[test]
    fn ratio_is_zero_without_items_and_clamped() {
        assert_eq!(Progress::default().ratio(), 0.0);
        assert_eq!(Progress::new(1, 4).ratio(), 0.25);
        assert_eq!(Progress::new(5, 4).ratio(), 1.0);
        assert!(!Progress::default().is_done());
        assert!(Progress::new(2, 2).is_done());
    }

    #[test]
    fn registers_when_tracked_not_when_polled() {
        let manager = LoadingManager::new(Recorder::default());
        let a = manager.track("a.jpg", async { Ok(1) });
        let b = manager.track("b.jpg", async { Ok(2) });
        assert_eq!(manager.progress(), Progress::new(0, 2));

        let (a, b) = block_on(join(a, b));
        assert_eq!(a.unwrap() + b.unwrap(), 3);
        assert_eq!(
            *manager.observer().0.borrow(),
            vec![
                Seen::Progress("a.jpg".into(), 1, 2),
                Seen::Progress("b.jpg".into(), 2, 2),
                Seen::Load,
            ]
        );
    }

    #[test]
    fn completes_once_after_the_last_item_in_resolution_order() {
        let manager = LoadingManager::new(Recorder::default());
        let (tx_first, rx_first) = oneshot::channel::<u8>();
        let (tx_second, rx_second) = oneshot::channel::<u8>();
        let first = manager.track("first.glb", async move {
            Ok(rx_first.await.expect("sender dropped"))
        });
        let second = manager.track("second.jpg", async move {
            Ok(rx_second.await.expect("sender dropped"))
        });

        // Senders fire out of registration order.
        tx_second.send(2).unwrap();
        tx_first.send(1).unwrap();
        let (first, second) = block_on(join(first, second));
        assert_eq!((first.unwrap(), second.unwrap()), (1, 2));

        let seen = manager.observer().0.borrow();
        let loads = seen.iter().filter(|s| **s == Seen::Load).count();
        assert_eq!(loads, 1);
        assert_eq!(seen.last(), Some(&Seen::Load));
        assert!(manager.is_complete());
    }

    #[test]
    fn does_not_complete_while_an_item_is_pending() {
        let manager = LoadingManager::new(Recorder::default());
        let (_tx, rx) = oneshot::channel::<u8>();
        let done = manager.track("done.jpg", async { Ok(0u8) });
        let _pending = manager.track("pending.jpg", async move {
            Ok(rx.await.unwrap_or_default())
        });

        block_on(done).unwrap();
        assert_eq!(manager.progress(), Progress::new(1, 2));
        assert!(!manager.is_complete());
        assert!(!manager.observer().0.borrow().contains(&Seen::Load));
    }

    #[test]
    fn failed_items_still_end() {
        let manager = LoadingManager::new(Recorder::default());
        let ok = manager.track("ok.jpg", async { Ok(()) });
        let broken = manager.track("broken.jpg", async { Err::<(), _>(missing("broken.jpg")) });

        let (ok, broken) = block_on(join(ok, broken));
        assert!(ok.is_ok());
        assert!(matches!(broken, Err(AssetLoadError::Io { .. })));
        assert_eq!(
            *manager.observer().0.borrow(),
            vec![
                Seen::Progress("ok.jpg".into(), 1, 2),
                Seen::Error("broken.jpg".into()),
                Seen::Progress("broken.jpg".into(), 2, 2),
                Seen::Load,
            ]
        );
    }

    #[test]
    fn ratio_never_decreases_for_an_eager_batch() {
        let manager = LoadingManager::new(Recorder::default());
        let futures: Vec<_> = (0..5)
            .map(|i| manager.track(&format!("{i}.jpg"), async move { Ok(i) }))
            .collect();
        block_on(join_all(futures));

        let seen = manager.observer().0.borrow();
        let ratios: Vec<f32> = seen
            .iter()
            .filter_map(|s| match s {
                Seen::Progress(_, loaded, total) => Some(Progress::new(*loaded, *total).ratio()),
                _ => None,
            })
            .collect();
        assert_eq!(ratios.len(), 5);
        assert!(ratios.windows(2).all(|w| w[0] <= w[1]));
        assert!(ratios.iter().all(|r| (0.0..=1.0).contains(r)));
    }
}
