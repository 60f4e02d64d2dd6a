//! Generic progress callback trait and implementations.

use std::marker::PhantomData;

/// Generic progress callback trait.
///
/// Type parameter `T` is the progress data type, allowing different
/// operations to report different progress information while sharing
/// the same callback pattern. Callbacks are report-only.
pub trait ProgressCallback<T>: Send + Sync {
    /// Called with progress updates.
    fn on_progress(&self, progress: &T);
}

/// A progress callback that ignores every update.
pub struct NoOpProgress;

impl<T> ProgressCallback<T> for NoOpProgress {
    fn on_progress(&self, _progress: &T) {}
}

/// A progress callback that wraps a closure.
pub struct FnProgress<F, T> {
    callback: F,
    _marker: PhantomData<fn(&T)>,
}

impl<F, T> FnProgress<F, T>
where
    F: Fn(&T) + Send + Sync,
{
    /// Create a new closure-based progress callback.
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _marker: PhantomData,
        }
    }
}

impl<F, T> ProgressCallback<T> for FnProgress<F, T>
where
    F: Fn(&T) + Send + Sync,
{
    fn on_progress(&self, progress: &T) {
        (self.callback)(progress)
    }
}

/// Create a progress callback from a closure.
pub fn progress_fn<F, T>(f: F) -> FnProgress<F, T>
where
    F: Fn(&T) + Send + Sync,
{
    FnProgress::new(f)
}
