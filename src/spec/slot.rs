//! The process-wide "current spec" slot.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::spec::types::LoadedSpec;

/// Holds at most one [`LoadedSpec`].
///
/// Lifecycle: starts empty, [`replace`](Self::replace) installs a freshly
/// loaded spec in one swap, [`clear`](Self::clear) empties it. A failed load
/// never touches the slot. Readers get an `Arc` snapshot that stays valid
/// even if the slot is replaced while they hold it.
#[derive(Debug, Default)]
pub struct SpecSlot {
    current: ArcSwapOption<LoadedSpec>,
}

impl SpecSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current spec, if any.
    pub fn current(&self) -> Option<Arc<LoadedSpec>> {
        self.current.load_full()
    }

    /// Install `spec`, returning the shared handle to it.
    pub fn replace(&self, spec: LoadedSpec) -> Arc<LoadedSpec> {
        let spec = Arc::new(spec);
        self.current.store(Some(spec.clone()));
        spec
    }

    /// Empty the slot.
    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }
}
