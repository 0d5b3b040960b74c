//! Dirty tracking across forms and confirmation before navigating away.
//!
//! Both registries are ordinary values: create one per application (or per
//! page) and hand clones to the forms that should report into it. Clones
//! share the same delegate list.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Shared "has unsaved changes" bit of one form.
#[derive(Clone, Debug, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new(dirty: bool) -> Self {
        Self(Arc::new(AtomicBool::new(dirty)))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, dirty: bool) {
        self.0.store(dirty, Ordering::Relaxed);
    }

    fn same(&self, other: &DirtyFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Registry of dirty flags. Dirty when any registered flag is set.
#[derive(Clone, Debug, Default)]
pub struct DirtyTracker {
    delegates: Arc<Mutex<Vec<DirtyFlag>>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh, clean flag.
    pub fn register(&self) -> DirtyFlag {
        let flag = DirtyFlag::default();
        self.attach(flag.clone());
        flag
    }

    /// Register an existing flag.
    pub fn attach(&self, flag: DirtyFlag) {
        if let Ok(mut delegates) = self.delegates.lock() {
            delegates.push(flag);
            debug!(delegates = delegates.len(), "dirty delegate registered");
        }
    }

    pub fn unregister(&self, flag: &DirtyFlag) {
        if let Ok(mut delegates) = self.delegates.lock() {
            delegates.retain(|d| !d.same(flag));
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self.delegates.lock() {
            Ok(delegates) => delegates.iter().any(DirtyFlag::get),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.delegates.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overrides the dirty answer of a [`NavigationDelegate`]: `(new_url, dirty)`.
pub type CustomizeDirty = Arc<dyn Fn(Option<&str>, bool) -> bool + Send + Sync>;

/// One form's vote on whether leaving the page needs confirmation.
#[derive(Clone)]
pub struct NavigationDelegate {
    current_url: String,
    confirm_on_same_page: bool,
    customize_dirty: Option<CustomizeDirty>,
    dirty: DirtyFlag,
}

impl NavigationDelegate {
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            current_url: current_url.into(),
            confirm_on_same_page: false,
            customize_dirty: None,
            dirty: DirtyFlag::default(),
        }
    }

    pub fn with_confirm_on_same_page(mut self, confirm: bool) -> Self {
        self.confirm_on_same_page = confirm;
        self
    }

    pub fn with_customize_dirty(
        mut self,
        f: impl Fn(Option<&str>, bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.customize_dirty = Some(Arc::new(f));
        self
    }

    /// Report through an existing flag (e.g. the one a form keeps current).
    pub fn with_dirty_flag(mut self, flag: DirtyFlag) -> Self {
        self.dirty = flag;
        self
    }

    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Navigating to the current URL never confirms unless
    /// `confirm_on_same_page` is set.
    pub fn should_confirm(&self, new_url: Option<&str>) -> bool {
        if !self.confirm_on_same_page && new_url == Some(self.current_url.as_str()) {
            return false;
        }
        match &self.customize_dirty {
            Some(customize) => customize(new_url, self.dirty.get()),
            None => self.dirty.get(),
        }
    }
}

impl fmt::Debug for NavigationDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationDelegate")
            .field("current_url", &self.current_url)
            .field("confirm_on_same_page", &self.confirm_on_same_page)
            .field("customize_dirty", &self.customize_dirty.is_some())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

/// Registry of [`NavigationDelegate`]s.
#[derive(Clone, Debug, Default)]
pub struct NavigationGuard {
    delegates: Arc<Mutex<Vec<Arc<NavigationDelegate>>>>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, delegate: NavigationDelegate) -> Arc<NavigationDelegate> {
        let delegate = Arc::new(delegate);
        if let Ok(mut delegates) = self.delegates.lock() {
            delegates.push(delegate.clone());
            debug!(url = %delegate.current_url, "navigation delegate registered");
        }
        delegate
    }

    pub fn unregister(&self, delegate: &Arc<NavigationDelegate>) {
        if let Ok(mut delegates) = self.delegates.lock() {
            delegates.retain(|d| !Arc::ptr_eq(d, delegate));
        }
    }

    /// True if any delegate wants confirmation before leaving for `new_url`.
    pub fn should_confirm(&self, new_url: Option<&str>) -> bool {
        match self.delegates.lock() {
            Ok(delegates) => delegates.iter().any(|d| d.should_confirm(new_url)),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.delegates.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
