use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ToastId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ToastPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToastEntry {
    pub id: Option<ToastId>,
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub position: ToastPosition,
    pub auto_close_ms: Option<u32>,
    pub closable: bool,
}

impl ToastEntry {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            message: message.into(),
            kind: ToastKind::Info,
            position: ToastPosition::TopRight,
            auto_close_ms: Some(4_000),
            closable: true,
        }
    }

    pub fn kind(mut self, value: ToastKind) -> Self {
        self.kind = value;
        self
    }

    pub fn position(mut self, value: ToastPosition) -> Self {
        self.position = value;
        self
    }

    pub fn auto_close_ms(mut self, value: Option<u32>) -> Self {
        self.auto_close_ms = value;
        self
    }

    pub fn closable(mut self, value: bool) -> Self {
        self.closable = value;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToastViewport {
    pub position: ToastPosition,
    pub max_visible: usize,
}

impl ToastViewport {
    pub fn new(position: ToastPosition) -> Self {
        Self {
            position,
            max_visible: 5,
        }
    }

    pub fn max_visible(mut self, value: usize) -> Self {
        self.max_visible = value.max(1);
        self
    }
}

#[derive(Default)]
struct ToastState {
    queues: BTreeMap<ToastPosition, VecDeque<ToastEntry>>,
    max_visible: BTreeMap<ToastPosition, usize>,
}

/// Fire-and-forget notification channel. Clonable handle; every page shares
/// the queues behind it.
#[derive(Clone, Default)]
pub struct ToastManager {
    next_id: Arc<AtomicU64>,
    state: Arc<RwLock<ToastState>>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure_viewport(&self, viewport: ToastViewport) {
        self.write()
            .max_visible
            .insert(viewport.position, viewport.max_visible);
    }

    pub fn show(&self, mut entry: ToastEntry) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        entry.id = Some(id);

        let mut state = self.write();
        let limit = *state.max_visible.get(&entry.position).unwrap_or(&5);
        let queue = state.queues.entry(entry.position).or_default();
        queue.push_back(entry);

        while queue.len() > limit {
            queue.pop_front();
        }
        id
    }

    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut state = self.write();
        for queue in state.queues.values_mut() {
            if let Some(index) = queue.iter().position(|entry| entry.id == Some(id)) {
                queue.remove(index);
                return true;
            }
        }
        false
    }

    pub fn dismiss_all(&self) {
        for queue in self.write().queues.values_mut() {
            queue.clear();
        }
    }

    pub fn list(&self, position: ToastPosition) -> Vec<ToastEntry> {
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state
            .queues
            .get(&position)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ToastState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
