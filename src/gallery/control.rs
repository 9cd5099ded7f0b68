use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A user-facing trigger that must not be fired twice concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Upload,
    Save,
    Sync,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Upload => "upload",
            Control::Save => "save",
            Control::Sync => "sync",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server-side equivalent of disabling a button while its request runs.
/// The returned guard re-enables the control when dropped, whichever way the
/// operation exits.
#[derive(Clone, Default)]
pub struct ControlLatch {
    busy: Arc<Mutex<HashSet<Control>>>,
}

impl ControlLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, control: Control) -> Option<ControlGuard> {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        busy.insert(control).then(|| ControlGuard {
            busy: self.busy.clone(),
            control,
        })
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&control)
    }
}

pub struct ControlGuard {
    busy: Arc<Mutex<HashSet<Control>>>,
    control: Control,
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.control);
    }
}
