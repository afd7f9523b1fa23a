use std::mem;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A state update expressed against whatever the value is when it is applied.
pub type Transform<T> = Box<dyn FnOnce(T) -> T + Send>;

/// Single-owner state container living on the render side.
pub struct StateCell<T> {
    value: T,
    tx: Sender<Transform<T>>,
    rx: Receiver<Transform<T>>,
}

impl<T: Default + Send + 'static> StateCell<T> {
    pub fn new(value: T) -> Self {
        let (tx, rx) = unbounded();
        Self { value, tx, rx }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Applies `transform` to the current value immediately.
    pub fn update(&mut self, transform: impl FnOnce(T) -> T) {
        let current = mem::take(&mut self.value);
        self.value = transform(current);
    }

    /// Applies every transform queued by handles, oldest first.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(transform) = self.rx.try_recv() {
            self.update(transform);
            applied += 1;
        }
        applied
    }

    pub fn handle(&self) -> StateHandle<T> {
        StateHandle {
            tx: self.tx.clone(),
        }
    }
}

/// Cross-thread entry point to a [`StateCell`]; can only queue transforms.
pub struct StateHandle<T> {
    tx: Sender<Transform<T>>,
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> StateHandle<T> {
    /// Queues `transform` for the owner. Returns `false` once the cell is gone.
    pub fn send(&self, transform: impl FnOnce(T) -> T + Send + 'static) -> bool {
        self.tx.send(Box::new(transform)).is_ok()
    }
}
