//! Last-write-wins hand-off slot between the sampling loop and the actuation worker.
//!
//! This is deliberately not a queue: values written between two actuation
//! polls are superseded, only the newest target ever reaches the sink. The
//! lock is held for the copy in or out and nothing else.

use std::sync::RwLock;

#[derive(Debug)]
pub struct TargetRegister {
    slot: RwLock<f64>,
}

impl TargetRegister {
    pub fn new(initial: f64) -> Self {
        Self {
            slot: RwLock::new(initial),
        }
    }

    /// Overwrite the target.
    pub fn write(&self, level: f64) {
        // A poisoned lock still holds a plain f64; keep going with it.
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = level;
    }

    /// Copy out the current target.
    pub fn read(&self) -> f64 {
        *self.slot.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn last_write_wins() {
        let reg = TargetRegister::new(0.25);
        assert_eq!(reg.read(), 0.25);
        reg.write(0.3);
        reg.write(0.4);
        reg.write(0.5);
        assert_eq!(reg.read(), 0.5);
    }

    #[test]
    fn survives_a_poisoned_lock() {
        let reg = Arc::new(TargetRegister::new(0.1));
        let r2 = reg.clone();
        let _ = std::thread::spawn(move || {
            let _guard = r2.slot.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        reg.write(0.9);
        assert_eq!(reg.read(), 0.9);
    }
}
