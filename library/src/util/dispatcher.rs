//! Task dispatcher: marshals work back onto the evaluation thread.
//!
//! Background jobs (and any other thread) post closures here; the owner of
//! the network drains the queue on the evaluation thread before the next
//! pass. This is the engine's only bridge between threads and the mutable
//! network, independent of any UI toolkit's event loop.

use std::collections::VecDeque;
use std::sync::Mutex;

use log::debug;

use crate::network::ProcessorNetwork;

type Task = Box<dyn FnOnce(&mut ProcessorNetwork) + Send>;

#[derive(Default)]
pub struct Dispatcher {
    queue: Mutex<VecDeque<Task>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for execution on the evaluation thread.
    pub fn post(&self, task: impl FnOnce(&mut ProcessorNetwork) + Send + 'static) {
        let mut queue = self.queue.lock().expect("dispatcher queue poisoned");
        queue.push_back(Box::new(task));
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().expect("dispatcher queue poisoned").len()
    }

    /// Run all queued tasks against the network. Returns the number executed.
    ///
    /// Tasks queued by tasks run in the same drain; the snapshot loop below
    /// still terminates because each iteration pops one task.
    pub fn drain(&self, network: &mut ProcessorNetwork) -> usize {
        let mut count = 0;
        loop {
            let task = {
                let mut queue = self.queue.lock().expect("dispatcher queue poisoned");
                queue.pop_front()
            };
            match task {
                Some(task) => {
                    task(network);
                    count += 1;
                }
                None => break,
            }
        }
        if count > 0 {
            debug!("dispatcher drained {} task(s)", count);
        }
        count
    }
}
