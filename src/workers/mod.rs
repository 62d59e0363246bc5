pub mod npc_ai;
pub mod path_follow;

use crate::telemetry::logging;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub use npc_ai::NpcBrain;
pub use path_follow::PathFollower;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerSignal {
    Running = 0,
    Stop = 1,
}

/// Shared stop flag for every periodic worker.
#[derive(Debug)]
pub struct WorkerControl {
    signal: AtomicU8,
}

impl WorkerControl {
    pub fn new() -> Self {
        Self {
            signal: AtomicU8::new(WorkerSignal::Running as u8),
        }
    }

    pub fn request_stop(&self) {
        self.signal.store(WorkerSignal::Stop as u8, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.current_signal() == WorkerSignal::Running
    }

    fn current_signal(&self) -> WorkerSignal {
        match self.signal.load(Ordering::SeqCst) {
            0 => WorkerSignal::Running,
            _ => WorkerSignal::Stop,
        }
    }
}

impl Default for WorkerControl {
    fn default() -> Self {
        Self::new()
    }
}

const STOP_POLL: Duration = Duration::from_millis(25);

/// Runs `tick` every `interval` on its own thread until `control` stops.
/// Ticks never overlap; a slow tick delays the next one.
pub fn spawn_periodic<F>(
    name: &str,
    interval: Duration,
    control: Arc<WorkerControl>,
    mut tick: F,
) -> Result<thread::JoinHandle<()>, String>
where
    F: FnMut() + Send + 'static,
{
    let label = name.to_string();
    thread::Builder::new()
        .name(label.clone())
        .spawn(move || {
            logging::log_game(&format!("worker {} started, interval {:?}", label, interval));
            while control.is_running() {
                let started = Instant::now();
                tick();
                let deadline = started + interval;
                while control.is_running() {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::sleep((deadline - now).min(STOP_POLL));
                }
            }
            logging::log_game(&format!("worker {} stopped", label));
        })
        .map_err(|err| format!("spawn worker {} failed: {}", name, err))
}
