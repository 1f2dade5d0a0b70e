//! Atomic progress counters shared between the search engines and a
//! background stderr reporter: nodes expanded and (for BP-CRT) which `kp`
//! the sweep is currently on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub struct Progress {
    pub nodes_expanded: AtomicU64,
    pub solutions_found: AtomicU64,
    pub current: Mutex<String>,
    /// Lowest outer-sweep candidate (e.g. `kp`) dispatched to any worker so
    /// far. Conservative resume point: re-trying it costs one extra
    /// candidate, never skips one.
    pub low_water_mark: AtomicU64,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            nodes_expanded: AtomicU64::new(0),
            solutions_found: AtomicU64::new(0),
            current: Mutex::new(String::new()),
            low_water_mark: AtomicU64::new(u64::MAX),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn start_reporter(self: &Arc<Self>) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || loop {
            thread::sleep(Duration::from_secs(30));
            if progress.shutdown.load(Ordering::Relaxed) {
                break;
            }
            progress.print_status();
        })
    }

    pub fn print_status(&self) {
        let elapsed = self.start.elapsed();
        let nodes = self.nodes_expanded.load(Ordering::Relaxed);
        let solutions = self.solutions_found.load(Ordering::Relaxed);
        let current = self.current.lock().unwrap().clone();
        let rate = if elapsed.as_secs() > 0 {
            nodes as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        eprintln!(
            "[{:02}:{:02}:{:02}] {} | nodes: {} | {:.2}/s | solutions: {}",
            h, m, s, current, nodes, rate, solutions
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let p = Progress::new();
        assert_eq!(p.nodes_expanded.load(Ordering::Relaxed), 0);
        assert_eq!(p.solutions_found.load(Ordering::Relaxed), 0);
        assert_eq!(*p.current.lock().unwrap(), "");
    }

    #[test]
    fn increment_updates_value() {
        let p = Progress::new();
        p.nodes_expanded.fetch_add(10, Ordering::Relaxed);
        p.solutions_found.fetch_add(1, Ordering::Relaxed);
        assert_eq!(p.nodes_expanded.load(Ordering::Relaxed), 10);
        assert_eq!(p.solutions_found.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn current_string_updates() {
        let p = Progress::new();
        *p.current.lock().unwrap() = "kp=6".to_string();
        assert_eq!(*p.current.lock().unwrap(), "kp=6");
    }

    #[test]
    fn low_water_mark_tracks_the_minimum() {
        let p = Progress::new();
        p.low_water_mark.fetch_min(9, Ordering::Relaxed);
        p.low_water_mark.fetch_min(4, Ordering::Relaxed);
        p.low_water_mark.fetch_min(7, Ordering::Relaxed);
        assert_eq!(p.low_water_mark.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn concurrent_increments_are_accurate() {
        let p = Progress::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        p.nodes_expanded.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(p.nodes_expanded.load(Ordering::Relaxed), 8000);
    }

    #[test]
    fn stop_sets_shutdown_flag() {
        let p = Progress::new();
        assert!(!p.shutdown.load(Ordering::Relaxed));
        p.stop();
        assert!(p.shutdown.load(Ordering::Relaxed));
    }

    #[test]
    fn print_status_does_not_panic() {
        let p = Progress::new();
        p.nodes_expanded.fetch_add(100, Ordering::Relaxed);
        p.solutions_found.fetch_add(1, Ordering::Relaxed);
        *p.current.lock().unwrap() = "kp=3".to_string();
        p.print_status();
    }
}
