//! Background volume loading
//!
//! Files are read and decoded on a worker thread. The result comes back to
//! the event loop as a [`UserEvent`] and is applied only if no newer load was
//! requested in the meantime.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use winit::event_loop::EventLoopProxy;
use voxcast_core::{LoadGeneration, LoadTicket, Volume, VolumeError};
use crate::config::VolumeConfig;

/// A finished load, successful or not
#[derive(Debug)]
pub struct VolumeLoaded {
    pub ticket: LoadTicket,
    pub path: PathBuf,
    pub result: Result<Volume, VolumeError>,
}

/// Events sent to the winit event loop from worker threads
#[derive(Debug)]
pub enum UserEvent {
    VolumeLoaded(VolumeLoaded),
}

/// Where a worker thread reports a finished load
pub trait LoadNotifier: Clone + Send + 'static {
    fn notify(&self, loaded: VolumeLoaded);
}

impl LoadNotifier for EventLoopProxy<UserEvent> {
    fn notify(&self, loaded: VolumeLoaded) {
        // Fails only once the event loop is gone
        if self.send_event(UserEvent::VolumeLoaded(loaded)).is_err() {
            log::debug!("Event loop closed; dropping load result");
        }
    }
}

impl LoadNotifier for mpsc::Sender<VolumeLoaded> {
    fn notify(&self, loaded: VolumeLoaded) {
        let _ = self.send(loaded);
    }
}

/// Starts loads and filters their results
pub struct LoadSystem<N: LoadNotifier> {
    notifier: N,
    generation: LoadGeneration,
    dimensions: (u32, u32, u32),
    histogram_bins: usize,
}

impl<N: LoadNotifier> LoadSystem<N> {
    pub fn new(notifier: N, config: &VolumeConfig) -> Self {
        Self {
            notifier,
            generation: LoadGeneration::new(),
            dimensions: (config.width, config.height, config.depth),
            histogram_bins: config.histogram_bins,
        }
    }

    /// Load `path` in the background, superseding any load in flight
    pub fn request(&mut self, path: impl AsRef<Path>) -> LoadTicket {
        let path = path.as_ref().to_path_buf();
        let ticket = self.generation.begin();
        let (width, height, depth) = self.dimensions;
        log::info!(
            "Loading {} as {}x{}x{} (load #{})",
            path.display(),
            width,
            height,
            depth,
            ticket.generation()
        );

        let notifier = self.notifier.clone();
        let worker_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name("volume-loader".to_string())
            .spawn(move || {
                let result = Volume::load_from_file(&worker_path, width, height, depth);
                notifier.notify(VolumeLoaded {
                    ticket,
                    path: worker_path,
                    result,
                });
            });

        if let Err(e) = spawned {
            log::error!("Failed to start loader thread: {}", e);
            self.notifier.notify(VolumeLoaded {
                ticket,
                path,
                result: Err(VolumeError::Io(e)),
            });
        }
        ticket
    }

    /// Decide what to do with a finished load
    ///
    /// Returns the volume to display, or `None` when the result is stale or
    /// failed. In both cases whatever is currently displayed stays.
    pub fn finish(&mut self, loaded: VolumeLoaded) -> Option<Volume> {
        let VolumeLoaded { ticket, path, result } = loaded;
        if !self.generation.accept(ticket) {
            log::debug!(
                "Discarding stale load #{} of {}",
                ticket.generation(),
                path.display()
            );
            return None;
        }

        match result {
            Ok(volume) => {
                let histogram = volume.histogram(self.histogram_bins);
                log::info!(
                    "Loaded {} ({} voxels, max sample {}, histogram peak {})",
                    path.display(),
                    volume.voxel_count(),
                    volume.max(),
                    histogram.peak()
                );
                Some(volume)
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Whether the latest request is still running
    pub fn is_loading(&self) -> bool {
        self.generation.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(width: u32, height: u32, depth: u32) -> VolumeConfig {
        VolumeConfig {
            width,
            height,
            depth,
            ..VolumeConfig::default()
        }
    }

    fn write_raw(name: &str, samples: &[u16]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("voxcast_load_{}_{}.raw", std::process::id(), name));
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn receive(rx: &mpsc::Receiver<VolumeLoaded>) -> VolumeLoaded {
        rx.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_load_applies() {
        let path = write_raw("applies", &[0, 1, 2, 3, 4, 5, 6, 7]);
        let (tx, rx) = mpsc::channel();
        let mut loads = LoadSystem::new(tx, &config(2, 2, 2));

        loads.request(&path);
        assert!(loads.is_loading());
        let volume = loads.finish(receive(&rx)).unwrap();
        assert_eq!(volume.max(), 7);
        assert!(!loads.is_loading());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let path = write_raw("wrong_size", &[1, 2, 3]);
        let (tx, rx) = mpsc::channel();
        let mut loads = LoadSystem::new(tx, &config(2, 2, 2));

        loads.request(&path);
        let loaded = receive(&rx);
        assert!(matches!(loaded.result, Err(VolumeError::Format(_))));
        assert!(loads.finish(loaded).is_none());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_older_result_is_discarded() {
        let first = write_raw("first", &[1; 8]);
        let second = write_raw("second", &[9; 8]);
        let (tx, rx) = mpsc::channel();
        let mut loads = LoadSystem::new(tx, &config(2, 2, 2));

        let old = loads.request(&first);
        let new = loads.request(&second);
        let mut results = vec![receive(&rx), receive(&rx)];
        results.sort_by_key(|r| r.ticket);
        assert_eq!(results[0].ticket, old);
        assert_eq!(results[1].ticket, new);

        // Newer first, then the slow older one
        let newer = results.pop().unwrap();
        let older = results.pop().unwrap();
        assert_eq!(loads.finish(newer).map(|v| v.max()), Some(9));
        assert!(loads.finish(older).is_none());

        std::fs::remove_file(first).ok();
        std::fs::remove_file(second).ok();
    }

    #[test]
    fn test_failed_load_keeps_displayed_volume() {
        let good = write_raw("keeps_good", &[16; 8]);
        let bad = write_raw("keeps_bad", &[1, 2, 3]);
        let (tx, rx) = mpsc::channel();
        let mut loads = LoadSystem::new(tx, &config(2, 2, 2));

        loads.request(&good);
        let mut displayed = loads.finish(receive(&rx));
        assert_eq!(displayed.as_ref().map(|v| v.max()), Some(16));

        // Only a returned volume replaces what is on screen
        loads.request(&bad);
        if let Some(volume) = loads.finish(receive(&rx)) {
            displayed = Some(volume);
        }
        assert!(!loads.is_loading());
        let volume = displayed.unwrap();
        assert_eq!(volume.dimensions(), (2, 2, 2));
        assert_eq!(volume.max(), 16);

        std::fs::remove_file(good).ok();
        std::fs::remove_file(bad).ok();
    }

    #[test]
    fn test_missing_file() {
        let (tx, rx) = mpsc::channel();
        let mut loads = LoadSystem::new(tx, &config(2, 2, 2));
        loads.request("/nonexistent/voxcast/volume.raw");
        let loaded = receive(&rx);
        assert!(matches!(loaded.result, Err(VolumeError::Io(_))));
        assert!(loads.finish(loaded).is_none());
    }
}
