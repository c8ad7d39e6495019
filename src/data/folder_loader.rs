//! Background thread page loader for files on disk (native only)
//!
//! This module provides a `FolderPageLoader` that reads, decodes and runs
//! panel detection for page images on a background thread, so the
//! navigator never blocks on file I/O or detection.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use web_time::Instant;

use super::detection::{DetectorConfig, PanelDetector};
use super::loader::{LoadCompletion, LoadError, PageLoader, build_page};
use super::sources::PageSources;

/// Request to load one page, sent to the background thread.
struct LoadRequest {
    page_index: usize,
    path: PathBuf,
    name: String,
}

/// Message sent to the loader thread.
enum ThreadMessage {
    /// Load a page
    Load(LoadRequest),
    /// Shutdown the thread
    Shutdown,
}

/// Loads page files on a background thread.
///
/// Results are delivered in completion order through
/// [`PageLoader::poll_completed`].
pub struct FolderPageLoader {
    sources: PageSources,
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for results from the background thread
    result_rx: Receiver<LoadCompletion>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Page indices requested but not yet returned
    pending: HashSet<usize>,
    /// Failures answered without reaching the thread
    rejected: VecDeque<LoadCompletion>,
}

impl FolderPageLoader {
    /// Spawn a new loader thread over `sources`.
    ///
    /// The detector and its configuration move onto the thread.
    pub fn spawn(
        sources: PageSources,
        detector: Box<dyn PanelDetector>,
        config: DetectorConfig,
    ) -> Result<Self, LoadError> {
        config.validate()?;

        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<LoadCompletion>();

        let thread_handle = thread::Builder::new()
            .name("page-loader".to_string())
            .spawn(move || {
                log::info!("Page loader thread started");
                Self::thread_loop(request_rx, result_tx, detector.as_ref(), &config);
                log::info!("Page loader thread exiting");
            })?;

        log::info!("Page loader spawned for {} pages", sources.len());

        Ok(Self {
            sources,
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: HashSet::new(),
            rejected: VecDeque::new(),
        })
    }

    /// Background thread main loop.
    fn thread_loop(
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<LoadCompletion>,
        detector: &dyn PanelDetector,
        config: &DetectorConfig,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Load(request)) => {
                    let started = Instant::now();
                    let result = std::fs::read(&request.path)
                        .map_err(LoadError::from)
                        .and_then(|bytes| build_page(&request.name, &bytes, detector, config));

                    match &result {
                        Ok(page) => log::info!(
                            "Loaded page {} ({}) with {} panels in {:?}",
                            request.page_index,
                            request.name,
                            page.panel_count(),
                            started.elapsed()
                        ),
                        Err(e) => log::warn!(
                            "Failed to load page {} ({}): {}",
                            request.page_index,
                            request.name,
                            e
                        ),
                    }

                    if result_tx
                        .send(LoadCompletion::new(request.page_index, result))
                        .is_err()
                    {
                        log::warn!("Result channel closed, page loader thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    // Channel closed, exit
                    log::debug!("Request channel closed, page loader thread exiting");
                    break;
                }
            }
        }
    }

    /// Get the number of pending requests (in-flight + rejected, not yet taken).
    pub fn pending_count(&self) -> usize {
        self.pending.len() + self.rejected.len()
    }

    /// Check if a specific page has a pending request.
    pub fn is_pending(&self, page_index: usize) -> bool {
        self.pending.contains(&page_index)
    }

    /// Block until one result arrives or `timeout` elapses.
    pub fn wait_completed(&mut self, timeout: Duration) -> Option<LoadCompletion> {
        if let Some(completion) = self.rejected.pop_front() {
            return Some(completion);
        }
        match self.result_rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.pending.remove(&completion.page_index);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.fail_one_pending(),
        }
    }

    /// Answer an outstanding request with `Disconnected` once the thread is gone.
    fn fail_one_pending(&mut self) -> Option<LoadCompletion> {
        let page_index = *self.pending.iter().next()?;
        self.pending.remove(&page_index);
        log::warn!("Page loader thread disconnected");
        Some(LoadCompletion::new(page_index, Err(LoadError::Disconnected)))
    }
}

impl PageLoader for FolderPageLoader {
    fn page_count(&self) -> usize {
        self.sources.len()
    }

    fn request(&mut self, page_index: usize) {
        let (Some(path), Some(name)) = (self.sources.get(page_index), self.sources.name(page_index))
        else {
            log::warn!("Requested page {} has no source", page_index);
            self.rejected.push_back(LoadCompletion::new(
                page_index,
                Err(LoadError::NoSuchPage(page_index)),
            ));
            return;
        };

        let request = LoadRequest {
            page_index,
            path: path.to_path_buf(),
            name,
        };

        self.pending.insert(page_index);
        if self
            .request_tx
            .send(ThreadMessage::Load(request))
            .is_err()
        {
            log::error!("Failed to send load request: channel closed");
            self.pending.remove(&page_index);
            self.rejected
                .push_back(LoadCompletion::new(page_index, Err(LoadError::Disconnected)));
        } else {
            log::debug!("Sent load request for page {}", page_index);
        }
    }

    fn poll_completed(&mut self) -> Option<LoadCompletion> {
        if let Some(completion) = self.rejected.pop_front() {
            return Some(completion);
        }
        match self.result_rx.try_recv() {
            Ok(completion) => {
                self.pending.remove(&completion.page_index);
                Some(completion)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.fail_one_pending(),
        }
    }
}

impl Drop for FolderPageLoader {
    fn drop(&mut self) {
        log::debug!("Shutting down page loader thread");

        // Send shutdown signal
        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        // Wait for thread to finish
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Page loader thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::detection::{DetectionError, FullPageDetector, ManifestDetector};
    use crate::test_support::png_bytes;

    const WAIT: Duration = Duration::from_secs(10);

    fn chapter(files: &[(&str, Vec<u8>)]) -> (tempfile::TempDir, PageSources) {
        let dir = tempfile::tempdir().unwrap();
        for (name, bytes) in files {
            std::fs::write(dir.path().join(name), bytes).unwrap();
        }
        let sources = PageSources::from_folder(dir.path()).unwrap();
        (dir, sources)
    }

    #[test]
    fn test_loads_page_in_background() {
        let (_dir, sources) = chapter(&[("0001.png", png_bytes(40, 60)), ("0002.png", png_bytes(8, 8))]);
        let mut loader =
            FolderPageLoader::spawn(sources, Box::new(FullPageDetector), DetectorConfig::default())
                .unwrap();
        assert_eq!(loader.page_count(), 2);

        loader.request(0);
        assert!(loader.is_pending(0));

        let completion = loader.wait_completed(WAIT).unwrap();
        assert_eq!(completion.page_index, 0);
        let page = completion.result.unwrap();
        assert_eq!(page.natural_size().width, 40.0);
        assert_eq!(page.panel_count(), 1);
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let (_dir, sources) = chapter(&[("0001.png", b"broken".to_vec())]);
        let mut loader =
            FolderPageLoader::spawn(sources, Box::new(FullPageDetector), DetectorConfig::default())
                .unwrap();

        loader.request(0);
        let completion = loader.wait_completed(WAIT).unwrap();
        assert!(matches!(completion.result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_detection_failure_is_reported() {
        let (_dir, sources) = chapter(&[("0001.png", png_bytes(10, 10))]);
        let detector = ManifestDetector::from_entries(Vec::new());
        let mut loader =
            FolderPageLoader::spawn(sources, Box::new(detector), DetectorConfig::default())
                .unwrap();

        loader.request(0);
        let completion = loader.wait_completed(WAIT).unwrap();
        assert!(matches!(
            completion.result,
            Err(LoadError::Detection(DetectionError::NotInManifest { .. }))
        ));
    }

    #[test]
    fn test_unknown_page_is_rejected_immediately() {
        let (_dir, sources) = chapter(&[("0001.png", png_bytes(10, 10))]);
        let mut loader =
            FolderPageLoader::spawn(sources, Box::new(FullPageDetector), DetectorConfig::default())
                .unwrap();

        loader.request(7);
        let completion = loader.poll_completed().unwrap();
        assert_eq!(completion.page_index, 7);
        assert!(matches!(completion.result, Err(LoadError::NoSuchPage(7))));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let (_dir, sources) = chapter(&[("0001.png", png_bytes(10, 10))]);
        let config = DetectorConfig {
            rdp_epsilon: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            FolderPageLoader::spawn(sources, Box::new(FullPageDetector), config),
            Err(LoadError::Detection(DetectionError::InvalidConfig(_)))
        ));
    }
}
