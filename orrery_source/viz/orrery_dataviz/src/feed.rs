use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use log::{debug, warn};

use crate::{DataError, ScenarioData};

/// Something that can produce scenario data, possibly slowly.
pub trait ScenarioSource: Send + 'static {
    fn load(&self) -> Result<ScenarioData, DataError>;

    fn describe(&self) -> String {
        String::from("scenario source")
    }
}

/// Reads `{scenarioA, scenarioB, active?}` from a JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScenarioSource for JsonFileSource {
    fn load(&self) -> Result<ScenarioData, DataError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;
        ScenarioData::from_json_str(&text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

enum FeedState {
    Waiting(Receiver<Result<ScenarioData, DataError>>),
    Ready(ScenarioData),
    Done,
}

/// Scenario data arriving from a loader thread. Polled once per frame until it
/// yields, then stays empty.
pub struct PendingFeed {
    state: FeedState,
}

impl PendingFeed {
    /// Starts loading `source` on its own thread.
    pub fn spawn(source: impl ScenarioSource) -> Self {
        let (tx, rx) = mpsc::channel();
        let label = source.describe();
        let spawned = std::thread::Builder::new()
            .name("orrery-data-feed".to_string())
            .spawn(move || {
                let result = source.load();
                // Receiver may be gone if the owner was dropped; nothing to do then.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => {
                debug!("[feed] loading {label}");
                Self {
                    state: FeedState::Waiting(rx),
                }
            }
            Err(err) => {
                warn!("[feed] could not spawn loader for {label}: {err}");
                Self {
                    state: FeedState::Done,
                }
            }
        }
    }

    /// A feed that already holds its data.
    pub fn ready(data: ScenarioData) -> Self {
        Self {
            state: FeedState::Ready(data),
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self.state, FeedState::Done)
    }

    /// `Ok(None)` while the loader is still running and after delivery.
    pub fn poll(&mut self) -> Result<Option<ScenarioData>, DataError> {
        match std::mem::replace(&mut self.state, FeedState::Done) {
            FeedState::Done => Ok(None),
            FeedState::Ready(data) => Ok(Some(data)),
            FeedState::Waiting(rx) => match rx.try_recv() {
                Ok(result) => result.map(Some),
                Err(TryRecvError::Empty) => {
                    self.state = FeedState::Waiting(rx);
                    Ok(None)
                }
                Err(TryRecvError::Disconnected) => Err(DataError::FeedDisconnected),
            },
        }
    }
}
