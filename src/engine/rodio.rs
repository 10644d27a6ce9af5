//! `rodio`-backed playback engine.
//!
//! A dedicated thread owns the output stream and the current sink and
//! processes commands from a channel; time and volume are published
//! through a shared status handle so queries never touch the audio
//! thread. End-of-stream is detected on the command-poll tick when the
//! sink drains.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::{EngineEvent, PlaybackEngine, Transport};

#[derive(Debug)]
enum EngineCmd {
    Load(String),
    SetTransport(Transport),
    Seek(Duration),
    SetVolume(f64),
    Quit,
}

#[derive(Debug)]
struct EngineStatus {
    position: Option<Duration>,
    duration: Option<Duration>,
    volume: f64,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            position: None,
            duration: None,
            volume: 1.0,
        }
    }
}

type StatusHandle = Arc<Mutex<EngineStatus>>;

fn lock_status(status: &StatusHandle) -> MutexGuard<'_, EngineStatus> {
    status.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    status: StatusHandle,
    join: Mutex<Option<thread::JoinHandle<()>>>,
}

impl RodioEngine {
    /// Spawn the engine thread. The returned receiver carries
    /// end-of-stream and error events and must be drained by a single
    /// consumer.
    pub fn spawn() -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
        let status: StatusHandle = Arc::new(Mutex::new(EngineStatus::default()));

        let status_for_thread = status.clone();
        let join = thread::spawn(move || run_engine(rx, event_tx, status_for_thread));

        (
            Self {
                tx,
                status,
                join: Mutex::new(Some(join)),
            },
            event_rx,
        )
    }

    fn send(&self, cmd: EngineCmd) {
        // A closed channel means the engine thread is gone; the error
        // event it sent on the way out already covers that.
        let _ = self.tx.send(cmd);
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, uri: &str) {
        self.send(EngineCmd::Load(uri.to_string()));
    }

    fn set_transport(&mut self, transport: Transport) {
        self.send(EngineCmd::SetTransport(transport));
    }

    fn seek(&mut self, position: Duration) {
        self.send(EngineCmd::Seek(position));
    }

    fn position(&self) -> Option<Duration> {
        lock_status(&self.status).position
    }

    fn duration(&self) -> Option<Duration> {
        lock_status(&self.status).duration
    }

    fn volume(&self) -> f64 {
        lock_status(&self.status).volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.send(EngineCmd::SetVolume(volume));
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.send(EngineCmd::Quit);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Per-thread playback state: the sink plus the bookkeeping needed to
/// answer position queries without asking the sink.
struct Playback {
    sink: Option<Sink>,
    path: Option<PathBuf>,
    transport: Transport,
    started_at: Option<Instant>,
    accumulated: Duration,
    volume: f64,
}

impl Playback {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

fn run_engine(rx: Receiver<EngineCmd>, events: Sender<EngineEvent>, status: StatusHandle) {
    let mut stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            let _ = events.send(EngineEvent::Error(format!("no audio output device: {e}")));
            return;
        }
    };
    // rodio logs to stderr when OutputStream is dropped; noisy for a shell app.
    stream.log_on_drop(false);

    let mut pb = Playback {
        sink: None,
        path: None,
        transport: Transport::Idle,
        started_at: None,
        accumulated: Duration::ZERO,
        volume: 1.0,
    };

    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(EngineCmd::Load(uri)) => {
                unload(&mut pb, &status);
                match uri_to_path(&uri) {
                    Ok(path) => match open_sink(&stream, &path, Duration::ZERO, pb.volume) {
                        Ok((sink, duration)) => {
                            pb.sink = Some(sink);
                            pb.path = Some(path);
                            let mut st = lock_status(&status);
                            st.position = Some(Duration::ZERO);
                            st.duration = duration;
                        }
                        Err(reason) => {
                            let _ = events.send(EngineEvent::Error(reason));
                        }
                    },
                    Err(reason) => {
                        let _ = events.send(EngineEvent::Error(reason));
                    }
                }
            }

            Ok(EngineCmd::SetTransport(Transport::Playing)) => {
                if let Some(sink) = &pb.sink {
                    sink.play();
                    if pb.transport != Transport::Playing {
                        pb.started_at = Some(Instant::now());
                    }
                    pb.transport = Transport::Playing;
                }
            }

            Ok(EngineCmd::SetTransport(Transport::Paused)) => {
                if let Some(sink) = &pb.sink {
                    sink.pause();
                    if let Some(started) = pb.started_at.take() {
                        pb.accumulated += started.elapsed();
                    }
                    pb.transport = Transport::Paused;
                }
            }

            Ok(EngineCmd::SetTransport(Transport::Idle)) => {
                unload(&mut pb, &status);
            }

            Ok(EngineCmd::Seek(position)) => {
                // Scrubbing: rebuild the sink and skip into the file.
                // `Source::skip_duration` is the seeking primitive.
                let Some(path) = pb.path.clone() else {
                    continue;
                };
                if let Some(sink) = pb.sink.take() {
                    sink.stop();
                }
                match open_sink(&stream, &path, position, pb.volume) {
                    Ok((sink, duration)) => {
                        if pb.transport == Transport::Playing {
                            sink.play();
                            pb.started_at = Some(Instant::now());
                        } else {
                            pb.started_at = None;
                        }
                        pb.sink = Some(sink);
                        pb.accumulated = position;
                        let mut st = lock_status(&status);
                        st.position = Some(position);
                        st.duration = duration;
                    }
                    Err(reason) => {
                        unload(&mut pb, &status);
                        let _ = events.send(EngineEvent::Error(reason));
                    }
                }
            }

            Ok(EngineCmd::SetVolume(volume)) => {
                pb.volume = volume;
                if let Some(sink) = &pb.sink {
                    sink.set_volume(volume as f32);
                }
                lock_status(&status).volume = volume;
            }

            Ok(EngineCmd::Quit) => {
                if let Some(sink) = &pb.sink {
                    sink.stop();
                }
                break;
            }

            Err(RecvTimeoutError::Timeout) => {
                if pb.path.is_some() {
                    lock_status(&status).position = Some(pb.elapsed());
                }
                // End-of-stream check: a playing sink that drained its source.
                let drained = pb.transport == Transport::Playing
                    && pb.sink.as_ref().is_some_and(|s| s.empty());
                if drained {
                    unload(&mut pb, &status);
                    if events.send(EngineEvent::EndOfStream).is_err() {
                        warn!("engine event channel closed, shutting down");
                        break;
                    }
                }
            }

            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn unload(pb: &mut Playback, status: &StatusHandle) {
    if let Some(sink) = pb.sink.take() {
        sink.stop();
    }
    pb.path = None;
    pb.transport = Transport::Idle;
    pb.started_at = None;
    pb.accumulated = Duration::ZERO;
    let mut st = lock_status(status);
    st.position = None;
    st.duration = None;
}

/// Map a `file://` URI back to a filesystem path.
fn uri_to_path(uri: &str) -> Result<PathBuf, String> {
    let Some(encoded) = uri.strip_prefix("file://") else {
        return Err(format!("unsupported uri scheme: {uri}"));
    };
    let decoded = urlencoding::decode(encoded).map_err(|e| format!("bad uri {uri}: {e}"))?;
    Ok(PathBuf::from(decoded.into_owned()))
}

/// Open and decode `path`, returning a paused sink positioned at
/// `start_at` plus the total duration when the decoder knows it.
fn open_sink(
    stream: &OutputStream,
    path: &std::path::Path,
    start_at: Duration,
    volume: f64,
) -> Result<(Sink, Option<Duration>), String> {
    let file =
        File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;

    let duration = source.total_duration();
    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume as f32);
    sink.append(source.skip_duration(start_at));
    sink.pause();
    Ok((sink, duration))
}
