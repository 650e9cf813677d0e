//! Session lifecycle tests against a scripted pty host

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};

use iftopwatch_core::{
    ControlAction, IftopSession, ProcessHandle, PtyHost, PtyProcess, SessionError, SessionEvent,
    SessionSettings, SessionState, SpawnRequest,
};

use crate::fixtures;

const BANNER: &str = "Synopsis: iftop -h | [-npblNBP] [-i interface]\n\niftop, version 1.0pre4\n";

/// Pty output fed from the test through a channel; ends when the sender drops
struct ChannelReader {
    chunks: mpsc::Receiver<Vec<u8>>,
    current: Vec<u8>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.current.is_empty() {
            match self.chunks.recv() {
                Ok(chunk) => self.current = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.drain(..n);
        Ok(n)
    }
}

#[derive(Clone, Default)]
struct RecordingWriter(Arc<Mutex<Vec<String>>>);

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FakeProcess {
    killed: Arc<AtomicBool>,
}

impl ProcessHandle for FakeProcess {
    fn process_id(&self) -> Option<u32> {
        Some(4242)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> io::Result<u32> {
        Ok(if self.killed.load(Ordering::SeqCst) { 143 } else { 0 })
    }
}

struct FakeHost {
    banner: String,
    reader: Mutex<Option<ChannelReader>>,
    writes: RecordingWriter,
    killed: Arc<AtomicBool>,
    spawns: AtomicUsize,
    last_request: Mutex<Option<SpawnRequest>>,
}

impl FakeHost {
    fn new(banner: &str) -> (Arc<Self>, mpsc::Sender<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let host = Arc::new(Self {
            banner: banner.to_string(),
            reader: Mutex::new(Some(ChannelReader {
                chunks: rx,
                current: Vec::new(),
            })),
            writes: RecordingWriter::default(),
            killed: Arc::new(AtomicBool::new(false)),
            spawns: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });
        (host, tx)
    }

    fn writes(&self) -> Vec<String> {
        self.writes.0.lock().unwrap().clone()
    }
}

impl PtyHost for FakeHost {
    fn probe(&self, _program: &str, args: &[&str]) -> io::Result<String> {
        assert_eq!(args, ["-h"]);
        Ok(self.banner.clone())
    }

    fn spawn(&self, request: &SpawnRequest) -> io::Result<PtyProcess> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let reader = self
            .reader
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| io::Error::other("spawned twice"))?;
        Ok(PtyProcess {
            reader: Box::new(reader),
            writer: Box::new(self.writes.clone()),
            handle: Box::new(FakeProcess {
                killed: Arc::clone(&self.killed),
            }),
        })
    }
}

fn session(host: &Arc<FakeHost>) -> IftopSession {
    IftopSession::with_host(SessionSettings::new("eth0"), Arc::clone(host) as Arc<dyn PtyHost>)
}

#[test]
fn test_snapshots_are_published_until_exit() {
    let (host, output) = FakeHost::new(BANNER);
    let text = fixtures::transcript(2);
    let (first, second) = text.split_at(text.len() / 2);
    output.send(first.as_bytes().to_vec()).unwrap();
    output.send(second.as_bytes().to_vec()).unwrap();

    let mut session = session(&host);
    let mut events = session.start().unwrap();
    assert_eq!(session.version(), Some("1.0pre4"));

    for _ in 0..2 {
        match events.blocking_recv() {
            Some(SessionEvent::Snapshot { snapshot, .. }) => assert_eq!(snapshot.flow_count(), 3),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }
    assert_eq!(session.state(), SessionState::Running);

    drop(output);
    assert_eq!(
        events.blocking_recv(),
        Some(SessionEvent::Stopped { exit_code: Some(0) })
    );
    assert_eq!(events.blocking_recv(), None);
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(!host.killed.load(Ordering::SeqCst));
}

#[test]
fn test_spawn_request() {
    let (host, _output) = FakeHost::new(BANNER);
    let mut session = IftopSession::with_host(
        SessionSettings::new("wlan0").with_max_rows(25),
        Arc::clone(&host) as Arc<dyn PtyHost>,
    );
    let _events = session.start().unwrap();

    let request = host.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.program, "iftop");
    assert_eq!(
        request.args,
        vec![
            "-i",
            "wlan0",
            "-t",
            "-L",
            "25",
            "-p",
            "-f",
            iftopwatch_core::settings::DEFAULT_FILTER,
            "-N"
        ]
    );
    assert_eq!((request.cols, request.rows), (120, 60));
    assert_eq!(request.term, "xterm-color");
}

#[test]
fn test_control_actions_reach_the_process() {
    let (host, _output) = FakeHost::new(BANNER);
    let mut session = session(&host);

    // Not running yet: silently ignored
    session.send(&ControlAction::ToggleDnsResolution);
    assert!(host.writes().is_empty());

    let _events = session.start().unwrap();
    session.toggle_destination_aggregation();
    session.toggle_port_display();
    session.control().send(&ControlAction::ToggleSourceAggregation);
    session.send_keystroke("P");
    assert_eq!(host.writes(), vec!["d", "p", "s", "P"]);

    session.stop();
    session.toggle_dns_resolution();
    assert_eq!(host.writes().len(), 4);
}

#[test]
fn test_unsupported_version_never_spawns() {
    let (host, _output) = FakeHost::new("iftop, version 0.17\n");
    let mut session = session(&host);

    assert_eq!(
        session.start().unwrap_err(),
        SessionError::UnsupportedVersion {
            found: Some("0.17".to_string()),
            supported: vec!["1.0pre4".to_string()],
        }
    );
    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(host.spawns.load(Ordering::SeqCst), 0);
}

#[test]
fn test_start_twice_is_rejected() {
    let (host, _output) = FakeHost::new(BANNER);
    let mut session = session(&host);
    let _events = session.start().unwrap();
    assert_eq!(
        session.start().unwrap_err(),
        SessionError::InvalidState(SessionState::Running)
    );
    assert_eq!(host.spawns.load(Ordering::SeqCst), 1);
}

#[test]
fn test_device_not_found_ends_the_session() {
    let (host, output) = FakeHost::new(BANNER);
    output
        .send(b"interface: eth0\npcap_open_live(eth0): eth0: No such device exists\n".to_vec())
        .unwrap();
    output
        .send(fixtures::report(2).into_bytes())
        .unwrap();

    let mut session = session(&host);
    let mut events = session.start().unwrap();

    assert!(matches!(
        events.blocking_recv(),
        Some(SessionEvent::Error(SessionError::DeviceNotFound(line))) if line.contains("No such device")
    ));
    assert_eq!(
        events.blocking_recv(),
        Some(SessionEvent::Stopped {
            exit_code: Some(143)
        })
    );
    assert_eq!(events.blocking_recv(), None);
    assert!(host.killed.load(Ordering::SeqCst));
    assert_eq!(session.state(), SessionState::Terminated);
}

#[test]
fn test_malformed_frame_does_not_stop_the_session() {
    let (host, output) = FakeHost::new(BANNER);
    let broken = fixtures::report(1).replace("Peak rate", "Peek rate");
    output.send(broken.into_bytes()).unwrap();
    output.send(fixtures::report(1).into_bytes()).unwrap();
    drop(output);

    let mut session = session(&host);
    let mut events = session.start().unwrap();

    assert!(matches!(
        events.blocking_recv(),
        Some(SessionEvent::MalformedFrame(_))
    ));
    assert!(matches!(
        events.blocking_recv(),
        Some(SessionEvent::Snapshot { .. })
    ));
    assert!(matches!(
        events.blocking_recv(),
        Some(SessionEvent::Stopped { .. })
    ));
}

#[test]
fn test_stop_kills_the_process() {
    let (host, output) = FakeHost::new(BANNER);
    let mut session = session(&host);
    let mut events = session.start().unwrap();

    session.stop();
    assert!(host.killed.load(Ordering::SeqCst));
    assert_eq!(session.state(), SessionState::Terminated);

    // The fake terminal closes once the test drops its end
    drop(output);
    assert_eq!(
        events.blocking_recv(),
        Some(SessionEvent::Stopped { exit_code: None })
    );

    // Idempotent, and the session cannot be restarted
    session.stop();
    assert_eq!(
        session.start().unwrap_err(),
        SessionError::InvalidState(SessionState::Terminated)
    );
}
