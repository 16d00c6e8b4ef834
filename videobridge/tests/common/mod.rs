#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use videobridge::emitter::HostEvent;
use videobridge::engine::{
    AudioDevice, AudioRouting, CameraCapturer, CameraSource, CaptureProvider, ConnectOptions,
    EngineEmitter, EngineError, EngineEvent, EngineResult, EngineRoom, LocalDataTrack,
    LocalMediaTrack, LocalTrack, MediaEngine, Platform,
};
use videobridge::options::{LocalMediaOptions, RoomOptions, VideoConstraints};
use videobridge::prelude::*;
use videobridge::stats::StatsReport;
use videobridge::{Room, RoomInfo};

#[derive(Debug, Default)]
pub struct MockTrack {
    pub enabled: AtomicBool,
    pub released: AtomicBool,
}

impl MockTrack {
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl LocalMediaTrack for MockTrack {
    fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct MockDataTrack {
    pub sent: Mutex<Vec<String>>,
}

impl LocalDataTrack for MockDataTrack {
    fn send(&self, message: &str) -> EngineResult<()> {
        self.sent.lock().push(message.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    Audio,
    Video,
    Data,
}

#[derive(Debug)]
pub struct MockEngineRoom {
    pub info: RoomInfo,
    pub emitter: EngineEmitter,
    pub disconnect_emits_event: bool,
    pub stats_reply: Option<Vec<StatsReport>>,
    pub disconnects: AtomicUsize,
    pub stats_requests: AtomicUsize,
    pub published: Mutex<Vec<Published>>,
    pub unpublished: Mutex<Vec<Published>>,
    pub playback: Mutex<Vec<(ParticipantSid, TrackSid, bool)>>,
}

fn published(track: &LocalTrack) -> Published {
    match track {
        LocalTrack::Audio(_) => Published::Audio,
        LocalTrack::Video(_) => Published::Video,
        LocalTrack::Data(_) => Published::Data,
    }
}

impl EngineRoom for MockEngineRoom {
    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.disconnect_emits_event {
            self.emitter.send(EngineEvent::Disconnected { room: self.info.clone(), error: None });
        }
    }

    fn request_stats(&self) {
        self.stats_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(reports) = &self.stats_reply {
            self.emitter.send(EngineEvent::StatsReport(reports.clone()));
        }
    }

    fn publish_track(&self, track: &LocalTrack) -> EngineResult<()> {
        self.published.lock().push(published(track));
        Ok(())
    }

    fn unpublish_track(&self, track: &LocalTrack) {
        self.unpublished.lock().push(published(track));
    }

    fn set_remote_audio_playback(
        &self,
        participant: &ParticipantSid,
        track: &TrackSid,
        enabled: bool,
    ) {
        self.playback.lock().push((participant.clone(), track.clone(), enabled));
    }
}

#[derive(Debug, Clone)]
pub struct ConnectRecord {
    pub room_name: Option<String>,
    pub access_token: String,
    pub audio_tracks: usize,
    pub video_tracks: usize,
    pub data_tracks: usize,
    pub automatic_subscription: bool,
}

#[derive(Debug, Default)]
pub struct MockEngine {
    pub connect_error: Mutex<Option<EngineError>>,
    pub disconnect_emits_event: AtomicBool,
    pub stats_reply: Mutex<Option<Vec<StatsReport>>>,
    pub connects: Mutex<Vec<ConnectRecord>>,
    pub rooms: Mutex<Vec<Arc<MockEngineRoom>>>,
    pub emitters: Mutex<Vec<EngineEmitter>>,
    pub audio_tracks: Mutex<Vec<Arc<MockTrack>>>,
    pub video_tracks: Mutex<Vec<Arc<MockTrack>>>,
    pub data_track: Arc<MockDataTrack>,
}

impl MockEngine {
    pub fn connect_count(&self) -> usize {
        self.connects.lock().len()
    }

    pub fn last_emitter(&self) -> Result<EngineEmitter> {
        self.emitters.lock().last().cloned().ok_or_else(|| anyhow!("engine was never connected"))
    }

    pub fn last_room(&self) -> Result<Arc<MockEngineRoom>> {
        self.rooms.lock().last().cloned().ok_or_else(|| anyhow!("engine was never connected"))
    }
}

impl MediaEngine for MockEngine {
    fn create_audio_track(&self, enabled: bool) -> Option<Arc<dyn LocalMediaTrack>> {
        let track = Arc::new(MockTrack::default());
        track.enable(enabled);
        self.audio_tracks.lock().push(track.clone());
        Some(track)
    }

    fn create_video_track(
        &self,
        enabled: bool,
        _capturer: &Arc<dyn CameraCapturer>,
        _constraints: &VideoConstraints,
    ) -> Option<Arc<dyn LocalMediaTrack>> {
        let track = Arc::new(MockTrack::default());
        track.enable(enabled);
        self.video_tracks.lock().push(track.clone());
        Some(track)
    }

    fn create_data_track(&self) -> Option<Arc<dyn LocalDataTrack>> {
        Some(self.data_track.clone())
    }

    fn connect(
        &self,
        options: ConnectOptions,
        emitter: EngineEmitter,
    ) -> EngineResult<Arc<dyn EngineRoom>> {
        self.connects.lock().push(ConnectRecord {
            room_name: options.room_name.clone(),
            access_token: options.access_token.clone(),
            audio_tracks: options.audio_tracks.len(),
            video_tracks: options.video_tracks.len(),
            data_tracks: options.data_tracks.len(),
            automatic_subscription: options.automatic_subscription,
        });

        if let Some(err) = self.connect_error.lock().clone() {
            return Err(err);
        }

        let room = Arc::new(MockEngineRoom {
            info: RoomInfo { name: options.room_name.unwrap_or_default(), sid: "RM_test".into() },
            emitter: emitter.clone(),
            disconnect_emits_event: self.disconnect_emits_event.load(Ordering::SeqCst),
            stats_reply: self.stats_reply.lock().clone(),
            disconnects: AtomicUsize::new(0),
            stats_requests: AtomicUsize::new(0),
            published: Default::default(),
            unpublished: Default::default(),
            playback: Default::default(),
        });
        self.rooms.lock().push(room.clone());
        self.emitters.lock().push(emitter);
        Ok(room)
    }
}

#[derive(Debug)]
pub struct MockCapturer {
    pub source: Mutex<CameraSource>,
    pub supported_formats: bool,
    pub stopped: AtomicBool,
}

impl CameraCapturer for MockCapturer {
    fn switch_camera(&self) {
        let mut source = self.source.lock();
        *source = match *source {
            CameraSource::Front => CameraSource::Back,
            CameraSource::Back => CameraSource::Front,
        };
    }

    fn source(&self) -> CameraSource {
        *self.source.lock()
    }

    fn has_supported_formats(&self) -> bool {
        self.supported_formats
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct MockCapture {
    pub available: Vec<CameraSource>,
    pub supported_formats: bool,
    pub requests: Mutex<Vec<CameraSource>>,
    pub capturers: Mutex<Vec<Arc<MockCapturer>>>,
}

impl MockCapture {
    pub fn with_cameras(available: Vec<CameraSource>) -> Self {
        Self {
            available,
            supported_formats: true,
            requests: Default::default(),
            capturers: Default::default(),
        }
    }
}

impl CaptureProvider for MockCapture {
    fn acquire(&self, source: CameraSource) -> Option<Arc<dyn CameraCapturer>> {
        self.requests.lock().push(source);
        if !self.available.contains(&source) {
            return None;
        }
        let capturer = Arc::new(MockCapturer {
            source: Mutex::new(source),
            supported_formats: self.supported_formats,
            stopped: AtomicBool::new(false),
        });
        self.capturers.lock().push(capturer.clone());
        Some(capturer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Activate(Vec<AudioDevice>),
    Deactivate,
    Speakerphone(bool),
    BluetoothSco(bool),
}

#[derive(Debug, Default)]
pub struct MockAudio {
    pub calls: Mutex<Vec<AudioCall>>,
}

impl MockAudio {
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().clone()
    }
}

impl AudioRouting for MockAudio {
    fn activate(&self, preferred: &[AudioDevice]) {
        self.calls.lock().push(AudioCall::Activate(preferred.to_vec()));
    }

    fn deactivate(&self) {
        self.calls.lock().push(AudioCall::Deactivate);
    }

    fn set_speakerphone(&self, enabled: bool) {
        self.calls.lock().push(AudioCall::Speakerphone(enabled));
    }

    fn set_bluetooth_sco(&self, enabled: bool) {
        self.calls.lock().push(AudioCall::BluetoothSco(enabled));
    }
}

pub struct TestRoom {
    pub room: Room,
    pub events: UnboundedReceiver<HostEvent>,
    pub engine: Arc<MockEngine>,
    pub capture: Arc<MockCapture>,
    pub audio: Arc<MockAudio>,
}

impl TestRoom {
    pub fn new(capture: MockCapture, options: RoomOptions) -> Self {
        Self::with_engine(MockEngine::default(), capture, options)
    }

    pub fn with_engine(engine: MockEngine, capture: MockCapture, options: RoomOptions) -> Self {
        let engine = Arc::new(engine);
        let capture = Arc::new(capture);
        let audio = Arc::new(MockAudio::default());
        let platform = Platform {
            engine: engine.clone(),
            capture: capture.clone(),
            audio: audio.clone(),
        };

        let room = Room::new(platform, options);
        let events = room.subscribe();
        Self { room, events, engine, capture, audio }
    }

    pub async fn next_event(&mut self) -> Result<HostEvent> {
        next_event(&mut self.events).await
    }

    /// Wait for the next event named `name`, failing on any other event
    pub async fn expect_event(&mut self, name: &str) -> Result<serde_json::Value> {
        let event = self.next_event().await?;
        if event.name != name {
            return Err(anyhow!("expected {}, got {} ({})", name, event.name, event.payload));
        }
        Ok(event.payload)
    }

    pub fn assert_no_event(&mut self) {
        if let Ok(event) = self.events.try_recv() {
            panic!("unexpected event {} ({})", event.name, event.payload);
        }
    }

    /// Connect with audio only and complete the handshake with `remotes`
    /// already in the room
    pub async fn connect(&mut self, remotes: Vec<RemoteParticipant>) -> Result<EngineEmitter> {
        self.room
            .connect(
                Some("daily".to_owned()),
                "token",
                LocalMediaOptions { enable_audio: true, enable_video: false },
            )
            .await?;

        let emitter = self.engine.last_emitter()?;
        emitter.send(EngineEvent::Connected {
            room: RoomInfo { name: "daily".to_owned(), sid: "RM_test".into() },
            local_participant: LocalParticipant::new("PA_local", "me"),
            remote_participants: remotes,
        });
        self.expect_event("onRoomDidConnect").await?;
        Ok(emitter)
    }
}

pub async fn next_event(events: &mut UnboundedReceiver<HostEvent>) -> Result<HostEvent> {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .context("timed out waiting for an event")?
        .ok_or_else(|| anyhow!("event stream closed"))
}

pub fn front_and_back() -> MockCapture {
    MockCapture::with_cameras(vec![CameraSource::Front, CameraSource::Back])
}

pub fn remote(sid: &str, identity: &str) -> RemoteParticipant {
    RemoteParticipant::new(sid, identity)
}

pub fn subscribed(sid: &str, name: &str, kind: TrackKind) -> TrackPublication {
    TrackPublication::new(sid, name, kind).with_subscription(SubscriptionState::Subscribed)
}
