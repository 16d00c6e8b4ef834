// Copyright 2025 LiveKit, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Seams to the vendor media engine and the platform.
//!
//! The core never captures, encodes or transports media itself. Everything it
//! needs from the outside world goes through the traits in this module, and
//! everything the engine reports back comes in as an [`EngineEvent`].

use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::options::VideoConstraints;
use crate::prelude::*;
use crate::stats::StatsReport;
use crate::RoomInfo;

pub mod audio;
pub mod capture;

pub use audio::*;
pub use capture::*;

pub type EngineResult<T> = Result<T, EngineError>;

/// Error reported by the vendor SDK
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct EngineError {
    pub message: String,
    pub code: i32,
}

impl EngineError {
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self { message: message.into(), code }
    }
}

pub trait LocalMediaTrack: Debug + Send + Sync {
    fn enable(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
    fn release(&self);
}

pub trait LocalDataTrack: Debug + Send + Sync {
    fn send(&self, message: &str) -> EngineResult<()>;
}

#[derive(Debug, Clone)]
pub enum LocalTrack {
    Audio(Arc<dyn LocalMediaTrack>),
    Video(Arc<dyn LocalMediaTrack>),
    Data(Arc<dyn LocalDataTrack>),
}

impl LocalTrack {
    pub fn kind(&self) -> TrackKind {
        match self {
            LocalTrack::Audio(_) => TrackKind::Audio,
            LocalTrack::Video(_) => TrackKind::Video,
            LocalTrack::Data(_) => TrackKind::Data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub room_name: Option<String>,
    pub access_token: String,
    pub audio_tracks: Vec<Arc<dyn LocalMediaTrack>>,
    pub video_tracks: Vec<Arc<dyn LocalMediaTrack>>,
    pub data_tracks: Vec<Arc<dyn LocalDataTrack>>,
    pub automatic_subscription: bool,
    pub video_constraints: VideoConstraints,
}

pub trait MediaEngine: Debug + Send + Sync {
    fn create_audio_track(&self, enabled: bool) -> Option<Arc<dyn LocalMediaTrack>>;

    fn create_video_track(
        &self,
        enabled: bool,
        capturer: &Arc<dyn CameraCapturer>,
        constraints: &VideoConstraints,
    ) -> Option<Arc<dyn LocalMediaTrack>>;

    fn create_data_track(&self) -> Option<Arc<dyn LocalDataTrack>>;

    /// Start connecting. The outcome is reported through `emitter`.
    fn connect(
        &self,
        options: ConnectOptions,
        emitter: EngineEmitter,
    ) -> EngineResult<Arc<dyn EngineRoom>>;
}

/// Handle on a room the engine is connecting or connected to.
pub trait EngineRoom: Debug + Send + Sync {
    fn disconnect(&self);
    /// The answer arrives as [`EngineEvent::StatsReport`]
    fn request_stats(&self);
    fn publish_track(&self, track: &LocalTrack) -> EngineResult<()>;
    fn unpublish_track(&self, track: &LocalTrack);
    fn set_remote_audio_playback(
        &self,
        participant: &ParticipantSid,
        track: &TrackSid,
        enabled: bool,
    );
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Connected {
        room: RoomInfo,
        local_participant: LocalParticipant,
        remote_participants: Vec<RemoteParticipant>,
    },
    ConnectFailure {
        room: RoomInfo,
        error: EngineError,
    },
    Reconnecting {
        error: EngineError,
    },
    Reconnected,
    Disconnected {
        room: RoomInfo,
        error: Option<EngineError>,
    },
    ParticipantConnected(RemoteParticipant),
    ParticipantDisconnected(RemoteParticipant),
    TrackPublished {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackUnpublished {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackSubscribed {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackUnsubscribed {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackSubscriptionFailed {
        participant: ParticipantInfo,
        publication: TrackPublication,
        error: EngineError,
    },
    TrackEnabled {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackDisabled {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    DataMessage {
        track_sid: TrackSid,
        message: String,
    },
    StatsReport(Vec<StatsReport>),
}

#[derive(Debug)]
pub(crate) struct SessionEvent {
    pub session_id: u64,
    pub event: EngineEvent,
}

/// Callback handle given to the engine on connect.
///
/// Every event is tagged with the session it was created for so the room can
/// drop callbacks that arrive after that session ended.
#[derive(Debug, Clone)]
pub struct EngineEmitter {
    session_id: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EngineEmitter {
    pub(crate) fn new(session_id: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { session_id, tx }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Returns false when the room is gone
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(SessionEvent { session_id: self.session_id, event }).is_ok()
    }
}

/// External collaborators a [`crate::Room`] is built on
#[derive(Debug, Clone)]
pub struct Platform {
    pub engine: Arc<dyn MediaEngine>,
    pub capture: Arc<dyn CaptureProvider>,
    pub audio: Arc<dyn AudioRouting>,
}
