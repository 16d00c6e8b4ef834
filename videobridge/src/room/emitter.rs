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

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::engine::EngineError;
use crate::prelude::*;
use crate::stats::{stats_payload, StatsReport};
use crate::{RoomError, RoomInfo};

/// The host side of the event stream.
pub trait HostEventSink: Send + Sync {
    fn emit(&self, name: &str, payload: serde_json::Value);
}

/// An event as delivered to the host
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

impl HostEventSink for mpsc::UnboundedSender<HostEvent> {
    fn emit(&self, name: &str, payload: serde_json::Value) {
        let _ = self.send(HostEvent { name: name.to_owned(), payload });
    }
}

/// `{message, code}` as sent to the host. Errors raised locally use code 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: i32,
}

impl From<&EngineError> for ErrorInfo {
    fn from(error: &EngineError) -> Self {
        Self { message: error.message.clone(), code: error.code }
    }
}

impl From<&RoomError> for ErrorInfo {
    fn from(error: &RoomError) -> Self {
        match error {
            RoomError::ConnectFailure(err) => err.into(),
            RoomError::SubscriptionFailure { error, .. } => error.into(),
            err => Self { message: err.to_string(), code: 0 },
        }
    }
}

#[derive(Debug, Clone)]
pub enum RoomEvent {
    CameraSwitched {
        is_back_camera: bool,
    },
    VideoChanged {
        enabled: bool,
    },
    AudioChanged {
        enabled: bool,
    },
    Connected {
        room: RoomInfo,
        /// Remote participants first, the local participant last
        participants: Vec<ParticipantInfo>,
    },
    ConnectFailure {
        room: RoomInfo,
        error: ErrorInfo,
    },
    Disconnected {
        participant: Option<ParticipantIdentity>,
        room: RoomInfo,
        error: Option<ErrorInfo>,
    },
    ParticipantConnected {
        room: RoomInfo,
        participant: ParticipantInfo,
    },
    ParticipantDisconnected {
        room: RoomInfo,
        participant: ParticipantInfo,
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
        error: ErrorInfo,
    },
    TrackEnabled {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    TrackDisabled {
        participant: ParticipantInfo,
        publication: TrackPublication,
    },
    DataMessageReceived {
        message: String,
        sender: Option<ParticipantIdentity>,
    },
    StatsReceived(Vec<StatsReport>),
}

impl RoomEvent {
    /// Host event name, without prefix. `None` for events the host has no
    /// name for (enable/disable of data tracks).
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            RoomEvent::CameraSwitched { .. } => "onCameraSwitched",
            RoomEvent::VideoChanged { .. } => "onVideoChanged",
            RoomEvent::AudioChanged { .. } => "onAudioChanged",
            RoomEvent::Connected { .. } => "onRoomDidConnect",
            RoomEvent::ConnectFailure { .. } => "onRoomDidFailToConnect",
            RoomEvent::Disconnected { .. } => "onRoomDidDisconnect",
            RoomEvent::ParticipantConnected { .. } => "onRoomParticipantDidConnect",
            RoomEvent::ParticipantDisconnected { .. } => "onRoomParticipantDidDisconnect",
            RoomEvent::TrackSubscribed { publication, .. } => match publication.kind() {
                TrackKind::Audio => "onParticipantAddedAudioTrack",
                TrackKind::Video => "onParticipantAddedVideoTrack",
                TrackKind::Data => "onParticipantAddedDataTrack",
            },
            RoomEvent::TrackUnsubscribed { publication, .. } => match publication.kind() {
                TrackKind::Audio => "onParticipantRemovedAudioTrack",
                TrackKind::Video => "onParticipantRemovedVideoTrack",
                TrackKind::Data => "onParticipantRemovedDataTrack",
            },
            RoomEvent::TrackSubscriptionFailed { publication, .. } => match publication.kind() {
                TrackKind::Audio => "onParticipantFailedToSubscribeToAudioTrack",
                TrackKind::Video => "onParticipantFailedToSubscribeToVideoTrack",
                TrackKind::Data => "onParticipantFailedToSubscribeToDataTrack",
            },
            RoomEvent::TrackEnabled { publication, .. } => match publication.kind() {
                TrackKind::Audio => "onParticipantEnabledAudioTrack",
                TrackKind::Video => "onParticipantEnabledVideoTrack",
                TrackKind::Data => return None,
            },
            RoomEvent::TrackDisabled { publication, .. } => match publication.kind() {
                TrackKind::Audio => "onParticipantDisabledAudioTrack",
                TrackKind::Video => "onParticipantDisabledVideoTrack",
                TrackKind::Data => return None,
            },
            RoomEvent::DataMessageReceived { .. } => "onDataTrackMessageReceived",
            RoomEvent::StatsReceived(_) => "onStatsReceived",
        };
        Some(name)
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            RoomEvent::CameraSwitched { is_back_camera } => {
                to_payload(&CameraSwitchedPayload { is_back_camera: *is_back_camera })
            }
            RoomEvent::VideoChanged { enabled } => {
                to_payload(&VideoChangedPayload { video_enabled: *enabled })
            }
            RoomEvent::AudioChanged { enabled } => {
                to_payload(&AudioChangedPayload { audio_enabled: *enabled })
            }
            RoomEvent::Connected { room, participants } => to_payload(&ConnectedPayload {
                room_name: &room.name,
                room_sid: &room.sid,
                participants: participants.iter().map(ParticipantPayload::from).collect(),
            }),
            RoomEvent::ConnectFailure { room, error } => to_payload(&ConnectFailurePayload {
                room_name: &room.name,
                room_sid: &room.sid,
                error,
            }),
            RoomEvent::Disconnected { participant, room, error } => {
                to_payload(&DisconnectedPayload {
                    participant: participant.as_ref(),
                    room_name: &room.name,
                    room_sid: &room.sid,
                    error: error.as_ref(),
                })
            }
            RoomEvent::ParticipantConnected { room, participant }
            | RoomEvent::ParticipantDisconnected { room, participant } => {
                to_payload(&RoomParticipantPayload {
                    room_name: &room.name,
                    room_sid: &room.sid,
                    participant: participant.into(),
                })
            }
            RoomEvent::TrackSubscribed { participant, publication }
            | RoomEvent::TrackUnsubscribed { participant, publication }
            | RoomEvent::TrackEnabled { participant, publication }
            | RoomEvent::TrackDisabled { participant, publication } => {
                to_payload(&TrackEventPayload {
                    participant: participant.into(),
                    track: publication.into(),
                    error: None,
                })
            }
            RoomEvent::TrackSubscriptionFailed { participant, publication, error } => {
                to_payload(&TrackEventPayload {
                    participant: participant.into(),
                    track: publication.into(),
                    error: Some(error),
                })
            }
            RoomEvent::DataMessageReceived { message, sender } => {
                to_payload(&DataMessagePayload { message, sender_id: sender.as_ref() })
            }
            RoomEvent::StatsReceived(reports) => stats_payload(reports),
        }
    }
}

fn to_payload<T: Serialize>(payload: &T) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or_else(|err| {
        log::error!("failed to serialize event payload: {}", err);
        serde_json::Value::Null
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraSwitchedPayload {
    is_back_camera: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoChangedPayload {
    video_enabled: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioChangedPayload {
    audio_enabled: bool,
}

#[derive(Serialize)]
struct ParticipantPayload<'a> {
    identity: &'a ParticipantIdentity,
    sid: &'a ParticipantSid,
}

impl<'a> From<&'a ParticipantInfo> for ParticipantPayload<'a> {
    fn from(info: &'a ParticipantInfo) -> Self {
        Self { identity: &info.identity, sid: &info.sid }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackPayload<'a> {
    track_sid: &'a TrackSid,
    track_name: &'a str,
    enabled: bool,
}

impl<'a> From<&'a TrackPublication> for TrackPayload<'a> {
    fn from(publication: &'a TrackPublication) -> Self {
        Self {
            track_sid: publication.sid(),
            track_name: publication.name(),
            enabled: publication.is_enabled(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectedPayload<'a> {
    room_name: &'a str,
    room_sid: &'a RoomSid,
    participants: Vec<ParticipantPayload<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectFailurePayload<'a> {
    room_name: &'a str,
    room_sid: &'a RoomSid,
    error: &'a ErrorInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DisconnectedPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    participant: Option<&'a ParticipantIdentity>,
    room_name: &'a str,
    room_sid: &'a RoomSid,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ErrorInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomParticipantPayload<'a> {
    room_name: &'a str,
    room_sid: &'a RoomSid,
    participant: ParticipantPayload<'a>,
}

#[derive(Serialize)]
struct TrackEventPayload<'a> {
    participant: ParticipantPayload<'a>,
    track: TrackPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ErrorInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataMessagePayload<'a> {
    message: &'a str,
    // Serialized as null when the sending track is not bound
    sender_id: Option<&'a ParticipantIdentity>,
}

struct EmitterInner {
    prefix: String,
    sink: RwLock<Option<Arc<dyn HostEventSink>>>,
}

/// Single outbound funnel to the host listener.
///
/// Events emitted while no listener is registered are dropped.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<EmitterInner>,
}

impl Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("prefix", &self.inner.prefix)
            .field("has_listener", &self.inner.sink.read().is_some())
            .finish()
    }
}

impl EventEmitter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { inner: Arc::new(EmitterInner { prefix: prefix.into(), sink: Default::default() }) }
    }

    pub fn set_listener(&self, sink: Arc<dyn HostEventSink>) {
        *self.inner.sink.write() = Some(sink);
    }

    pub fn remove_listener(&self) {
        *self.inner.sink.write() = None;
    }

    pub fn has_listener(&self) -> bool {
        self.inner.sink.read().is_some()
    }

    pub fn emit(&self, event: RoomEvent) {
        let Some(name) = event.name() else {
            log::trace!("no host event for {:?}", event);
            return;
        };

        // Don't hold the lock while the host handles the event
        let sink = self.inner.sink.read().clone();
        let Some(sink) = sink else {
            log::debug!("dropping {} (no listener)", name);
            return;
        };

        let name = format!("{}{}", self.inner.prefix, name);
        sink.emit(&name, event.payload());
    }
}
