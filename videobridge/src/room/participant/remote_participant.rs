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

use std::collections::HashMap;

use super::{ParticipantInfo, ParticipantInner};
use crate::prelude::*;

/// Mirror of a remote participant as last reported by the engine.
#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    inner: ParticipantInner,
}

impl RemoteParticipant {
    pub fn new(sid: impl Into<ParticipantSid>, identity: impl Into<ParticipantIdentity>) -> Self {
        Self { inner: ParticipantInner::new(sid.into(), identity.into()) }
    }

    pub fn with_publication(mut self, publication: TrackPublication) -> Self {
        self.inner.add_publication(publication);
        self
    }

    pub fn sid(&self) -> ParticipantSid {
        self.inner.info.sid.clone()
    }

    pub fn identity(&self) -> ParticipantIdentity {
        self.inner.info.identity.clone()
    }

    pub fn info(&self) -> ParticipantInfo {
        self.inner.info.clone()
    }

    pub fn track_publications(&self) -> HashMap<TrackSid, TrackPublication> {
        self.inner.track_publications.clone()
    }

    pub fn get_track_publication(&self, sid: &TrackSid) -> Option<&TrackPublication> {
        self.inner.track_publications.get(sid)
    }

    /// Subscribed data tracks, sorted by sid
    pub fn subscribed_data_tracks(&self) -> Vec<TrackPublication> {
        self.inner.subscribed(TrackKind::Data)
    }

    pub fn subscribed_audio_tracks(&self) -> Vec<TrackPublication> {
        self.inner.subscribed(TrackKind::Audio)
    }

    pub(crate) fn add_publication(&mut self, publication: TrackPublication) {
        self.inner.add_publication(publication);
    }

    pub(crate) fn remove_publication(&mut self, sid: &TrackSid) -> Option<TrackPublication> {
        self.inner.track_publications.remove(sid)
    }

    pub(crate) fn publication_mut(&mut self, sid: &TrackSid) -> Option<&mut TrackPublication> {
        self.inner.track_publications.get_mut(sid)
    }
}
