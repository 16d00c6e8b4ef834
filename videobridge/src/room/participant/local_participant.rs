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

/// The participant representing this endpoint. Its publications are
/// reported by the engine when the room connects.
#[derive(Debug, Clone)]
pub struct LocalParticipant {
    inner: ParticipantInner,
}

impl LocalParticipant {
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
}
