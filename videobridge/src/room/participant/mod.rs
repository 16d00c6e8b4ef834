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

use crate::prelude::*;

mod local_participant;
mod registry;
mod remote_participant;

pub use local_participant::*;
pub use registry::*;
pub use remote_participant::*;

macro_rules! participant_dispatch {
    ($(pub fn $fnc:ident(&self) -> $ret:ty;)+) => {
        $(
            pub fn $fnc(&self) -> $ret {
                match self {
                    Participant::Local(inner) => inner.$fnc(),
                    Participant::Remote(inner) => inner.$fnc(),
                }
            }
        )+
    };
}

/// Sid/identity pair used to describe a participant in events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParticipantInfo {
    pub sid: ParticipantSid,
    pub identity: ParticipantIdentity,
}

impl ParticipantInfo {
    pub fn new(sid: impl Into<ParticipantSid>, identity: impl Into<ParticipantIdentity>) -> Self {
        Self { sid: sid.into(), identity: identity.into() }
    }
}

#[derive(Debug, Clone)]
pub enum Participant {
    Local(LocalParticipant),
    Remote(RemoteParticipant),
}

impl Participant {
    participant_dispatch!(
        pub fn sid(&self) -> ParticipantSid;
        pub fn identity(&self) -> ParticipantIdentity;
        pub fn info(&self) -> ParticipantInfo;
        pub fn track_publications(&self) -> HashMap<TrackSid, TrackPublication>;
    );

    pub fn is_local(&self) -> bool {
        matches!(self, Participant::Local(_))
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct ParticipantInner {
    pub info: ParticipantInfo,
    pub track_publications: HashMap<TrackSid, TrackPublication>,
}

impl ParticipantInner {
    pub fn new(sid: ParticipantSid, identity: ParticipantIdentity) -> Self {
        Self { info: ParticipantInfo { sid, identity }, track_publications: HashMap::new() }
    }

    pub fn add_publication(&mut self, publication: TrackPublication) -> Option<TrackPublication> {
        self.track_publications.insert(publication.sid().clone(), publication)
    }

    pub fn subscribed(&self, kind: TrackKind) -> Vec<TrackPublication> {
        let mut publications: Vec<_> = self
            .track_publications
            .values()
            .filter(|p| p.kind() == kind && p.is_subscribed())
            .cloned()
            .collect();
        // HashMap order is unstable, keep the output deterministic
        publications.sort_by(|a, b| a.sid().cmp(b.sid()));
        publications
    }
}
