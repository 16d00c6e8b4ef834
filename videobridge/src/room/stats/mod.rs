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

//! Per-connection track statistics and their host representation.

use serde::{Deserialize, Serialize};

use crate::track::VideoDimensions;

mod sampler;

pub use sampler::*;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAudioTrackStats {
    #[serde(flatten)]
    pub base: dictionaries::BaseTrackStats,

    #[serde(flatten)]
    pub remote: dictionaries::RemoteTrackStats,

    pub audio_level: i32,
    pub jitter: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVideoTrackStats {
    #[serde(flatten)]
    pub base: dictionaries::BaseTrackStats,

    #[serde(flatten)]
    pub remote: dictionaries::RemoteTrackStats,

    pub dimensions: VideoDimensions,
    pub frame_rate: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAudioTrackStats {
    #[serde(flatten)]
    pub base: dictionaries::BaseTrackStats,

    #[serde(flatten)]
    pub local: dictionaries::LocalTrackStats,

    pub audio_level: i32,
    pub jitter: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVideoTrackStats {
    #[serde(flatten)]
    pub base: dictionaries::BaseTrackStats,

    #[serde(flatten)]
    pub local: dictionaries::LocalTrackStats,

    pub dimensions: VideoDimensions,
    pub frame_rate: i32,
}

/// Track statistics for one peer connection
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    #[serde(skip)]
    pub peer_connection_id: String,
    pub remote_audio_track_stats: Vec<RemoteAudioTrackStats>,
    pub remote_video_track_stats: Vec<RemoteVideoTrackStats>,
    pub local_audio_track_stats: Vec<LocalAudioTrackStats>,
    pub local_video_track_stats: Vec<LocalVideoTrackStats>,
}

/// Build the `onStatsReceived` payload: one entry per connection id.
pub fn stats_payload(reports: &[StatsReport]) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(reports.len());
    for report in reports {
        match serde_json::to_value(report) {
            Ok(value) => {
                map.insert(report.peer_connection_id.clone(), value);
            }
            Err(err) => {
                log::error!("failed to serialize stats for {}: {}", report.peer_connection_id, err);
            }
        }
    }
    serde_json::Value::Object(map)
}

pub mod dictionaries {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[serde(default)]
    pub struct BaseTrackStats {
        pub codec: String,
        pub packets_lost: i32,
        pub ssrc: String,
        pub timestamp: f64,
        pub track_sid: String,
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[serde(default)]
    pub struct LocalTrackStats {
        pub bytes_sent: u64,
        pub packets_sent: u64,
        pub round_trip_time: i64,
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[serde(default)]
    pub struct RemoteTrackStats {
        pub bytes_received: u64,
        pub packets_received: u64,
    }
}
