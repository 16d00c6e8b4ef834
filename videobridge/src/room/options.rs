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

use serde::{Deserialize, Serialize};

use crate::engine::{AudioDevice, CameraSource};
use crate::track::VideoDimensions;

/// Bounds handed to the engine when the local video track is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoConstraints {
    pub min_dimensions: VideoDimensions,
    pub max_dimensions: VideoDimensions,
    pub min_fps: u32,
    pub max_fps: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            min_dimensions: VideoDimensions::CIF,
            max_dimensions: VideoDimensions::HD_720P,
            min_fps: 5,
            max_fps: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomOptions {
    /// Prepended to every outbound event name, e.g. `TwilioVideo.`
    pub event_prefix: String,
    pub automatic_subscription: bool,
    pub video_constraints: VideoConstraints,
    /// Sources tried in order when a capturer is needed
    pub camera_preference: Vec<CameraSource>,
    pub preferred_audio_devices: Vec<AudioDevice>,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            event_prefix: String::new(),
            automatic_subscription: false,
            video_constraints: VideoConstraints::default(),
            camera_preference: vec![CameraSource::Front, CameraSource::Back],
            preferred_audio_devices: vec![
                AudioDevice::BluetoothHeadset,
                AudioDevice::WiredHeadset,
                AudioDevice::Speakerphone,
            ],
        }
    }
}

impl RoomOptions {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Per-connect choice of local media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalMediaOptions {
    pub enable_audio: bool,
    pub enable_video: bool,
}

impl Default for LocalMediaOptions {
    fn default() -> Self {
        Self { enable_audio: true, enable_video: true }
    }
}
