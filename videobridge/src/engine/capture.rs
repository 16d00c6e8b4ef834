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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraSource {
    Front,
    Back,
}

/// Hands out camera capturers. Returns `None` when the device has no camera
/// for the requested source.
pub trait CaptureProvider: Debug + Send + Sync {
    fn acquire(&self, source: CameraSource) -> Option<Arc<dyn CameraCapturer>>;
}

pub trait CameraCapturer: Debug + Send + Sync {
    fn switch_camera(&self);
    fn source(&self) -> CameraSource;
    fn has_supported_formats(&self) -> bool;
    fn stop(&self);
}
