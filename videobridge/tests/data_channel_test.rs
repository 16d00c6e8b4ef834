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

use anyhow::Result;
use serde_json::json;
use videobridge::engine::EngineEvent;
use videobridge::options::RoomOptions;
use videobridge::prelude::*;

use common::{front_and_back, remote, subscribed, TestRoom};

mod common;

fn message(track_sid: &str, message: &str) -> EngineEvent {
    EngineEvent::DataMessage { track_sid: track_sid.into(), message: message.to_owned() }
}

#[test_log::test(tokio::test)]
async fn test_sender_of_pre_subscribed_track() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let bob = remote("PA_bob", "bob").with_publication(subscribed("TR_D", "chat", TrackKind::Data));
    let emitter = test.connect(vec![bob]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    emitter.send(message("TR_D", "hello"));

    let payload = test.expect_event("onDataTrackMessageReceived").await?;
    assert_eq!(payload, json!({"message": "hello", "senderId": "bob"}));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_binding_follows_subscription() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let emitter = test.connect(vec![remote("PA_alice", "alice")]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    let alice = ParticipantInfo::new("PA_alice", "alice");
    let publication = TrackPublication::new("TR_X", "chat", TrackKind::Data);

    emitter.send(message("TR_X", "before"));
    emitter.send(EngineEvent::TrackSubscribed {
        participant: alice.clone(),
        publication: publication.clone(),
    });
    emitter.send(message("TR_X", "during"));
    emitter.send(EngineEvent::TrackUnsubscribed {
        participant: alice.clone(),
        publication: publication.clone(),
    });
    emitter.send(message("TR_X", "after"));

    let mut events = Vec::new();
    for _ in 0..5 {
        events.push(test.next_event().await?);
    }

    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "onDataTrackMessageReceived",
            "onParticipantAddedDataTrack",
            "onDataTrackMessageReceived",
            "onParticipantRemovedDataTrack",
            "onDataTrackMessageReceived",
        ]
    );
    assert_eq!(events[0].payload, json!({"message": "before", "senderId": null}));
    assert_eq!(events[1].payload["track"]["trackSid"], "TR_X");
    assert_eq!(events[1].payload["participant"]["identity"], "alice");
    assert_eq!(events[2].payload, json!({"message": "during", "senderId": "alice"}));
    assert_eq!(events[4].payload, json!({"message": "after", "senderId": null}));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_messages_keep_order_with_departures() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let alice =
        remote("PA_alice", "alice").with_publication(subscribed("TR_X", "chat", TrackKind::Data));
    let emitter = test.connect(vec![alice.clone()]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    emitter.send(message("TR_X", "m1"));
    emitter.send(EngineEvent::TrackUnsubscribed {
        participant: alice.info(),
        publication: TrackPublication::new("TR_X", "chat", TrackKind::Data),
    });
    emitter.send(message("TR_X", "m2"));
    emitter.send(EngineEvent::ParticipantDisconnected(alice));

    assert_eq!(
        test.expect_event("onDataTrackMessageReceived").await?,
        json!({"message": "m1", "senderId": "alice"})
    );
    test.expect_event("onParticipantRemovedDataTrack").await?;
    assert_eq!(
        test.expect_event("onDataTrackMessageReceived").await?,
        json!({"message": "m2", "senderId": null})
    );
    test.expect_event("onRoomParticipantDidDisconnect").await?;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_resubscription_overwrites_binding() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let emitter = test.connect(vec![remote("PA_a", "a"), remote("PA_b", "b")]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    let publication = TrackPublication::new("TR_D", "chat", TrackKind::Data);
    for info in [ParticipantInfo::new("PA_a", "a"), ParticipantInfo::new("PA_b", "b")] {
        emitter.send(EngineEvent::TrackSubscribed {
            participant: info,
            publication: publication.clone(),
        });
        test.expect_event("onParticipantAddedDataTrack").await?;
    }

    emitter.send(message("TR_D", "who"));
    let payload = test.expect_event("onDataTrackMessageReceived").await?;
    assert_eq!(payload["senderId"], "b");
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_participant_disconnect_drops_bindings() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let bob = remote("PA_bob", "bob").with_publication(subscribed("TR_D", "chat", TrackKind::Data));
    let emitter = test.connect(vec![bob.clone()]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    emitter.send(EngineEvent::ParticipantDisconnected(bob));
    test.expect_event("onRoomParticipantDidDisconnect").await?;

    emitter.send(message("TR_D", "ghost"));
    let payload = test.expect_event("onDataTrackMessageReceived").await?;
    assert_eq!(payload["senderId"], json!(null));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_messages_after_disconnect_are_dropped() -> Result<()> {
    let mut test = TestRoom::new(front_and_back(), RoomOptions::default());
    let bob = remote("PA_bob", "bob").with_publication(subscribed("TR_D", "chat", TrackKind::Data));
    let emitter = test.connect(vec![bob]).await?;
    test.expect_event("onRoomParticipantDidConnect").await?;

    test.room.disconnect().await?;
    emitter.send(message("TR_D", "too late"));

    // Round trip through the room task so the message has been handled
    test.room.snapshot().await?;
    test.assert_no_event();
    Ok(())
}
