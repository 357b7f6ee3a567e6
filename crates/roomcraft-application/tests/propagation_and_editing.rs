mod common;

use common::{StubClient, designing_project, floorplan, reviewing_room, solid_png};
use roomcraft_application::prompts;
use roomcraft_application::{ApprovedView, GenerationOrchestrator};
use roomcraft_core::analysis::RoomDescriptor;
use roomcraft_core::error::RoomcraftError;
use roomcraft_core::generation::GenerationTask;
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{Perspective, Room, RoomMode, RoomStatus, StructuralAction};

#[tokio::test]
async fn test_master_style_overrides_later_room_references() {
    let client = StubClient::new();
    let h1 = ImageHandle::png(b"H1".to_vec());
    let h2 = ImageHandle::png(b"H2".to_vec());
    let local_ref = ImageHandle::png(b"R2".to_vec());
    let global = ImageHandle::png(b"G".to_vec());
    client.set_image(GenerationTask::Hero, h1.clone());

    let (wf, ids) = designing_project(&client, &["Living Room", "Kitchen"]).await;
    wf.set_global_style(Some(global.clone())).await.unwrap();
    reviewing_room(&wf, &ids[0]).await;
    assert!(wf.approve_hero(&ids[0]).await.unwrap().master_style_locked);
    wf.finish_room(&ids[0]).await.unwrap();

    client.set_image(GenerationTask::Hero, h2.clone());
    wf.set_style_reference(&ids[1], Some(local_ref.clone()))
        .await
        .unwrap();
    reviewing_room(&wf, &ids[1]).await;
    let outcome = wf.approve_hero(&ids[1]).await.unwrap();
    assert!(!outcome.master_style_locked);

    let heroes = client.requests_for(GenerationTask::Hero);
    assert_eq!(heroes[0].image(prompts::MASTER_STYLE), None);
    assert_eq!(heroes[0].image(prompts::STYLE_REFERENCE), Some(&global));

    let labels: Vec<&str> = heroes[1].images.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            prompts::FLOORPLAN,
            prompts::MASTER_STYLE,
            prompts::STYLE_REFERENCE,
            prompts::SKETCH
        ]
    );
    assert_eq!(heroes[1].image(prompts::MASTER_STYLE), Some(&h1));
    assert_eq!(heroes[1].image(prompts::STYLE_REFERENCE), Some(&local_ref));

    let project = wf.snapshot().await;
    assert_eq!(project.master_style.get(), Some(&h1));
    assert_eq!(project.room(&ids[1]).unwrap().hero(), Some(&h2));
}

#[tokio::test]
async fn test_edit_after_approval_syncs_other_views() {
    let client = StubClient::new();
    let (wf, ids) = designing_project(&client, &["Den"]).await;
    let room_id = &ids[0];
    reviewing_room(&wf, room_id).await;
    wf.approve_hero(room_id).await.unwrap();

    let refined = ImageHandle::png(b"R1".to_vec());
    let synced_wide = ImageHandle::png(b"W2".to_vec());
    client.set_image(GenerationTask::Refine, refined.clone());
    client.set_image(GenerationTask::View(Perspective::Wide), synced_wide.clone());
    let gate = client.gate(GenerationTask::View(Perspective::Wide));

    let outcome = wf.refine_view(room_id, "Warmer lighting", None).await.unwrap();
    assert_eq!(outcome.image, refined);
    let sync = outcome.sync.expect("approved edit starts a sync");

    assert!(wf.snapshot().await.syncing);
    assert!(matches!(
        wf.set_notes(room_id, "later").await.unwrap_err(),
        RoomcraftError::SyncInProgress
    ));
    assert!(matches!(
        wf.switch_perspective(room_id, Perspective::Wide)
            .await
            .unwrap_err(),
        RoomcraftError::SyncInProgress
    ));

    gate.add_permits(1);
    let report = sync.await.unwrap().unwrap();
    assert_eq!(report.source, Perspective::Hero);
    assert_eq!(
        report.updated,
        vec![Perspective::Wide, Perspective::Overhead, Perspective::Detail]
    );
    assert!(report.failed.is_empty());

    let project = wf.snapshot().await;
    assert!(!project.syncing);
    let room = project.room(room_id).unwrap();
    assert!(!room.is_busy());
    assert_eq!(room.hero(), Some(&refined));
    assert_eq!(room.view(Perspective::Wide), Some(&synced_wide));

    let wide_requests = client.requests_for(GenerationTask::View(Perspective::Wide));
    assert_eq!(wide_requests.len(), 2);
    assert_eq!(wide_requests[1].image(prompts::SOURCE_VIEW), Some(&refined));
}

#[tokio::test]
async fn test_secondary_view_edit_regenerates_hero() {
    let client = StubClient::new();
    let (wf, ids) = designing_project(&client, &["Den"]).await;
    let room_id = &ids[0];
    reviewing_room(&wf, room_id).await;
    wf.approve_hero(room_id).await.unwrap();

    wf.switch_perspective(room_id, Perspective::Overhead)
        .await
        .unwrap();
    let outcome = wf.refine_view(room_id, "Add a rug", None).await.unwrap();
    let report = outcome.sync.unwrap().await.unwrap().unwrap();

    assert_eq!(report.source, Perspective::Overhead);
    assert!(report.updated.contains(&Perspective::Hero));
    assert!(!report.updated.contains(&Perspective::Overhead));
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(
        room.hero(),
        Some(&StubClient::default_image(GenerationTask::View(Perspective::Hero)))
    );
    assert_eq!(
        room.view(Perspective::Overhead),
        Some(&StubClient::default_image(GenerationTask::Refine))
    );
}

#[tokio::test]
async fn test_failed_sync_keeps_previous_images() {
    let client = StubClient::new();
    let (wf, ids) = designing_project(&client, &["Den"]).await;
    let room_id = &ids[0];
    reviewing_room(&wf, room_id).await;
    wf.approve_hero(room_id).await.unwrap();
    let before = wf.room(room_id).await.unwrap();

    for perspective in Perspective::SECONDARY {
        client.fail(GenerationTask::View(perspective));
    }
    let outcome = wf.refine_view(room_id, "Brighter", None).await.unwrap();
    let err = outcome.sync.unwrap().await.unwrap().unwrap_err();
    assert!(err.is_generation_failure());

    let project = wf.snapshot().await;
    assert!(!project.syncing);
    let room = project.room(room_id).unwrap();
    for perspective in Perspective::SECONDARY {
        assert_eq!(room.view(perspective), before.view(perspective));
    }
}

#[tokio::test]
async fn test_edit_before_approval_does_not_sync() {
    let client = StubClient::new();
    let (wf, ids) = designing_project(&client, &["Den"]).await;
    reviewing_room(&wf, &ids[0]).await;

    let outcome = wf.refine_view(&ids[0], "Darker floor", None).await.unwrap();
    assert!(outcome.sync.is_none());
    assert!(outcome.refresh.is_some());

    let room = wf.room(&ids[0]).await.unwrap();
    assert_eq!(room.generated_views.len(), 1);
    assert!(!wf.snapshot().await.syncing);
    for perspective in Perspective::SECONDARY {
        assert!(client.requests_for(GenerationTask::View(perspective)).is_empty());
    }
}

#[tokio::test]
async fn test_structural_delete_removes_hotspot() {
    let client = StubClient::new();
    let deleted = StubClient::default_image(GenerationTask::ModifyStructure(StructuralAction::Delete));
    client.set_text_with(GenerationTask::DetectStructuralHotspots, move |request| {
        if request.images[0].image == deleted {
            r#"[{"label":"Door","x":80,"y":50}]"#.to_string()
        } else {
            r#"[{"label":"Window","x":20,"y":10},{"label":"Door","x":80,"y":50}]"#.to_string()
        }
    });
    let (wf, ids) = designing_project(&client, &["Bedroom"]).await;
    let room_id = &ids[0];

    wf.generate_sketch(room_id).await.unwrap();
    assert_eq!(wf.room(room_id).await.unwrap().structural_hotspots.len(), 2);

    wf.open_structural_menu(room_id, Some("Window")).await.unwrap();
    assert_eq!(
        wf.room(room_id).await.unwrap().open_structural_menu(),
        Some("Window")
    );

    let sketch = wf
        .modify_structure(room_id, StructuralAction::Delete, "Window")
        .await
        .unwrap();
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(room.sketch_image, Some(sketch));
    assert_eq!(room.status, RoomStatus::ReviewingSketch);
    assert_eq!(room.open_structural_menu(), None);
    assert!(room.structural_hotspots.iter().all(|h| h.label != "Window"));
    assert!(room.chat_history.iter().any(|m| m.content == "Delete Window"));

    let err = wf
        .modify_structure(room_id, StructuralAction::MoveLeft, "Window")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(client
        .requests_for(GenerationTask::ModifyStructure(StructuralAction::MoveLeft))
        .is_empty());
}

#[tokio::test]
async fn test_focus_refine_exit_and_merge() {
    let client = StubClient::new();
    let hero = solid_png(1000, 600, 200);
    let crop_edit = ImageHandle::png(b"crop-edit".to_vec());
    client.set_image(GenerationTask::Hero, hero.clone());
    client.set_image(GenerationTask::Refine, crop_edit.clone());
    client.set_text(
        GenerationTask::DetectHotspots,
        r#"[{"label":"Armchair","x":50,"y":50}]"#,
    );
    let (wf, ids) = designing_project(&client, &["Lounge"]).await;
    let room_id = &ids[0];
    reviewing_room(&wf, room_id).await;

    let focus = wf.enter_focus(room_id, 52.0, 51.0, None).await.unwrap();
    assert_eq!(focus.label, "Armchair");
    assert_eq!(focus.region.size, 270);
    assert_eq!(focus.perspective, Perspective::Hero);
    assert!(wf.refine_view(room_id, "nope", None).await.unwrap_err().is_rejection());

    let outcome = wf.send_message(room_id, "Make it leather", None).await.unwrap();
    assert_eq!(outcome.image, crop_edit);
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(room.focus_state().unwrap().current_crop, crop_edit);
    assert_eq!(room.hero(), Some(&hero));
    let refine = client.requests_for(GenerationTask::Refine);
    assert_eq!(
        refine[0].image(prompts::CURRENT_IMAGE),
        Some(&focus.original_crop)
    );

    wf.exit_focus(room_id).await.unwrap();
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(room.mode, RoomMode::Normal);
    assert_eq!(room.hero(), Some(&hero));

    wf.enter_focus(room_id, 52.0, 51.0, Some("Armchair".into()))
        .await
        .unwrap();
    wf.refine_focus(room_id, "Make it leather", None).await.unwrap();
    let merged = wf.merge_focus(room_id).await.unwrap();
    assert!(merged.sync.is_none());

    let composite = StubClient::default_image(GenerationTask::CompositeCrop);
    assert_eq!(merged.image, composite);
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(room.mode, RoomMode::Normal);
    assert_eq!(room.hero(), Some(&composite));

    let requests = client.requests_for(GenerationTask::CompositeCrop);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].image(prompts::FULL_IMAGE), Some(&hero));
    assert_eq!(requests[0].image(prompts::EDITED_CROP), Some(&crop_edit));
}

#[tokio::test]
async fn test_unmodified_focus_merge_just_exits() {
    let client = StubClient::new();
    client.set_image(GenerationTask::Hero, solid_png(800, 800, 90));
    let (wf, ids) = designing_project(&client, &["Lounge"]).await;
    reviewing_room(&wf, &ids[0]).await;

    let focus = wf.enter_focus(&ids[0], 10.0, 90.0, None).await.unwrap();
    assert_eq!(focus.label, "Selected area");

    let outcome = wf.merge_focus(&ids[0]).await.unwrap();
    assert!(outcome.sync.is_none());
    assert!(client.requests_for(GenerationTask::CompositeCrop).is_empty());
    assert_eq!(wf.room(&ids[0]).await.unwrap().mode, RoomMode::Normal);
}

#[tokio::test]
async fn test_failed_composite_keeps_focus_mode() {
    let client = StubClient::new();
    client.set_image(GenerationTask::Hero, solid_png(640, 480, 30));
    client.fail(GenerationTask::CompositeCrop);
    let (wf, ids) = designing_project(&client, &["Lounge"]).await;
    reviewing_room(&wf, &ids[0]).await;

    wf.enter_focus(&ids[0], 50.0, 50.0, None).await.unwrap();
    wf.refine_focus(&ids[0], "Add a lamp", None).await.unwrap();
    assert!(wf.merge_focus(&ids[0]).await.unwrap_err().is_generation_failure());

    let room = wf.room(&ids[0]).await.unwrap();
    assert_eq!(room.status, RoomStatus::Reviewing);
    assert!(room.focus_state().is_some());
    assert!(!room.is_busy());
}

#[tokio::test]
async fn test_send_message_routes_by_room_state() {
    let client = StubClient::new();
    let (wf, ids) = designing_project(&client, &["Study"]).await;
    let room_id = &ids[0];
    let attachment = ImageHandle::png(b"moodboard".to_vec());

    assert!(wf.send_message(room_id, "hello", None).await.unwrap_err().is_rejection());

    wf.generate_sketch(room_id).await.unwrap();
    let outcome = wf
        .send_message(room_id, "Widen the doorway", Some(attachment.clone()))
        .await
        .unwrap();
    let room = wf.room(room_id).await.unwrap();
    assert_eq!(room.sketch_image, Some(outcome.image));
    assert_eq!(room.status, RoomStatus::ReviewingSketch);
    let last_user = room
        .chat_history
        .iter()
        .rev()
        .find(|m| m.attachment.is_some())
        .unwrap();
    assert_eq!(last_user.content, "Widen the doorway");

    let refine = client.requests_for(GenerationTask::Refine);
    assert_eq!(refine[0].image(prompts::EDIT_REFERENCE), Some(&attachment));

    wf.approve_sketch(room_id).await.unwrap();
    assert!(wf.send_message(room_id, "too early", None).await.unwrap_err().is_rejection());

    wf.generate_hero(room_id, None).await.unwrap();
    let outcome = wf.send_message(room_id, "Add plants", None).await.unwrap();
    assert_eq!(wf.room(room_id).await.unwrap().hero(), Some(&outcome.image));
}

#[tokio::test]
async fn test_compliance_audit_compares_against_floorplan() {
    let client = StubClient::new();
    client.set_text(
        GenerationTask::ComplianceAudit,
        r#"{"compliant":false,"summary":"Window moved","issues":[{"element":"Window","expected":"North wall","observed":"East wall"}]}"#,
    );
    let (wf, ids) = designing_project(&client, &["Study"]).await;
    reviewing_room(&wf, &ids[0]).await;

    let report = wf.run_compliance_audit(&ids[0]).await.unwrap();
    assert!(!report.compliant);
    assert_eq!(report.issues.len(), 1);

    let request = &client.requests_for(GenerationTask::ComplianceAudit)[0];
    assert_eq!(request.image(prompts::FLOORPLAN), Some(&floorplan()));
    let room = wf.room(&ids[0]).await.unwrap();
    assert_eq!(room.compliance_report, Some(report));
}

#[tokio::test]
async fn test_fan_out_is_repeatable() {
    let client = StubClient::new();
    let orchestrator = GenerationOrchestrator::new(client.clone());
    let mut room = Room::from_descriptor("room-1", RoomDescriptor::default());
    room.generated_views
        .insert(Perspective::Hero, ImageHandle::png(b"H".to_vec()));
    assert!(ApprovedView::hero(&room).is_err());
    room.is_hero_approved = true;
    let source = ApprovedView::hero(&room).unwrap();

    let first = orchestrator
        .generate_secondary_views(&floorplan(), &source, "Den", &Perspective::SECONDARY)
        .await;
    let second = orchestrator
        .generate_secondary_views(&floorplan(), &source, "Den", &Perspective::SECONDARY)
        .await;

    assert_eq!(first.views, second.views);
    assert!(first.failures.is_empty());
    assert_eq!(client.requests().len(), 6);
}
