//! Style Propagation Manager.
//!
//! The project keeps one master style image. It is locked from the first
//! approved hero and handed to every later hero request ahead of any
//! room-local or global style reference. Sync targets are derived here too:
//! after a post-approval edit, every other perspective is regenerated.

use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{Perspective, ProjectState, Room};

/// Style images resolved for one hero request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleInputs {
    /// Project master style; highest priority when present.
    pub master: Option<ImageHandle>,
    /// Room-local reference if any, otherwise the project's global style.
    pub reference: Option<ImageHandle>,
}

/// Resolves the style inputs for `room`'s hero generation.
pub fn resolve_style_inputs(project: &ProjectState, room: &Room) -> StyleInputs {
    StyleInputs {
        master: project.master_style.get().cloned(),
        reference: room
            .style_reference
            .clone()
            .or_else(|| project.global_style.clone()),
    }
}

/// Locks `hero` as the master style if none is set yet.
///
/// Called only at the hero-approval transition. The stored handle is an
/// independent copy, so later edits to the room's hero never reach it.
pub fn lock_on_approval(project: &mut ProjectState, room_id: &str, hero: &ImageHandle) -> bool {
    let locked = project.master_style.lock(hero);
    if locked {
        tracing::info!(
            "[StylePropagation] Master style locked from room {}",
            room_id
        );
    } else {
        tracing::debug!(
            "[StylePropagation] Master style already locked; room {} reuses it",
            room_id
        );
    }
    locked
}

/// Perspectives a sync regenerates after `edited` changed.
pub fn sync_targets(edited: Perspective) -> Vec<Perspective> {
    edited.others()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcraft_core::analysis::RoomDescriptor;

    fn project_with_room() -> ProjectState {
        let mut project = ProjectState::new("p");
        project
            .rooms
            .push(Room::from_descriptor("r0", RoomDescriptor::default()));
        project
    }

    #[test]
    fn test_local_reference_beats_global_style() {
        let mut project = project_with_room();
        let global = ImageHandle::png(vec![9u8]);
        let local = ImageHandle::png(vec![8u8]);
        project.global_style = Some(global.clone());

        let inputs = resolve_style_inputs(&project, &project.rooms[0]);
        assert_eq!(inputs.reference, Some(global));

        project.rooms[0].style_reference = Some(local.clone());
        let inputs = resolve_style_inputs(&project, &project.rooms[0]);
        assert_eq!(inputs.reference, Some(local));
        assert_eq!(inputs.master, None);
    }

    #[test]
    fn test_master_is_copy_and_set_once() {
        let mut project = project_with_room();
        let h1 = ImageHandle::png(vec![1u8]);
        let h2 = ImageHandle::png(vec![2u8]);

        assert!(lock_on_approval(&mut project, "r0", &h1));
        project.rooms[0]
            .generated_views
            .insert(Perspective::Hero, h2.clone());
        assert!(!lock_on_approval(&mut project, "r1", &h2));

        let inputs = resolve_style_inputs(&project, &project.rooms[0]);
        assert_eq!(inputs.master, Some(h1));
    }

    #[test]
    fn test_sync_targets_exclude_edited() {
        assert_eq!(
            sync_targets(Perspective::Hero),
            vec![Perspective::Wide, Perspective::Overhead, Perspective::Detail]
        );
        let targets = sync_targets(Perspective::Overhead);
        assert!(targets.contains(&Perspective::Hero));
        assert!(!targets.contains(&Perspective::Overhead));
        assert_eq!(targets.len(), 3);
    }
}
