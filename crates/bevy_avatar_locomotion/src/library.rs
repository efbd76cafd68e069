use bevy::{
    asset::{AssetPath, AssetServer, Assets, Handle, LoadState},
    log::{debug, warn},
    reflect::prelude::*,
};
use indexmap::IndexMap;

use crate::{
    action::{ActionArena, ActionId, ActionSpec, PlayableAction},
    clip::MotionClip,
    locomotion::Direction,
};

/// Semantic action names the locomotion controller looks up.
pub mod names {
    pub const IDLE: &str = "idle";
    pub const WALK: &str = "walk";
    pub const TURN_LEFT: &str = "turn_left";
    pub const TURN_RIGHT: &str = "turn_right";
    pub const TURN_UP: &str = "turn_up";
    pub const TURN_DOWN: &str = "turn_down";
}

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotStatus {
    /// The clip asset has not arrived yet.
    Pending,
    /// Bound to a playable action.
    Ready,
    /// The clip failed to load; the name stays unbound.
    Failed,
}

#[derive(Clone, Debug)]
struct ActionSlot {
    handle: Handle<MotionClip>,
    spec: ActionSpec,
    status: SlotStatus,
    action: Option<ActionId>,
}

/// Named registry of playable clips for one avatar.
///
/// Registration is asynchronous: `register` records a pending slot and the
/// resolve step binds it once the clip asset arrives. A clip that fails to
/// load leaves its name unbound; callers of [`get`](Self::get) handle `None`
/// and motion continues without that animation.
#[derive(Clone, Debug, Default)]
pub struct ActionLibrary {
    slots: IndexMap<String, ActionSlot>,
}

impl ActionLibrary {
    /// Kick off an asset load and register the name for it. Completion order
    /// across names is not guaranteed; each action is visible to `get` in
    /// the same frame its clip finishes loading.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        path: impl Into<AssetPath<'static>>,
        spec: ActionSpec,
        server: &AssetServer,
    ) {
        let handle = server.load::<MotionClip>(path);
        self.register_handle(name, handle, spec);
    }

    /// Register a name for a clip that is already in (or headed into)
    /// `Assets<MotionClip>`, e.g. one built in code.
    pub fn register_handle(
        &mut self,
        name: impl Into<String>,
        handle: Handle<MotionClip>,
        spec: ActionSpec,
    ) {
        self.slots.insert(
            name.into(),
            ActionSlot {
                handle,
                spec,
                status: SlotStatus::Pending,
                action: None,
            },
        );
    }

    /// Id of the ready action registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ActionId> {
        self.slots
            .get(name)
            .filter(|slot| slot.status == SlotStatus::Ready)
            .and_then(|slot| slot.action)
    }

    pub fn status(&self, name: &str) -> Option<SlotStatus> {
        self.slots.get(name).map(|slot| slot.status)
    }

    /// True once no slot is pending. Failed slots count as resolved: a bad
    /// clip must not stall the avatar.
    pub fn is_resolved(&self) -> bool {
        self.slots
            .values()
            .all(|slot| slot.status != SlotStatus::Pending)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bind every pending slot whose clip has arrived, creating its playable
    /// action in `arena`. Returns how many were bound this call.
    pub(crate) fn resolve(&mut self, clips: &Assets<MotionClip>, arena: &mut ActionArena) -> usize {
        let mut bound = 0;
        for (name, slot) in self.slots.iter_mut() {
            if slot.status != SlotStatus::Pending {
                continue;
            }
            let Some(clip) = clips.get(&slot.handle) else {
                continue;
            };
            let action = PlayableAction::new(slot.handle.clone(), clip.duration(), slot.spec);
            slot.action = Some(arena.insert(action));
            slot.status = SlotStatus::Ready;
            bound += 1;
            debug!("bound action '{name}'");
        }
        bound
    }

    /// Mark pending slots whose load has failed. Logged and tolerated: the
    /// name stays unbound.
    pub(crate) fn mark_failures(&mut self, server: &AssetServer) {
        for (name, slot) in self.slots.iter_mut() {
            if slot.status == SlotStatus::Pending
                && let Some(LoadState::Failed(err)) = server.get_load_state(slot.handle.id())
            {
                warn!("failed to load action clip '{name}': {err}");
                slot.status = SlotStatus::Failed;
            }
        }
    }
}

/// Resolved ids for the semantic action names. Built once when the library
/// finishes resolving; the mapping never changes afterwards, only the
/// actions' playback state does.
#[derive(Reflect, Clone, Copy, Debug, Default)]
pub struct ActionSet {
    pub idle: Option<ActionId>,
    pub walk: Option<ActionId>,
    pub turn_left: Option<ActionId>,
    pub turn_right: Option<ActionId>,
    pub turn_up: Option<ActionId>,
    pub turn_down: Option<ActionId>,
}

impl ActionSet {
    pub fn from_library(library: &ActionLibrary) -> Self {
        Self {
            idle: library.get(names::IDLE),
            walk: library.get(names::WALK),
            turn_left: library.get(names::TURN_LEFT),
            turn_right: library.get(names::TURN_RIGHT),
            turn_up: library.get(names::TURN_UP),
            turn_down: library.get(names::TURN_DOWN),
        }
    }

    pub fn turn(&self, direction: Direction) -> Option<ActionId> {
        match direction {
            Direction::Left => self.turn_left,
            Direction::Right => self.turn_right,
            Direction::Up => self.turn_up,
            Direction::Down => self.turn_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_assets() -> Assets<MotionClip> {
        Assets::default()
    }

    #[test]
    fn resolve_binds_loaded_clips() {
        let mut clips = clip_assets();
        let mut arena = ActionArena::default();
        let mut library = ActionLibrary::default();

        let mut clip = MotionClip::default();
        clip.set_duration(2.5);
        let handle = clips.add(clip);
        library.register_handle(names::IDLE, handle, ActionSpec::default());

        assert_eq!(library.get(names::IDLE), None);
        assert!(!library.is_resolved());

        let bound = library.resolve(&clips, &mut arena);
        assert_eq!(bound, 1);
        assert!(library.is_resolved());
        assert_eq!(library.status(names::IDLE), Some(SlotStatus::Ready));

        let id = library.get(names::IDLE).unwrap();
        assert_eq!(arena.get(id).unwrap().duration, 2.5);
        // Resolving again is a no-op.
        assert_eq!(library.resolve(&clips, &mut arena), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn missing_asset_stays_pending() {
        let clips = clip_assets();
        let mut arena = ActionArena::default();
        let mut library = ActionLibrary::default();
        library.register_handle(names::WALK, Handle::default(), ActionSpec::default());

        assert_eq!(library.resolve(&clips, &mut arena), 0);
        assert!(!library.is_resolved());
        assert_eq!(library.status(names::WALK), Some(SlotStatus::Pending));
    }

    #[test]
    fn failed_slots_resolve_to_nothing() {
        let mut library = ActionLibrary::default();
        library.register_handle(names::WALK, Handle::default(), ActionSpec::default());
        library.slots.get_mut(names::WALK).unwrap().status = SlotStatus::Failed;

        assert!(library.is_resolved());
        assert_eq!(library.get(names::WALK), None);
        assert_eq!(library.status(names::WALK), Some(SlotStatus::Failed));
    }

    #[test]
    fn action_set_maps_semantic_names() {
        let mut clips = clip_assets();
        let mut arena = ActionArena::default();
        let mut library = ActionLibrary::default();
        for name in [names::IDLE, names::WALK, names::TURN_LEFT] {
            let handle = clips.add(MotionClip::default());
            library.register_handle(name, handle, ActionSpec::default());
        }
        library.resolve(&clips, &mut arena);

        let set = ActionSet::from_library(&library);
        assert!(set.idle.is_some());
        assert!(set.walk.is_some());
        assert_eq!(set.turn(Direction::Left), set.turn_left);
        assert_eq!(set.turn(Direction::Right), None);
    }
}
