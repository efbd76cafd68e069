//! The per-avatar controller component.

use bevy::{
    asset::prelude::*, ecs::prelude::*, log::prelude::*, reflect::prelude::*,
    transform::components::Transform,
};

use crate::{
    action::{ActionArena, ActionId, ActionSpec, PlayableAction},
    clip::MotionClip,
    completion::{CommandTicket, TicketSender, ticket},
    config::LocomotionConfig,
    errors::{ControllerError, ControllerResult},
    gesture::{GestureOptions, GestureOverlay},
    library::{ActionLibrary, ActionSet, SlotStatus},
    locomotion::{Direction, EvalContext, LocomotionMachine, LocomotionState},
    tracking::{TargetTracker, TrackedPose},
};

/// A command for the avatar, applied at the next tick.
///
/// Directional commands preempt whatever directed movement is in flight and
/// switch the avatar out of autonomous mode until the next
/// [`AutoWalk`](AvatarCommand::AutoWalk).
#[derive(Clone, Debug)]
pub enum AvatarCommand {
    WalkLeft,
    WalkRight,
    WalkUp,
    WalkDown,
    TurnLeft,
    TurnRight,
    TurnUp,
    TurnDown,
    /// Follow the tracked viewer target autonomously.
    AutoWalk,
    /// Play a one-shot clip over the current action.
    PlayGesture(Handle<MotionClip>, GestureOptions),
}

impl AvatarCommand {
    fn walk_direction(&self) -> Option<Direction> {
        match self {
            AvatarCommand::WalkLeft => Some(Direction::Left),
            AvatarCommand::WalkRight => Some(Direction::Right),
            AvatarCommand::WalkUp => Some(Direction::Up),
            AvatarCommand::WalkDown => Some(Direction::Down),
            _ => None,
        }
    }

    fn turn_direction(&self) -> Option<Direction> {
        match self {
            AvatarCommand::TurnLeft => Some(Direction::Left),
            AvatarCommand::TurnRight => Some(Direction::Right),
            AvatarCommand::TurnUp => Some(Direction::Up),
            AvatarCommand::TurnDown => Some(Direction::Down),
            _ => None,
        }
    }

    /// Mode switches have no completion to await.
    fn wants_ticket(&self) -> bool {
        !matches!(self, AvatarCommand::AutoWalk)
    }
}

/// One action's contribution to the frame, for the rendering collaborator
/// to sample.
#[derive(Clone, Debug)]
pub struct ActionSample {
    pub clip: Handle<MotionClip>,
    pub weight: f32,
    pub time: f32,
}

/// Locomotion, blending and gesture control for one avatar entity.
///
/// The component owns every piece of mutable animation state for its avatar:
/// the action arena, the named library, the target tracker, the locomotion
/// state machine and the gesture overlay. The plugin resolves pending clip
/// loads in `PreUpdate` and ticks the controller once per frame in `Update`;
/// hosts interact through commands and queries between frames.
#[derive(Component, Default, Reflect)]
#[reflect(Component)]
pub struct AvatarController {
    pub config: LocomotionConfig,
    arena: ActionArena,
    #[reflect(ignore)]
    library: ActionLibrary,
    actions: ActionSet,
    machine: LocomotionMachine,
    tracker: TargetTracker,
    #[reflect(ignore)]
    gesture: GestureOverlay,
    current_action: Option<ActionId>,
    ready: bool,
    tracked_pose: Option<TrackedPose>,
    #[reflect(ignore)]
    pending_command: Option<(AvatarCommand, Option<TicketSender>)>,
}

impl AvatarController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    // --- registration -----------------------------------------------------

    /// Register a named action backed by a `.motion.ron` clip file. The load
    /// is asynchronous; the controller stays not-ready until every
    /// registered clip has loaded or failed.
    pub fn register_action(
        &mut self,
        name: impl Into<String>,
        path: impl Into<bevy::asset::AssetPath<'static>>,
        spec: ActionSpec,
        server: &AssetServer,
    ) {
        self.library.register(name, path, spec, server);
    }

    /// Register a named action for a clip handle the host already holds.
    pub fn register_action_handle(
        &mut self,
        name: impl Into<String>,
        handle: Handle<MotionClip>,
        spec: ActionSpec,
    ) {
        self.library.register_handle(name, handle, spec);
    }

    /// Bind loaded clips to actions and, once nothing is pending any more,
    /// mark the controller ready and start the autoplay action. Called by
    /// the plugin every `PreUpdate`; safe to call directly in tests.
    pub fn resolve(&mut self, clips: &Assets<MotionClip>) {
        let bound = self.library.resolve(clips, &mut self.arena);
        if bound > 0 || !self.ready {
            self.actions = ActionSet::from_library(&self.library);
        }
        if !self.ready && self.library.is_resolved() {
            self.ready = true;
            if let Some(name) = self.config.autoplay.clone()
                && let Err(err) = self.play_base(&name)
            {
                warn!("autoplay '{name}' skipped: {err}");
            }
        }
    }

    /// Mark pending loads that have failed on the asset server.
    pub(crate) fn mark_load_failures(&mut self, server: &AssetServer) {
        self.library.mark_failures(server);
    }

    // --- commands ---------------------------------------------------------

    /// Queue a command for the next tick. Returns a completion ticket for
    /// directed commands and gestures, `None` for `AutoWalk`. A command
    /// queued while another is still waiting replaces it, abandoning the
    /// replaced command's ticket.
    pub fn command(&mut self, command: AvatarCommand) -> Option<CommandTicket> {
        if command.wants_ticket() {
            Some(self.queue(command))
        } else {
            self.replace_pending(command, None);
            None
        }
    }

    fn queue(&mut self, command: AvatarCommand) -> CommandTicket {
        let (sender, command_ticket) = ticket();
        self.replace_pending(command, Some(sender));
        command_ticket
    }

    fn replace_pending(&mut self, command: AvatarCommand, sender: Option<TicketSender>) {
        if let Some((replaced, _sender)) = self.pending_command.take() {
            // The dropped sender marks the replaced ticket abandoned.
            debug!("replacing queued command {replaced:?}");
        }
        self.pending_command = Some((command, sender));
    }

    /// Walk one unit in `direction`. The ticket resolves on arrival.
    pub fn walk(&mut self, direction: Direction) -> CommandTicket {
        self.queue(match direction {
            Direction::Left => AvatarCommand::WalkLeft,
            Direction::Right => AvatarCommand::WalkRight,
            Direction::Up => AvatarCommand::WalkUp,
            Direction::Down => AvatarCommand::WalkDown,
        })
    }

    /// Turn in place toward `direction`. The ticket resolves when the turn
    /// completes.
    pub fn turn(&mut self, direction: Direction) -> CommandTicket {
        self.queue(match direction {
            Direction::Left => AvatarCommand::TurnLeft,
            Direction::Right => AvatarCommand::TurnRight,
            Direction::Up => AvatarCommand::TurnUp,
            Direction::Down => AvatarCommand::TurnDown,
        })
    }

    /// Follow the tracked viewer target autonomously from the next tick on.
    pub fn auto_walk(&mut self) {
        self.command(AvatarCommand::AutoWalk);
    }

    /// Play a one-shot gesture clip over the current action, returning its
    /// duration and a completion ticket without awaiting the end.
    pub fn play_gesture(
        &mut self,
        clips: &mut Assets<MotionClip>,
        clip: Handle<MotionClip>,
        options: GestureOptions,
    ) -> ControllerResult<(f32, CommandTicket)> {
        if !self.ready {
            return Err(ControllerError::NotReady);
        }
        let (sender, gesture_ticket) = ticket();
        let duration = self.gesture.play(
            &mut self.arena,
            clips,
            &self.config,
            self.current_action,
            clip,
            options,
            Some(sender),
        )?;
        Ok((duration, gesture_ticket))
    }

    /// Hard-switch playback to the named action: every other action stops,
    /// the named one plays from the start at full weight, and the state
    /// machine returns to `Idle`. Used at startup (autoplay) and whenever
    /// the host wants a clean slate.
    pub fn play_base(&mut self, name: &str) -> ControllerResult<()> {
        if !self.ready {
            return Err(ControllerError::NotReady);
        }
        let id = self
            .library
            .get(name)
            .ok_or_else(|| ControllerError::MissingAction(name.to_owned()))?;
        self.gesture.cancel();
        self.arena.stop_all();
        if let Some(action) = self.arena.get_mut(id) {
            action.play_from_start();
        }
        self.current_action = Some(id);
        self.machine.state = LocomotionState::Idle;
        Ok(())
    }

    /// Supply this frame's viewer pose sample. Consumed by the next tick;
    /// when no sample arrives the previous target persists.
    pub fn set_tracked_pose(&mut self, pose: TrackedPose) {
        self.tracked_pose = Some(pose);
    }

    // --- tick -------------------------------------------------------------

    /// Advance the controller by `delta` seconds: mixer step, queued
    /// command, target refresh, locomotion evaluation, gesture resolution.
    /// Does nothing until the library has resolved. Never panics and never
    /// errors; a missing action degrades to motion without animation.
    pub fn tick(&mut self, delta: f32, transform: &mut Transform, clips: &mut Assets<MotionClip>) {
        if !self.ready {
            return;
        }
        self.arena.advance_all(delta);

        if let Some((command, sender)) = self.pending_command.take() {
            self.apply_command(command, sender, transform, clips);
        }

        self.tracker
            .update(self.tracked_pose.take(), self.config.viewer_offset);

        let mut ctx = EvalContext {
            arena: &mut self.arena,
            actions: &self.actions,
            current_action: &mut self.current_action,
            config: &self.config,
            blends_suppressed: self.gesture.is_active(),
        };
        self.machine
            .evaluate(delta, transform, &mut self.tracker, &mut ctx);

        self.gesture.resolve_finished(&mut self.arena, &self.config);
    }

    fn apply_command(
        &mut self,
        command: AvatarCommand,
        sender: Option<TicketSender>,
        transform: &Transform,
        clips: &mut Assets<MotionClip>,
    ) {
        if let AvatarCommand::AutoWalk = command {
            self.machine.enter_autonomous(&mut self.tracker);
            return;
        }
        if let AvatarCommand::PlayGesture(clip, options) = command {
            // An error drops the sender, which abandons the caller's ticket.
            if let Err(err) = self.gesture.play(
                &mut self.arena,
                clips,
                &self.config,
                self.current_action,
                clip,
                options,
                sender,
            ) {
                warn!("queued gesture rejected: {err}");
            }
            return;
        }

        let mut ctx = EvalContext {
            arena: &mut self.arena,
            actions: &self.actions,
            current_action: &mut self.current_action,
            config: &self.config,
            blends_suppressed: self.gesture.is_active(),
        };
        if let Some(direction) = command.walk_direction() {
            self.machine.begin_walk(
                direction,
                transform.translation,
                &mut self.tracker,
                sender,
                &mut ctx,
            );
        } else if let Some(direction) = command.turn_direction() {
            self.machine.begin_turn(
                direction,
                transform.rotation,
                &mut self.tracker,
                sender,
                &mut ctx,
            );
        }
    }

    // --- queries ----------------------------------------------------------

    /// True once every registered clip has loaded or failed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> LocomotionState {
        self.machine.state
    }

    pub fn is_autonomous(&self) -> bool {
        self.machine.autonomous
    }

    /// The action the locomotion machine considers current, if any.
    pub fn current_action(&self) -> Option<&PlayableAction> {
        self.current_action.and_then(|id| self.arena.get(id))
    }

    pub fn current_action_id(&self) -> Option<ActionId> {
        self.current_action
    }

    /// Load status of a registered action name.
    pub fn action_status(&self, name: &str) -> Option<SlotStatus> {
        self.library.status(name)
    }

    /// Every action carrying weight this frame, for pose sampling.
    pub fn playing_samples(&self) -> Vec<ActionSample> {
        self.arena
            .iter()
            .filter(|(_, action)| action.weight > 0.0)
            .map(|(_, action)| ActionSample {
                clip: action.clip.clone(),
                weight: action.weight,
                time: action.time,
            })
            .collect()
    }
}
