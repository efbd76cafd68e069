use std::f32::consts::{FRAC_PI_2, PI};

use bevy::{
    log::debug, math::prelude::*, reflect::prelude::*, transform::components::Transform,
};

use crate::{
    action::{ActionArena, ActionId},
    blending::request_blend,
    completion::TicketSender,
    config::LocomotionConfig,
    library::ActionSet,
    tracking::{OneShot, TargetState, TargetTracker},
};

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// World axis a directed walk moves along. The avatar's rest forward is
    /// -Z, so "up" walks toward the default viewer position.
    pub fn walk_axis(self) -> Vec3 {
        match self {
            Direction::Up => Vec3::Z,
            Direction::Down => Vec3::NEG_Z,
            Direction::Left => Vec3::X,
            Direction::Right => Vec3::NEG_X,
        }
    }

    /// Yaw change a directed turn asks for, in radians. Positive is
    /// counter-clockwise seen from above.
    pub fn yaw_offset(self) -> f32 {
        match self {
            Direction::Left => FRAC_PI_2,
            Direction::Right => -FRAC_PI_2,
            Direction::Up => PI,
            Direction::Down => -PI,
        }
    }
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocomotionState {
    #[default]
    Idle,
    Walking,
    Turning(Direction),
    DirectedWalk(Direction),
}

/// Rotate `current` toward `target` by at most `max_angle` radians, snapping
/// once the remaining angle fits in the step.
pub fn rotate_towards(current: Quat, target: Quat, max_angle: f32) -> Quat {
    let angle = current.angle_between(target);
    if angle <= max_angle || angle <= 1e-6 {
        target
    } else {
        current.slerp(target, max_angle / angle)
    }
}

/// Yaw (radians, around +Y) that points a -Z-forward avatar along the
/// horizontal components of `direction`.
pub fn yaw_toward(direction: Vec3) -> f32 {
    f32::atan2(-direction.x, -direction.z)
}

/// Yaw of an orientation's forward vector.
pub fn yaw_of(rotation: Quat) -> f32 {
    yaw_toward(rotation * Vec3::NEG_Z)
}

/// Orientation facing along `direction`: horizontal yaw combined with a
/// pitch derived from the vertical component.
pub fn facing(direction: Vec3) -> Quat {
    let horizontal = Vec3::new(direction.x, 0.0, direction.z).length();
    let pitch = f32::atan2(direction.y, horizontal);
    Quat::from_rotation_y(yaw_toward(direction)) * Quat::from_rotation_x(pitch)
}

/// Mutable controller state one evaluation runs against.
pub(crate) struct EvalContext<'a> {
    pub arena: &'a mut ActionArena,
    pub actions: &'a ActionSet,
    pub current_action: &'a mut Option<ActionId>,
    pub config: &'a LocomotionConfig,
    /// True while a gesture overlay owns the blend.
    pub blends_suppressed: bool,
}

impl EvalContext<'_> {
    fn blend(&mut self, to: Option<ActionId>) {
        request_blend(
            self.arena,
            self.current_action,
            to,
            self.config.locomotion_fade,
            self.blends_suppressed,
        );
    }
}

/// The central locomotion state machine.
///
/// Holds the state label, the autonomy flag and the in-flight directed
/// command's completion sender. Runs for the avatar's lifetime; there is no
/// terminal state.
#[derive(Reflect, Debug, Default)]
pub struct LocomotionMachine {
    pub state: LocomotionState,
    /// Whether the avatar follows the tracked target on its own.
    pub autonomous: bool,
    #[reflect(ignore)]
    pending: Option<TicketSender>,
}

impl LocomotionMachine {
    /// Start a directed walk one unit along the requested axis from
    /// `origin`. Replaces any in-flight command, abandoning its ticket.
    pub(crate) fn begin_walk(
        &mut self,
        direction: Direction,
        origin: Vec3,
        tracker: &mut TargetTracker,
        sender: Option<TicketSender>,
        ctx: &mut EvalContext,
    ) {
        self.preempt();
        self.autonomous = false;
        self.transition(LocomotionState::DirectedWalk(direction));
        tracker.set_one_shot(OneShot::Position(origin + direction.walk_axis()));
        self.pending = sender;
        ctx.blend(ctx.actions.walk);
    }

    /// Start a directed turn relative to the avatar's current yaw. Replaces
    /// any in-flight command, abandoning its ticket.
    pub(crate) fn begin_turn(
        &mut self,
        direction: Direction,
        rotation: Quat,
        tracker: &mut TargetTracker,
        sender: Option<TicketSender>,
        ctx: &mut EvalContext,
    ) {
        self.preempt();
        self.autonomous = false;
        self.transition(LocomotionState::Turning(direction));
        let target_yaw = yaw_of(rotation) + direction.yaw_offset();
        tracker.set_one_shot(OneShot::Orientation(Quat::from_rotation_y(target_yaw)));
        self.pending = sender;
        ctx.blend(ctx.actions.turn(direction));
    }

    /// Switch to autonomous target following, dropping any directed goal.
    pub(crate) fn enter_autonomous(&mut self, tracker: &mut TargetTracker) {
        self.preempt();
        tracker.clear_one_shot();
        self.autonomous = true;
    }

    fn preempt(&mut self) {
        // Dropping the sender marks the old ticket abandoned.
        self.pending = None;
    }

    fn transition(&mut self, next: LocomotionState) {
        if self.state != next {
            debug!("locomotion state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// One tick of locomotion: directed stepping when a one-shot goal is
    /// set, hysteresis-driven target following while autonomous, nothing
    /// otherwise.
    pub(crate) fn evaluate(
        &mut self,
        delta: f32,
        transform: &mut Transform,
        tracker: &mut TargetTracker,
        ctx: &mut EvalContext,
    ) {
        match tracker.one_shot() {
            Some(goal) => self.step_directed(goal, delta, transform, tracker, ctx),
            None => {
                if matches!(
                    self.state,
                    LocomotionState::Turning(_) | LocomotionState::DirectedWalk(_)
                ) {
                    // A directed state cannot outlive its goal.
                    self.transition(LocomotionState::Idle);
                }
                if self.autonomous {
                    let target = tracker
                        .target_state(ctx.config.distance_threshold, ctx.config.hysteresis_buffer);
                    self.step_autonomous(target, delta, transform, ctx);
                }
            }
        }
    }

    fn step_directed(
        &mut self,
        goal: OneShot,
        delta: f32,
        transform: &mut Transform,
        tracker: &mut TargetTracker,
        ctx: &mut EvalContext,
    ) {
        let arrived = match goal {
            OneShot::Orientation(target) => {
                transform.rotation =
                    rotate_towards(transform.rotation, target, ctx.config.angular_rate * delta);
                transform.rotation.angle_between(target) <= ctx.config.turn_epsilon
            }
            OneShot::Position(target) => {
                let to_target = target - transform.translation;
                let distance = to_target.length();
                if distance < ctx.config.arrival_epsilon {
                    true
                } else {
                    let direction = to_target / distance;
                    let heading = Quat::from_rotation_y(yaw_toward(direction));
                    transform.rotation =
                        rotate_towards(transform.rotation, heading, ctx.config.angular_rate * delta);
                    let step = (ctx.config.movement_speed * delta).min(distance);
                    transform.translation += direction * step;
                    distance - step < ctx.config.arrival_epsilon
                }
            }
        };

        if arrived {
            if let OneShot::Orientation(target) = goal {
                transform.rotation = target;
            }
            tracker.clear_one_shot();
            self.transition(LocomotionState::Idle);
            ctx.blend(ctx.actions.idle);
            if let Some(sender) = self.pending.take() {
                sender.finish();
            }
        }
    }

    fn step_autonomous(
        &mut self,
        target: TargetState,
        delta: f32,
        transform: &mut Transform,
        ctx: &mut EvalContext,
    ) {
        let Some(target_position) = target.position else {
            return;
        };
        let to_target = target_position - transform.translation;
        let distance = to_target.length();

        if distance > target.distance_threshold + target.hysteresis_buffer {
            self.transition(LocomotionState::Walking);
            ctx.blend(ctx.actions.walk);
            self.walk_step(to_target, distance, delta, transform, ctx);
        } else if distance <= target.distance_threshold {
            self.transition(LocomotionState::Idle);
            ctx.blend(ctx.actions.idle);
            self.face_viewer(target.viewer_position, delta, transform, ctx);
        } else {
            // Dead zone: no transition, the held state keeps its behavior.
            match self.state {
                LocomotionState::Walking => {
                    self.walk_step(to_target, distance, delta, transform, ctx)
                }
                _ => self.face_viewer(target.viewer_position, delta, transform, ctx),
            }
        }
    }

    fn walk_step(
        &self,
        to_target: Vec3,
        distance: f32,
        delta: f32,
        transform: &mut Transform,
        ctx: &EvalContext,
    ) {
        if distance <= f32::EPSILON {
            return;
        }
        let direction = to_target / distance;
        transform.rotation = rotate_towards(
            transform.rotation,
            facing(direction),
            ctx.config.angular_rate * delta,
        );
        let step = (ctx.config.movement_speed * delta).min(distance);
        transform.translation += direction * step;
    }

    /// Idle orientation: yaw toward the viewer, no pitch.
    fn face_viewer(
        &self,
        viewer: Option<Vec3>,
        delta: f32,
        transform: &mut Transform,
        ctx: &EvalContext,
    ) {
        let Some(viewer) = viewer else {
            return;
        };
        let to_viewer = viewer - transform.translation;
        if Vec3::new(to_viewer.x, 0.0, to_viewer.z).length_squared() <= f32::EPSILON {
            return;
        }
        let target = Quat::from_rotation_y(yaw_toward(to_viewer));
        transform.rotation = rotate_towards(transform.rotation, target, ctx.config.angular_rate * delta);
    }
}
