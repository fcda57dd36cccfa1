use rover_core::{
    Action, ActionEnv, ActionKind, ActionStatus, CompletionPayload, TickContext, TrackMask,
};
use tracing::{debug, warn};

use crate::{AnimationHandle, DriveWorldMut};

/// Plays one animation or sound to the end.
///
/// An animation that has not finished loading is reported as a retryable failure.
#[derive(Debug, Clone)]
pub struct PlayAnimationAction {
    animation: String,
    tracks: TrackMask,
    handle: Option<AnimationHandle>,
}

impl PlayAnimationAction {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            tracks: TrackMask::HEAD | TrackMask::LIFT | TrackMask::BODY | TrackMask::FACE,
            handle: None,
        }
    }

    /// A sound locks nothing, so it can run beside any motion.
    pub fn sound(animation: impl Into<String>) -> Self {
        Self::new(animation).with_tracks(TrackMask::NONE)
    }

    pub fn with_tracks(mut self, tracks: TrackMask) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn animation(&self) -> &str {
        &self.animation
    }
}

impl<W> Action<W> for PlayAnimationAction
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "PlayAnimation"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::PlayAnimation
    }

    fn tracks_to_lock(&self) -> TrackMask {
        self.tracks
    }

    fn init(
        &mut self,
        _ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        match world.animations_mut(robot).start(&self.animation) {
            Ok(handle) => {
                debug!(animation = %self.animation, "Playing animation");
                self.handle = Some(handle);
                ActionStatus::Success
            }
            Err(err) => {
                warn!(error = %err, "Animation unavailable");
                ActionStatus::Retry(err.reason())
            }
        }
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        match self.handle {
            Some(handle) if world.animations(robot).is_playing(handle) => ActionStatus::Running,
            _ => ActionStatus::Success,
        }
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) {
        if let Some(handle) = self.handle.take() {
            let player = world.animations_mut(robot);
            if player.is_playing(handle) {
                player.stop(handle);
            }
        }
    }

    fn completion_payload(&self) -> CompletionPayload {
        CompletionPayload::Animation {
            name: self.animation.clone(),
        }
    }
}
