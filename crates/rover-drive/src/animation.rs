use crate::AnimationError;

/// Handle for one started animation or sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u32);

/// Animation and sound playback.
///
/// Assets load in the background, so `start` may report an animation as not loaded yet.
pub trait AnimationPlayer {
    fn start(&mut self, name: &str) -> Result<AnimationHandle, AnimationError>;

    fn is_playing(&self, handle: AnimationHandle) -> bool;

    fn stop(&mut self, handle: AnimationHandle);
}
