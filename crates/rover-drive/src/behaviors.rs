//! Behaviors that chain drive actions through completion continuations.

use rover_core::{
    recover, ActionOutcome, Behavior, BehaviorStatus, CompletionEvent, Delegator, FailureReason,
    ObjectId, Recovery, RetryBudget, RobotId, TickContext,
};
use tracing::{debug, info};

use crate::actions::{DriveToObjectAction, PlayAnimationAction, SearchForObjectAction};
use crate::{DriveConfig, DriveWorldMut, InteractConfig, InteractionKind};

/// Gets the robot to an object, recovering from lost sightings by searching for it.
///
/// Transient motion failures retry the approach straight away while the retry budget lasts.
/// A failed verification escalates through the configured search stages. A stage that finds the
/// object leads to a fresh approach, and the next failed verification resumes at the following
/// stage, so each stage runs at most once per activation. Once the stages are used up the
/// object may be forgotten and the behavior fails.
pub struct InteractWithObjectBehavior {
    object: ObjectId,
    interaction: InteractionKind,
    approach_angle: Option<f32>,
    drive: DriveConfig,
    config: InteractConfig,
    budget: RetryBudget,
    search_stage: usize,
    attempts: u32,
    searches: u32,
    status: Option<BehaviorStatus>,
}

impl InteractWithObjectBehavior {
    pub fn new(object: ObjectId, interaction: InteractionKind) -> Self {
        Self::with_config(object, interaction, DriveConfig::default(), InteractConfig::default())
    }

    pub fn with_config(
        object: ObjectId,
        interaction: InteractionKind,
        drive: DriveConfig,
        config: InteractConfig,
    ) -> Self {
        Self {
            object,
            interaction,
            approach_angle: None,
            drive,
            budget: RetryBudget::new(config.max_transient_retries),
            config,
            search_stage: 0,
            attempts: 0,
            searches: 0,
            status: None,
        }
    }

    pub fn with_approach_angle(mut self, approach_angle: f32) -> Self {
        self.approach_angle = Some(approach_angle);
        self
    }

    /// Approaches started so far, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn searches(&self) -> u32 {
        self.searches
    }

    /// How the behavior ended, once it has.
    pub fn final_status(&self) -> Option<BehaviorStatus> {
        self.status
    }

    fn approach<W>(&mut self, delegator: &mut Delegator<W, Self>)
    where
        W: DriveWorldMut + 'static,
    {
        self.attempts += 1;
        let mut action = DriveToObjectAction::from_config(self.object, self.interaction, &self.drive);
        if let Some(angle) = self.approach_angle {
            action = action.with_approach_angle(angle);
        }
        delegator.delegate(action, Self::on_approach_done);
    }

    fn on_approach_done<W>(
        &mut self,
        event: &CompletionEvent,
        world: &mut W,
        delegator: &mut Delegator<W, Self>,
    ) where
        W: DriveWorldMut + 'static,
    {
        match recover(event.outcome, &mut self.budget) {
            Recovery::Proceed => {
                self.search_stage = 0;
                match &self.config.success_animation {
                    Some(animation) => delegator.delegate(
                        PlayAnimationAction::new(animation.clone()),
                        |_: &mut Self, _: &CompletionEvent, _: &mut W, delegator: &mut Delegator<W, Self>| {
                            delegator.complete()
                        },
                    ),
                    None => delegator.complete(),
                }
            }
            Recovery::RetryNow => {
                debug!(
                    object = %self.object,
                    outcome = %event.outcome,
                    remaining = self.budget.remaining(),
                    "Retrying approach"
                );
                self.approach(delegator);
            }
            Recovery::Search => self.search(world, delegator),
            Recovery::GiveUp(reason) => {
                info!(object = %self.object, %reason, "Giving up on object");
                delegator.fail(reason);
            }
            Recovery::Stop => delegator.interrupt(),
        }
    }

    /// Runs the current search stage, or gives up once every stage has been tried.
    fn search<W>(&mut self, world: &mut W, delegator: &mut Delegator<W, Self>)
    where
        W: DriveWorldMut + 'static,
    {
        let Some(&pattern) = self.config.search_stages.get(self.search_stage) else {
            if self.config.forget_object_when_search_fails {
                info!(object = %self.object, "Forgetting object after failed search");
                world.perception_mut().forget_object(self.object);
            }
            delegator.fail(FailureReason::VisualVerificationFailed);
            return;
        };
        self.searches += 1;
        info!(
            robot = delegator.robot().stable_id(),
            object = %self.object,
            stage = self.search_stage,
            ?pattern,
            "Searching for object"
        );
        let search = SearchForObjectAction::new(self.object, pattern, &self.drive.search)
            .with_profile(self.drive.motion_profile);
        delegator.delegate(search, Self::on_search_done);
    }

    fn on_search_done<W>(
        &mut self,
        event: &CompletionEvent,
        world: &mut W,
        delegator: &mut Delegator<W, Self>,
    ) where
        W: DriveWorldMut + 'static,
    {
        match event.outcome {
            ActionOutcome::Success => {
                self.search_stage += 1;
                self.budget.reset();
                self.approach(delegator);
            }
            ActionOutcome::Cancelled => delegator.interrupt(),
            ActionOutcome::Abort(reason) => delegator.fail(reason),
            ActionOutcome::Retry(_) => {
                self.search_stage += 1;
                self.search(world, delegator);
            }
        }
    }
}

impl<W> Behavior<W> for InteractWithObjectBehavior
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "InteractWithObject"
    }

    fn on_activated(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        delegator: &mut Delegator<W, Self>,
    ) {
        self.budget.reset();
        self.search_stage = 0;
        self.approach(delegator);
    }

    fn on_deactivated(&mut self, status: BehaviorStatus) {
        self.status = Some(status);
    }
}
