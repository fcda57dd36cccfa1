use rover_core::{Action, ActionEnv, ActionKind, ActionStatus, TickContext, WorldMut};

/// Succeeds once the given time has passed.
#[derive(Debug, Clone)]
pub struct WaitAction {
    seconds: f64,
    deadline: f64,
}

impl WaitAction {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            deadline: 0.0,
        }
    }
}

impl<W> Action<W> for WaitAction
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        "Wait"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Wait
    }

    fn init(
        &mut self,
        ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        self.deadline = ctx.now_seconds + self.seconds;
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        if ctx.now_seconds >= self.deadline {
            ActionStatus::Success
        } else {
            ActionStatus::Running
        }
    }
}

type Predicate<W> = Box<dyn FnMut(&TickContext, <W as rover_core::WorldView>::Robot, &mut W) -> bool>;

/// Runs a predicate every tick and succeeds the first time it returns `true`.
pub struct CallbackAction<W>
where
    W: WorldMut + 'static,
{
    name: String,
    predicate: Predicate<W>,
}

impl<W> CallbackAction<W>
where
    W: WorldMut + 'static,
{
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: FnMut(&TickContext, W::Robot, &mut W) -> bool + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl<W> Action<W> for CallbackAction<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Callback
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        if (self.predicate)(ctx, robot, world) {
            ActionStatus::Success
        } else {
            ActionStatus::Running
        }
    }
}
