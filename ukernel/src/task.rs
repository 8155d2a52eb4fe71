/// A task body: a plain function pointer over the caller-owned context.
pub type TaskFn<C> = fn(&mut C);

/// Handle to a registered task, returned by [Kernel::add_task](crate::Kernel::add_task).
///
/// The handle stays valid until the task is removed or the kernel is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub(crate) usize);

/// Scheduling state of a task.
///
/// The two `*Immediate` values combine a base state with the immediate-start modifier: the
/// first dispatch happens on the next poll instead of waiting out one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Not dispatched until resumed.
    Paused,
    /// Dispatched every interval.
    Scheduled,
    /// Dispatched exactly once, one interval from registration, then parked as
    /// [Paused](TaskStatus::Paused).
    OneTime,
    /// Dispatched every interval, starting with the next poll.
    ScheduledImmediate,
    /// Dispatched exactly once, on the next poll, then parked as [Paused](TaskStatus::Paused).
    OneTimeImmediate,
}

impl TaskStatus {
    /// Whether this state is dispatched at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, TaskStatus::Paused)
    }

    /// Whether the first dispatch skips the initial interval wait.
    pub(crate) fn immediate_start(&self) -> bool {
        matches!(
            self,
            TaskStatus::ScheduledImmediate | TaskStatus::OneTimeImmediate
        )
    }

    /// Whether the task parks itself after a single dispatch.
    pub(crate) fn one_shot(&self) -> bool {
        matches!(self, TaskStatus::OneTime | TaskStatus::OneTimeImmediate)
    }
}

/// One ring node: the callback plus its scheduling fields and the link to the next node.
#[derive(Debug)]
pub(crate) struct Slot<C> {
    pub(crate) body: TaskFn<C>,
    pub(crate) interval_ms: u32,
    pub(crate) next_fire: u32,
    pub(crate) status: TaskStatus,
    pub(crate) next: usize,
}
