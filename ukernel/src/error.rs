/// Kernel API misuse errors.
///
/// These cover caller mistakes only; the kernel itself has no internal failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The task table is full.
    Capacity,
    /// The handle does not refer to a registered task.
    UnknownTask,
    /// The operation needs at least one registered task and the ring is empty.
    Empty,
}
