#![no_std]
#![deny(missing_docs)]
//! # ukernel
//! A no-std cooperative task scheduler.
//!
//! [Kernel] maintains a fixed-capacity ring of task descriptors and dispatches each due
//! task's callback from a single thread of control. There is no preemption and no priority:
//! the ring is walked round-robin, one check-and-maybe-fire step per [poll](Kernel::poll),
//! and every callback runs to completion before the kernel moves on.
//!
//! Time comes from a caller-supplied [Monotonic] millisecond counter. The counter is free
//! running and allowed to wrap; due tests use wraparound-safe signed-difference comparison,
//! so a task scheduled across the `u32` boundary still fires within one interval.
//!
//! Tasks are plain function pointers over a caller-owned context type, so the kernel works
//! without an allocator.

mod clock;
mod error;
mod kernel;
mod task;

pub use clock::Monotonic;
pub use error::KernelError;
pub use kernel::Kernel;
pub use task::{TaskFn, TaskId, TaskStatus};

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Upper bound on the number of tasks a kernel instance can hold, regardless of its
/// declared capacity.
pub const MAX_TASKS: usize = 255;

/// Longest accepted repeat interval, in milliseconds.
pub const MAX_TASK_INTERVAL_MS: u32 = 60_000;

/// Interval applied when a task is registered with an out-of-range interval.
pub const DEFAULT_TASK_INTERVAL_MS: u32 = 50;
