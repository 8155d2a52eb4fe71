//! Kernel dispatch tests against a simulated millisecond clock.

use core::cell::Cell;

use ukernel::{DEFAULT_TASK_INTERVAL_MS, Kernel, KernelError, Monotonic, TaskStatus};

struct SimClock(Cell<u32>);

impl SimClock {
    fn new(start: u32) -> Self {
        Self(Cell::new(start))
    }

    fn set(&self, t: u32) {
        self.0.set(t);
    }

    fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Monotonic for &SimClock {
    fn now_ms(&mut self) -> u32 {
        self.0.get()
    }
}

/// Context shared by all test tasks: the clock (to timestamp fires) and per-task fire logs.
struct Ctx<'a> {
    clock: &'a SimClock,
    fires: [Vec<u32>; 3],
}

impl<'a> Ctx<'a> {
    fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            fires: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

fn log0(ctx: &mut Ctx) {
    let t = ctx.clock.get();
    ctx.fires[0].push(t);
}

fn log1(ctx: &mut Ctx) {
    let t = ctx.clock.get();
    ctx.fires[1].push(t);
}

fn log2(ctx: &mut Ctx) {
    let t = ctx.clock.get();
    ctx.fires[2].push(t);
}

/// Advance the clock one tick at a time, giving every ring node a check per tick.
fn run_ticks<'a, const N: usize>(
    kernel: &mut Kernel<Ctx<'a>, &SimClock, N>,
    clock: &SimClock,
    ctx: &mut Ctx<'a>,
    ticks: u32,
) {
    for _ in 0..ticks {
        clock.set(clock.get().wrapping_add(1));
        for _ in 0..kernel.task_count().max(1) {
            kernel.poll(ctx);
        }
    }
}

#[test]
fn scheduled_task_fires_on_every_interval_and_never_early() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel.add_task(log0, 100, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 1000);
    let expected: Vec<u32> = (1..=10).map(|k| k * 100).collect();
    assert_eq!(ctx.fires[0], expected);
}

#[test]
fn immediate_start_skips_the_first_interval() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel
        .add_task(log0, 100, TaskStatus::ScheduledImmediate)
        .unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 250);
    assert_eq!(ctx.fires[0], vec![1, 101, 201]);
}

#[test]
fn one_time_immediate_fires_exactly_once_until_resumed() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let task = kernel
        .add_task(log0, 100, TaskStatus::OneTimeImmediate)
        .unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 500);
    assert_eq!(ctx.fires[0], vec![1]);
    assert_eq!(kernel.task_status(task), Ok(TaskStatus::Paused));
    kernel.resume_task(task).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 500);
    // Resumed as a recurring task, due one interval after the resume at t=500.
    assert_eq!(ctx.fires[0], vec![1, 600, 700, 800, 900, 1000]);
}

#[test]
fn one_time_task_waits_out_one_interval_then_parks() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let task = kernel.add_task(log0, 80, TaskStatus::OneTime).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 400);
    assert_eq!(ctx.fires[0], vec![80]);
    assert_eq!(kernel.task_status(task), Ok(TaskStatus::Paused));
}

#[test]
fn paused_tasks_are_skipped_and_resume_reschedules() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let task = kernel.add_task(log0, 50, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0], vec![50, 100]);
    kernel.pause_task(task).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 300);
    assert_eq!(ctx.fires[0], vec![50, 100]);
    kernel.resume_task(task).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0], vec![50, 100, 450, 500]);
}

#[test]
fn round_robin_dispatches_every_task_at_its_own_cadence() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 8> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    kernel.add_task(log1, 20, TaskStatus::Scheduled).unwrap();
    kernel.add_task(log2, 50, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 1000);
    assert_eq!(ctx.fires[0].len(), 100);
    assert_eq!(ctx.fires[1].len(), 50);
    assert_eq!(ctx.fires[2].len(), 20);
}

#[test]
fn tick_wraparound_does_not_stall_dispatch() {
    let clock = SimClock::new(0xffff_ff00);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel.add_task(log0, 50, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 600);
    // 600 ticks of a 50 ms task spanning the 32-bit wrap: twelve fires, fifty apart.
    assert_eq!(ctx.fires[0].len(), 12);
    for pair in ctx.fires[0].windows(2) {
        assert_eq!(pair[1].wrapping_sub(pair[0]), 50);
    }
}

#[test]
fn removing_the_sole_task_leaves_an_empty_working_ring() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let task = kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    kernel.remove_task(task).unwrap();
    assert!(kernel.is_empty());
    assert_eq!(kernel.task_count(), 0);
    // Polling an empty ring is a no-op, and the table accepts a fresh task afterwards.
    run_ticks(&mut kernel, &clock, &mut ctx, 50);
    assert!(ctx.fires[0].is_empty());
    kernel.add_task(log1, 10, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 50);
    assert_eq!(ctx.fires[1].len(), 5);
}

#[test]
fn removing_a_middle_task_keeps_the_others_running() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let a = kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    let b = kernel.add_task(log1, 10, TaskStatus::Scheduled).unwrap();
    let c = kernel.add_task(log2, 10, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    kernel.remove_task(b).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0].len(), 20);
    assert_eq!(ctx.fires[1].len(), 10);
    assert_eq!(ctx.fires[2].len(), 20);
    assert_eq!(kernel.task_status(b), Err(KernelError::UnknownTask));
    assert_eq!(kernel.task_status(a), Ok(TaskStatus::Scheduled));
    assert_eq!(kernel.task_status(c), Ok(TaskStatus::Scheduled));
}

#[test]
fn out_of_range_intervals_fall_back_to_the_default() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel.add_task(log0, 0, TaskStatus::Scheduled).unwrap();
    kernel.add_task(log1, 1_000_000, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, DEFAULT_TASK_INTERVAL_MS * 2);
    assert_eq!(ctx.fires[0], vec![50, 100]);
    assert_eq!(ctx.fires[1], vec![50, 100]);
}

#[test]
fn modify_reschedules_interval_and_status() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    let task = kernel.add_task(log0, 100, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0], vec![100]);
    kernel.modify_task(task, 25, TaskStatus::Scheduled).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0], vec![100, 125, 150, 175, 200]);
    kernel.modify_task(task, 25, TaskStatus::Paused).unwrap();
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert_eq!(ctx.fires[0].len(), 5);
}

#[test]
fn capacity_is_enforced() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 2> = Kernel::new(&clock);
    kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    kernel.add_task(log1, 10, TaskStatus::Scheduled).unwrap();
    assert_eq!(
        kernel.add_task(log2, 10, TaskStatus::Scheduled),
        Err(KernelError::Capacity)
    );
}

#[test]
fn stale_and_empty_ring_operations_report_misuse() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 2> = Kernel::new(&clock);
    let a = kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    let b = kernel.add_task(log1, 10, TaskStatus::Scheduled).unwrap();
    kernel.remove_task(a).unwrap();
    assert_eq!(kernel.remove_task(a), Err(KernelError::UnknownTask));
    assert_eq!(kernel.task_status(a), Err(KernelError::UnknownTask));
    kernel.remove_task(b).unwrap();
    assert_eq!(kernel.remove_task(b), Err(KernelError::Empty));
}

#[test]
fn reset_empties_the_ring() {
    let clock = SimClock::new(0);
    let mut kernel: Kernel<Ctx, &SimClock, 4> = Kernel::new(&clock);
    let mut ctx = Ctx::new(&clock);
    kernel.add_task(log0, 10, TaskStatus::Scheduled).unwrap();
    kernel.add_task(log1, 10, TaskStatus::Scheduled).unwrap();
    kernel.reset();
    assert!(kernel.is_empty());
    run_ticks(&mut kernel, &clock, &mut ctx, 100);
    assert!(ctx.fires[0].is_empty());
    assert!(ctx.fires[1].is_empty());
}
