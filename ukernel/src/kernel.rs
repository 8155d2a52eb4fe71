use crate::{
    DEFAULT_TASK_INTERVAL_MS, KernelError, KernelResult, MAX_TASK_INTERVAL_MS, MAX_TASKS,
    Monotonic, TaskFn, TaskId, TaskStatus,
    task::Slot,
};

/// A cooperative round-robin task kernel.
///
/// Owns a fixed arena of `N` task slots (`N` at most [MAX_TASKS]) linked into a circular
/// list by index, and the [Monotonic] clock that drives dispatch. `C` is the context type
/// handed to every task body.
///
/// Construction is initialization: a fresh kernel has an empty ring, and every operation is
/// valid on it. Callbacks run on the caller's thread, strictly one at a time.
pub struct Kernel<C, M, const N: usize> {
    clock: M,
    slots: [Option<Slot<C>>; N],
    head: Option<usize>,
    cursor: usize,
    count: usize,
}

impl<C, M: Monotonic, const N: usize> Kernel<C, M, N> {
    /// Creates an empty kernel owning the given clock.
    pub fn new(clock: M) -> Self {
        const {
            assert!(N > 0 && N <= MAX_TASKS, "task capacity out of range");
        }
        Self {
            clock,
            slots: [const { None }; N],
            head: None,
            cursor: 0,
            count: 0,
        }
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.count
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Task capacity of this kernel instance.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Removes every task and empties the ring. Handles issued so far become invalid.
    pub fn reset(&mut self) {
        self.slots = [const { None }; N];
        self.head = None;
        self.cursor = 0;
        self.count = 0;
    }

    /// Registers a task.
    ///
    /// The interval is accepted as-is within `[1, MAX_TASK_INTERVAL_MS]`; anything outside
    /// that range silently falls back to [DEFAULT_TASK_INTERVAL_MS] (this mirrors runtime
    /// reconfiguration sources that may hand over a nonsense value; it is not an error).
    /// The first dispatch is due immediately for the `*Immediate` states and one interval
    /// from now otherwise.
    ///
    /// The new task is spliced into the ring right after the current tail, so dispatch order
    /// follows registration order.
    ///
    /// # Errors
    /// [KernelError::Capacity] if the task table is full.
    pub fn add_task(
        &mut self,
        body: TaskFn<C>,
        interval_ms: u32,
        status: TaskStatus,
    ) -> KernelResult<TaskId> {
        if self.count == N {
            return Err(KernelError::Capacity);
        }
        let Some(idx) = self.slots.iter().position(|slot| slot.is_none()) else {
            return Err(KernelError::Capacity);
        };
        let interval_ms = clamp_interval(interval_ms);
        let now = self.clock.now_ms();
        let next_fire = if status.immediate_start() {
            now
        } else {
            now.wrapping_add(interval_ms)
        };
        let next = match self.head {
            // Sole node: self-referencing ring.
            None => {
                self.head = Some(idx);
                self.cursor = idx;
                idx
            }
            Some(head) => {
                let tail = self.find_tail(head);
                if let Some(slot) = self.slots[tail].as_mut() {
                    slot.next = idx;
                }
                head
            }
        };
        self.slots[idx] = Some(Slot {
            body,
            interval_ms,
            next_fire,
            status,
            next,
        });
        self.count += 1;
        Ok(TaskId(idx))
    }

    /// Unlinks a task from the ring and frees its slot.
    ///
    /// # Errors
    /// [KernelError::Empty] if the ring is empty, [KernelError::UnknownTask] if the handle
    /// is stale.
    pub fn remove_task(&mut self, task: TaskId) -> KernelResult<()> {
        let Some(head) = self.head else {
            return Err(KernelError::Empty);
        };
        let idx = self.slot_index(task)?;
        if self.count == 1 {
            self.slots[idx] = None;
            self.head = None;
            self.cursor = 0;
            self.count = 0;
            return Ok(());
        }
        let prev = self.find_prev(idx);
        let next = self.next_of(idx);
        if let Some(slot) = self.slots[prev].as_mut() {
            slot.next = next;
        }
        if head == idx {
            self.head = Some(next);
        }
        if self.cursor == idx {
            self.cursor = next;
        }
        self.slots[idx] = None;
        self.count -= 1;
        Ok(())
    }

    /// Parks a task; it is skipped by dispatch until resumed.
    pub fn pause_task(&mut self, task: TaskId) -> KernelResult<()> {
        let idx = self.slot_index(task)?;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.status = TaskStatus::Paused;
            slot.next_fire = 0;
        }
        Ok(())
    }

    /// Puts a task back on the schedule, due one interval from now.
    pub fn resume_task(&mut self, task: TaskId) -> KernelResult<()> {
        let idx = self.slot_index(task)?;
        let now = self.clock.now_ms();
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.status = TaskStatus::Scheduled;
            slot.next_fire = now.wrapping_add(slot.interval_ms);
        }
        Ok(())
    }

    /// Overwrites a task's interval and status, recomputing its next-fire time.
    ///
    /// Out-of-range intervals fall back to [DEFAULT_TASK_INTERVAL_MS], as in
    /// [add_task](Kernel::add_task). Active states are rescheduled relative to now
    /// (immediately for the `*Immediate` flavors); [Paused](TaskStatus::Paused) clears the
    /// next-fire time.
    pub fn modify_task(
        &mut self,
        task: TaskId,
        interval_ms: u32,
        status: TaskStatus,
    ) -> KernelResult<()> {
        let idx = self.slot_index(task)?;
        let now = self.clock.now_ms();
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.interval_ms = clamp_interval(interval_ms);
            slot.status = status;
            slot.next_fire = if !status.is_active() {
                0
            } else if status.immediate_start() {
                now
            } else {
                now.wrapping_add(slot.interval_ms)
            };
        }
        Ok(())
    }

    /// The current scheduling state of a task.
    pub fn task_status(&self, task: TaskId) -> KernelResult<TaskStatus> {
        let idx = self.slot_index(task)?;
        match &self.slots[idx] {
            Some(slot) => Ok(slot.status),
            None => Err(KernelError::UnknownTask),
        }
    }

    /// One scheduler step: check the task at the ring cursor, fire it if due, advance.
    ///
    /// The cursor advances whether or not the task fired, so one slow or busy task cannot
    /// monopolize the ring. For recurring tasks the next-fire time is recomputed *before*
    /// the callback runs; a long-running callback delays its siblings but does not stretch
    /// its own period. One-shot tasks park as [Paused](TaskStatus::Paused) around their
    /// single dispatch.
    pub fn poll(&mut self, ctx: &mut C) {
        if self.head.is_none() {
            return;
        }
        let now = self.clock.now_ms();
        let idx = self.cursor;
        let Some(slot) = self.slots[idx].as_mut() else {
            return;
        };
        self.cursor = slot.next;
        let due = slot.status.is_active() && now.wrapping_sub(slot.next_fire) as i32 >= 0;
        if !due {
            return;
        }
        if slot.status.one_shot() {
            slot.status = TaskStatus::Paused;
            slot.next_fire = 0;
        } else {
            slot.next_fire = now.wrapping_add(slot.interval_ms);
        }
        let body = slot.body;
        body(ctx);
    }

    /// The scheduler loop: poll forever. Never returns.
    pub fn run_forever(&mut self, ctx: &mut C) -> ! {
        loop {
            self.poll(ctx);
        }
    }

    fn slot_index(&self, task: TaskId) -> KernelResult<usize> {
        if task.0 < N && self.slots[task.0].is_some() {
            Ok(task.0)
        } else {
            Err(KernelError::UnknownTask)
        }
    }

    /// Ring link of a slot; unoccupied slots read as self-referencing, which keeps walks
    /// finite if an invariant is ever broken.
    fn next_of(&self, idx: usize) -> usize {
        match &self.slots[idx] {
            Some(slot) => slot.next,
            None => idx,
        }
    }

    fn find_tail(&self, head: usize) -> usize {
        let mut tail = head;
        while self.next_of(tail) != head {
            tail = self.next_of(tail);
        }
        tail
    }

    fn find_prev(&self, idx: usize) -> usize {
        let mut prev = idx;
        while self.next_of(prev) != idx {
            prev = self.next_of(prev);
        }
        prev
    }
}

fn clamp_interval(interval_ms: u32) -> u32 {
    if (1..=MAX_TASK_INTERVAL_MS).contains(&interval_ms) {
        interval_ms
    } else {
        DEFAULT_TASK_INTERVAL_MS
    }
}
