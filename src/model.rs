#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub submitted_tasks: usize,
    pub completed_tasks: usize,
    pub panicked_tasks: usize,
}

impl PoolMetrics {
    pub fn idle_workers(&self) -> usize {
        self.workers.saturating_sub(self.active_tasks)
    }

    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.workers as f64
    }

    /// Доля задач, завершившихся без паники
    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.panicked_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}


/// Запись о задаче, завершившейся паникой
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Порядковый номер задачи в очереди отправки (с нуля)
    pub task_id: u64,
    pub worker: usize,
    pub message: String,
}
