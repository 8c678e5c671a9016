//! Sample board served when no remote Task API is configured.

use chrono::{Duration, Utc};

use crate::client::MockTaskApi;
use crate::models::task::{Priority, Task, TaskMember, TaskStatus};

const TITLES: [&str; 12] = [
    "Schedule viewing",
    "Follow up with lead",
    "Collect signed offer",
    "Order property valuation",
    "Update listing photos",
    "Renew tenancy agreement",
    "Chase overdue rent",
    "Arrange key handover",
    "Book maintenance visit",
    "Prepare inventory report",
    "Verify buyer documents",
    "Publish open house notice",
];

/// Builds `per_column` tasks in each column with ids starting at 1.
pub fn sample_tasks(per_column: usize) -> Vec<Task> {
    let now = Utc::now();
    let mut tasks = Vec::with_capacity(per_column * TaskStatus::ALL.len());
    let mut id = 1;

    for status in TaskStatus::ALL {
        for position in 0..per_column {
            let title = TITLES[(id as usize - 1) % TITLES.len()];
            let mut task = Task::new(id, status, position as i32, format!("{} #{}", title, id));
            task.priority = match id % 3 {
                0 => Priority::High,
                1 => Priority::Medium,
                _ => Priority::Normal,
            };
            task.added_date = now - Duration::days(i64::from(id));
            task.task_start_from = Some(task.added_date);
            task.task_end_on = Some(now + Duration::days(i64::from(id % 14) + 1));
            task.task_members = vec![TaskMember {
                user_id: id % 4 + 1,
                name: None,
            }];
            tasks.push(task);
            id += 1;
        }
    }

    tasks
}

pub fn demo_api() -> MockTaskApi {
    MockTaskApi::with_tasks(sample_tasks(15))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_column_gets_distinct_ids() {
        let tasks = sample_tasks(4);
        assert_eq!(tasks.len(), 12);

        let ids: HashSet<i32> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 12);

        for status in TaskStatus::ALL {
            let orders: Vec<i32> = tasks.iter().filter(|t| t.status == status).map(|t| t.order).collect();
            assert_eq!(orders, vec![0, 1, 2, 3]);
        }
    }
}
