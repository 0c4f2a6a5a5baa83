//! Builds the fixed task set from the configured dates and addresses.

use std::collections::HashSet;
use std::time::Duration;

use crate::core::{PollTask, TaskHandle, TaskKey};

/// Cartesian product of `dates` × `addresses`, dates outer.
///
/// Entries are trimmed; blank entries and repeated pairs are skipped.
#[must_use]
pub fn build_tasks<D, A>(dates: &[D], addresses: &[A], ttl: Duration) -> Vec<TaskHandle>
where
    D: AsRef<str>,
    A: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(dates.len() * addresses.len());

    for date in dates {
        for address in addresses {
            let key = TaskKey::new(date, address);
            if key.exam_date.is_empty() || key.address.is_empty() {
                continue;
            }
            if seen.insert(key.clone()) {
                tasks.push(PollTask::handle(key, ttl));
            }
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(tasks: &[TaskHandle]) -> Vec<(String, String)> {
        tasks
            .iter()
            .map(|t| (t.key().exam_date.clone(), t.key().address.clone()))
            .collect()
    }

    #[test]
    fn test_product_order() {
        let tasks = build_tasks(&["15", "16"], &["Kyiv", "Lviv"], Duration::from_secs(60));
        assert_eq!(
            keys(&tasks),
            vec![
                ("15".into(), "Kyiv".into()),
                ("15".into(), "Lviv".into()),
                ("16".into(), "Kyiv".into()),
                ("16".into(), "Lviv".into()),
            ]
        );
    }

    #[test]
    fn test_trims_and_skips_blank_and_repeated() {
        let tasks = build_tasks(&[" 15 ", "", "15"], &["Kyiv ", "  "], Duration::ZERO);
        assert_eq!(keys(&tasks), vec![("15".into(), "Kyiv".into())]);
    }

    #[test]
    fn test_empty_inputs() {
        let none: [&str; 0] = [];
        assert!(build_tasks(&none, &["Kyiv"], Duration::ZERO).is_empty());
    }

    #[test]
    fn test_ttl_is_applied() {
        let tasks = build_tasks(&["1"], &["a"], Duration::from_secs(42));
        assert_eq!(tasks[0].snapshot().ttl, Duration::from_secs(42));
    }
}
