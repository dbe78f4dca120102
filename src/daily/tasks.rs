use std::collections::HashSet;

use crate::acquisition::AssetLoader;
use crate::db::{Store, StoreError};
use crate::models::TasksByAgeGroup;

pub const TASKS_ASSET: &str = "daily_actions.json";
pub const FALLBACK_AGE_GROUP: &str = "adult";

const BUILTIN_TASKS: &[(&str, &[&str])] = &[
    (
        "child",
        &["morning_adhkar", "read_page", "help_parent", "smile"],
    ),
    (
        "youth",
        &["morning_adhkar", "read_page", "pray_on_time", "charity", "evening_adhkar"],
    ),
    (
        "adult",
        &[
            "morning_adhkar",
            "read_page",
            "pray_on_time",
            "charity",
            "visit_relative",
            "evening_adhkar",
        ],
    ),
];

/// Table used when `daily_actions.json` cannot be loaded.
pub fn builtin_tasks() -> TasksByAgeGroup {
    BUILTIN_TASKS
        .iter()
        .map(|(group, tasks)| {
            (
                group.to_string(),
                tasks.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: String,
    pub done: bool,
}

pub struct DailyTasks {
    table: TasksByAgeGroup,
}

impl DailyTasks {
    pub fn new(table: TasksByAgeGroup) -> Self {
        Self { table }
    }

    /// Loads the bundled table, falling back to the built-in one.
    pub async fn load(loader: &AssetLoader) -> Self {
        let loaded = match loader.fetch(TASKS_ASSET).await {
            Ok(bytes) => serde_json::from_slice::<TasksByAgeGroup>(&bytes)
                .map_err(|e| tracing::warn!("Ignoring malformed {}: {}", TASKS_ASSET, e))
                .ok(),
            Err(e) => {
                tracing::debug!("{} unavailable: {}", TASKS_ASSET, e);
                None
            }
        };
        Self::new(loaded.unwrap_or_else(builtin_tasks))
    }

    /// Task ids for an age group; unknown or unset groups get the adult
    /// list, from this table or the built-in one.
    pub fn tasks_for(&self, age_group: Option<&str>) -> Vec<String> {
        age_group
            .and_then(|group| self.table.get(group))
            .or_else(|| self.table.get(FALLBACK_AGE_GROUP))
            .cloned()
            .unwrap_or_else(|| {
                builtin_tasks()
                    .remove(FALLBACK_AGE_GROUP)
                    .unwrap_or_default()
            })
    }

    /// Today's tasks for the profile's age group, each marked done when an
    /// action of that type was logged today.
    pub async fn progress(&self, store: &Store) -> Result<Vec<TaskStatus>, StoreError> {
        let settings = store.settings().get().await?;
        let completed: HashSet<String> = store
            .action_log()
            .list_for_today()
            .await?
            .into_iter()
            .map(|entry| entry.action_type)
            .collect();

        Ok(self
            .tasks_for(settings.age_group.as_deref())
            .into_iter()
            .map(|id| TaskStatus {
                done: completed.contains(&id),
                id,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_store;
    use crate::host::{in_process, AssetBundle, HostServices};
    use crate::models::SettingsPatch;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_to_adult() {
        let mut table = TasksByAgeGroup::new();
        table.insert("adult".into(), vec!["a".into()]);
        table.insert("child".into(), vec!["c".into()]);
        let tasks = DailyTasks::new(table);

        assert_eq!(tasks.tasks_for(Some("child")), vec!["c"]);
        assert_eq!(tasks.tasks_for(Some("elder")), vec!["a"]);
        assert_eq!(tasks.tasks_for(None), vec!["a"]);

        let no_adult = DailyTasks::new(TasksByAgeGroup::new());
        assert_eq!(
            no_adult.tasks_for(None),
            builtin_tasks()["adult"].clone()
        );
    }

    #[tokio::test]
    async fn test_load_from_bundle_or_builtin() {
        let dir = TempDir::new().unwrap();
        let loader = AssetLoader::bridge(in_process(HostServices::new(AssetBundle::new(dir.path()))));

        let builtin = DailyTasks::load(&loader).await;
        assert_eq!(builtin.tasks_for(Some("youth")), builtin_tasks()["youth"].clone());

        std::fs::write(dir.path().join(TASKS_ASSET), r#"{"adult": ["custom"]}"#).unwrap();
        let bundled = DailyTasks::load(&loader).await;
        assert_eq!(bundled.tasks_for(Some("youth")), vec!["custom"]);
    }

    #[tokio::test]
    async fn test_progress_marks_logged_actions() {
        let ctx = test_store();
        ctx.store
            .settings()
            .save(SettingsPatch {
                age_group: Some("child".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.store.action_log().append("smile", None).await.unwrap();

        let tasks = DailyTasks::new(builtin_tasks());
        let progress = tasks.progress(&ctx.store).await.unwrap();

        let done: Vec<&str> = progress
            .iter()
            .filter(|t| t.done)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(done, vec!["smile"]);
        assert_eq!(progress.len(), 4);
    }
}
