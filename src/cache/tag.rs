//! Cache keys, entity tags, and the reverse tag index.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::model::{ProjectId, TaskId};

/// Entity reference attached to cache entries.
///
/// `ProjectList` and `TaskList` are collection sentinels: they stand for
/// "membership of the collection" and are invalidated by create/delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Project(ProjectId),
    ProjectList,
    Task(TaskId),
    /// Task list of one project
    ProjectTasks(ProjectId),
    TaskList,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project:{id}"),
            Self::ProjectList => f.write_str("project:LIST"),
            Self::Task(id) => write!(f, "task:{id}"),
            Self::ProjectTasks(id) => write!(f, "tasks-of:{id}"),
            Self::TaskList => f.write_str("task:LIST"),
        }
    }
}

/// Identity of a cache entry: endpoint name plus its argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    endpoint: &'static str,
    arg: String,
}

impl CacheKey {
    pub fn new(endpoint: &'static str, arg: impl Into<String>) -> Self {
        Self {
            endpoint,
            arg: arg.into(),
        }
    }

    /// Key for an endpoint that takes no argument.
    #[must_use]
    pub fn unit(endpoint: &'static str) -> Self {
        Self::new(endpoint, "")
    }

    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    #[must_use]
    pub fn arg(&self) -> &str {
        &self.arg
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.arg)
    }
}

/// Reverse mapping from tag to the cache entries carrying it.
///
/// Kept in lockstep with the entry map: every entry's tag set is indexed
/// exactly once, and removed before the entry is replaced or dropped.
#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    by_tag: HashMap<Tag, HashSet<CacheKey>>,
}

impl TagIndex {
    pub(crate) fn insert(&mut self, key: &CacheKey, tags: &BTreeSet<Tag>) {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    pub(crate) fn remove(&mut self, key: &CacheKey, tags: &BTreeSet<Tag>) {
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Every key carrying at least one of `tags`.
    pub(crate) fn keys_for(&self, tags: &[Tag]) -> BTreeSet<CacheKey> {
        tags.iter()
            .filter_map(|tag| self.by_tag.get(tag))
            .flatten()
            .cloned()
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.by_tag.clear();
    }

    #[cfg(test)]
    pub(crate) fn tag_count(&self) -> usize {
        self.by_tag.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[Tag]) -> BTreeSet<Tag> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_keys_for_unions_tags() {
        let mut index = TagIndex::default();
        let list = CacheKey::unit("projects");
        let tasks = CacheKey::new("tasks", "p1");

        index.insert(
            &list,
            &tags(&[Tag::Project("p1".into()), Tag::ProjectList]),
        );
        index.insert(&tasks, &tags(&[Tag::ProjectTasks("p1".into())]));

        let hit = index.keys_for(&[Tag::Project("p1".into())]);
        assert_eq!(hit.into_iter().collect::<Vec<_>>(), vec![list.clone()]);

        let both = index.keys_for(&[Tag::ProjectList, Tag::ProjectTasks("p1".into())]);
        assert_eq!(both.len(), 2);

        assert!(index.keys_for(&[Tag::Project("p2".into())]).is_empty());
    }

    #[test]
    fn test_remove_drops_empty_tags() {
        let mut index = TagIndex::default();
        let key = CacheKey::unit("projects");
        let set = tags(&[Tag::ProjectList, Tag::Project("p1".into())]);
        index.insert(&key, &set);
        assert_eq!(index.tag_count(), 2);
        index.remove(&key, &set);
        assert_eq!(index.tag_count(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(CacheKey::new("tasks", "p1").to_string(), "tasks(p1)");
        assert_eq!(Tag::ProjectTasks("p1".into()).to_string(), "tasks-of:p1");
    }
}
