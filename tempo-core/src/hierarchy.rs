//! Parent/child lookups over the project forest.

use std::collections::{HashMap, HashSet};

use crate::{
    domain::{Project, ProjectId},
    error::ConfigurationError,
};

/// Separator used when a project's full name is shown as one string.
pub const NAME_SEPARATOR: &str = "/";

/// Arena of projects keyed by id, with the reflexive descendant closure of
/// every project precomputed.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    projects: HashMap<ProjectId, Project>,
    children: HashMap<ProjectId, Vec<ProjectId>>,
    descendants: HashMap<ProjectId, HashSet<ProjectId>>,
    roots: Vec<ProjectId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl ProjectIndex {
    /// Builds the index, rejecting duplicate ids, dangling parent references
    /// and cycles.
    pub fn build(projects: &[Project]) -> Result<Self, ConfigurationError> {
        let mut by_id = HashMap::with_capacity(projects.len());
        for project in projects {
            if by_id.insert(project.id.clone(), project.clone()).is_some() {
                return Err(ConfigurationError::DuplicateProject(project.id.clone()));
            }
        }

        for project in projects {
            if let Some(parent) = &project.parent_id {
                if !by_id.contains_key(parent) {
                    return Err(ConfigurationError::UnknownParent {
                        project: project.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        check_acyclic(&by_id)?;

        let mut children: HashMap<ProjectId, Vec<ProjectId>> = HashMap::new();
        let mut descendants: HashMap<ProjectId, HashSet<ProjectId>> = HashMap::new();
        let mut roots = Vec::new();

        for project in projects {
            match &project.parent_id {
                Some(parent) => children
                    .entry(parent.clone())
                    .or_default()
                    .push(project.id.clone()),
                None => roots.push(project.id.clone()),
            }

            // Acyclic, so walking the ancestor chain terminates.
            let mut current = Some(&project.id);
            while let Some(id) = current {
                descendants
                    .entry(id.clone())
                    .or_default()
                    .insert(project.id.clone());
                current = by_id.get(id).and_then(|p| p.parent_id.as_ref());
            }
        }

        let sort_by_name = |ids: &mut Vec<ProjectId>| {
            ids.sort_by(|a, b| {
                let name_a = by_id.get(a).map(|p| p.name.as_str());
                let name_b = by_id.get(b).map(|p| p.name.as_str());
                name_a.cmp(&name_b).then_with(|| a.cmp(b))
            })
        };
        for ids in children.values_mut() {
            sort_by_name(ids);
        }
        sort_by_name(&mut roots);

        tracing::debug!(projects = by_id.len(), roots = roots.len(), "built project index");

        Ok(Self {
            projects: by_id,
            children,
            descendants,
            roots,
        })
    }

    pub fn get(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// The project itself and every project below it. `None` for unknown ids.
    pub fn descendants_of(&self, id: &ProjectId) -> Option<&HashSet<ProjectId>> {
        self.descendants.get(id)
    }

    /// Reflexive: a project is its own descendant.
    pub fn is_descendant_of(&self, id: &ProjectId, ancestor: &ProjectId) -> bool {
        self.descendants
            .get(ancestor)
            .is_some_and(|set| set.contains(id))
    }

    /// Direct children, sorted by name.
    pub fn children_of(&self, id: &ProjectId) -> &[ProjectId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: &ProjectId) -> Option<&Project> {
        self.get(id)
            .and_then(|p| p.parent_id.as_ref())
            .and_then(|parent| self.get(parent))
    }

    pub fn has_subprojects(&self, id: &ProjectId) -> bool {
        !self.children_of(id).is_empty()
    }

    /// Top-level projects, sorted by name.
    pub fn roots(&self) -> &[ProjectId] {
        &self.roots
    }

    /// Names from the root down to `id`, e.g. `["Acme", "Website"]`.
    pub fn full_name(&self, id: &ProjectId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self.get(id);
        while let Some(project) = current {
            names.push(project.name.as_str());
            current = project.parent_id.as_ref().and_then(|p| self.get(p));
        }
        names.reverse();
        names
    }

    /// Full name joined with [`NAME_SEPARATOR`], falling back to the raw id
    /// for unknown projects.
    pub fn display_name(&self, id: &ProjectId) -> String {
        let names = self.full_name(id);
        if names.is_empty() {
            return id.to_string();
        }
        names.join(NAME_SEPARATOR)
    }
}

fn check_acyclic(projects: &HashMap<ProjectId, Project>) -> Result<(), ConfigurationError> {
    let mut state: HashMap<&ProjectId, Visit> = HashMap::with_capacity(projects.len());

    for start in projects.keys() {
        if state.contains_key(start) {
            continue;
        }

        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            match state.get(id) {
                Some(Visit::Done) => break,
                Some(Visit::InProgress) => {
                    return Err(ConfigurationError::CyclicHierarchy(id.clone()));
                }
                None => {
                    state.insert(id, Visit::InProgress);
                    path.push(id);
                    current = projects.get(id).and_then(|p| p.parent_id.as_ref());
                }
            }
        }

        for id in path {
            state.insert(id, Visit::Done);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Project> {
        vec![
            Project::new("acme", "Acme"),
            Project::new("web", "Website").with_parent("acme"),
            Project::new("api", "API").with_parent("acme"),
            Project::new("docs", "Docs").with_parent("web"),
            Project::new("solo", "Solo"),
        ]
    }

    #[test]
    fn descendants_are_reflexive_and_transitive() {
        let index = ProjectIndex::build(&tree()).unwrap();
        let acme = index.descendants_of(&"acme".into()).unwrap();
        assert_eq!(acme.len(), 4);
        assert!(acme.contains(&ProjectId::from("acme")));
        assert!(acme.contains(&ProjectId::from("docs")));
        assert!(!acme.contains(&ProjectId::from("solo")));

        let docs = index.descendants_of(&"docs".into()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(index.is_descendant_of(&"docs".into(), &"web".into()));
        assert!(!index.is_descendant_of(&"web".into(), &"docs".into()));
    }

    #[test]
    fn children_and_roots_sorted_by_name() {
        let index = ProjectIndex::build(&tree()).unwrap();
        let children: Vec<_> = index
            .children_of(&"acme".into())
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(children, vec!["api", "web"]);
        assert_eq!(index.roots(), &[ProjectId::from("acme"), ProjectId::from("solo")]);
        assert!(index.has_subprojects(&"web".into()));
        assert!(!index.has_subprojects(&"docs".into()));
        assert_eq!(index.parent_of(&"docs".into()).map(|p| p.name.as_str()), Some("Website"));
    }

    #[test]
    fn full_name_walks_to_the_root() {
        let index = ProjectIndex::build(&tree()).unwrap();
        assert_eq!(index.full_name(&"docs".into()), vec!["Acme", "Website", "Docs"]);
        assert_eq!(index.display_name(&"docs".into()), "Acme/Website/Docs");
        assert_eq!(index.display_name(&"missing".into()), "missing");
    }

    #[test]
    fn cycle_is_rejected() {
        let projects = vec![
            Project::new("a", "A").with_parent("c"),
            Project::new("b", "B").with_parent("a"),
            Project::new("c", "C").with_parent("b"),
            Project::new("d", "D"),
        ];
        assert!(matches!(
            ProjectIndex::build(&projects),
            Err(ConfigurationError::CyclicHierarchy(_))
        ));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let projects = vec![Project::new("a", "A").with_parent("a")];
        assert_eq!(
            ProjectIndex::build(&projects).unwrap_err(),
            ConfigurationError::CyclicHierarchy("a".into())
        );
    }

    #[test]
    fn dangling_parent_is_rejected() {
        let projects = vec![Project::new("a", "A").with_parent("ghost")];
        assert_eq!(
            ProjectIndex::build(&projects).unwrap_err(),
            ConfigurationError::UnknownParent {
                project: "a".into(),
                parent: "ghost".into(),
            }
        );
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let projects = vec![Project::new("a", "A"), Project::new("a", "Again")];
        assert_eq!(
            ProjectIndex::build(&projects).unwrap_err(),
            ConfigurationError::DuplicateProject("a".into())
        );
    }
}
