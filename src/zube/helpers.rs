//! Lookups over fetched resource lists used by the command line.

use super::types::{Account, Card, Epic, Member, Project, Source, Workspace};

/// Direct link to a card in the Zube web app.
pub fn card_url(account: &Account, project: &Project, card: &Card) -> String {
  format!(
    "https://zube.io/{}/{}/c/{}",
    account.slug, project.slug, card.number
  )
}

pub fn project_by_name<'a>(name: &str, projects: &'a [Project]) -> Option<&'a Project> {
  projects.iter().find(|p| p.name == name)
}

pub fn workspace_by_name<'a>(name: &str, workspaces: &'a [Workspace]) -> Option<&'a Workspace> {
  workspaces.iter().find(|w| w.name == name)
}

pub fn source_by_name<'a>(name: &str, sources: &'a [Source]) -> Option<&'a Source> {
  sources.iter().find(|s| s.name == name)
}

pub fn epic_by_title<'a>(title: &str, epics: &'a [Epic]) -> Option<&'a Epic> {
  epics.iter().find(|e| e.title == title)
}

/// Members whose display name is in `names`, in member order.
pub fn members_by_names<'a>(names: &[String], members: &'a [Member]) -> Vec<&'a Member> {
  members
    .iter()
    .filter(|m| names.iter().any(|n| n == m.display_name()))
    .collect()
}

/// Parse a priority choice. `"None"` (or anything outside 1-5) means unset.
pub fn parse_priority(priority: &str) -> Option<u8> {
  priority
    .trim()
    .parse::<u8>()
    .ok()
    .filter(|p| (1..=5).contains(p))
}
