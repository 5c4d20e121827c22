//! Zube resource records.
//!
//! Records are decoded leniently: every field has a default and unknown
//! fields are ignored, so API additions never break a fetch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
  pub id: u64,
  pub username: String,
  pub name: String,
  pub avatar_path: String,
}

/// The user the access token belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentPerson {
  #[serde(flatten)]
  pub person: Person,
  pub github_user_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
  pub id: u64,
  pub display_name: String,
  pub slug: String,
  pub status: String,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
  pub id: u64,
  pub account_id: u64,
  pub name: String,
  pub slug: String,
  pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
  pub id: u64,
  pub project_id: u64,
  pub name: String,
  pub slug: String,
  pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Epic {
  pub id: u64,
  pub workspace_id: u64,
  pub number: u64,
  pub status: String,
  pub color: String,
  pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
  pub id: u64,
  pub project_id: u64,
  pub name: String,
  pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprint {
  pub id: u64,
  pub workspace_id: u64,
  pub title: String,
  pub state: String,
  pub start_date: String,
  pub end_date: String,
}

/// A GitHub repository connected to the account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
  pub id: u64,
  pub name: String,
  pub username: String,
  pub person: Option<Person>,
}

impl Member {
  /// Display name, preferring the nested person record when present.
  pub fn display_name(&self) -> &str {
    match &self.person {
      Some(person) if !person.name.is_empty() => &person.name,
      _ => &self.name,
    }
  }

  pub fn person_id(&self) -> u64 {
    self.person.as_ref().map(|p| p.id).unwrap_or(self.id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timestamps {
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
  pub id: u64,
  pub body: String,
  pub creator: Person,
  pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubIssue {
  pub id: u64,
  pub number: u64,
  pub source_id: u64,
  pub html_url: String,
  pub source: Source,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
  pub id: u64,
  pub number: u64,
  pub project_id: u64,
  pub workspace_id: Option<u64>,
  pub sprint_id: Option<u64>,
  pub epic_id: Option<u64>,
  pub title: String,
  pub body: String,
  pub category_name: String,
  pub status: String,
  pub state: String,
  pub priority: Option<u8>,
  pub points: Option<f64>,
  pub created_at: String,
  pub updated_at: String,
  pub assignees: Vec<Person>,
  pub labels: Vec<Label>,
  pub github_issue: Option<GithubIssue>,
}

/// Request body for card creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewCard {
  pub project_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workspace_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub epic_id: Option<u64>,
  pub title: String,
  pub body: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<u8>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub label_ids: Vec<u64>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub assignee_ids: Vec<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub github_issue: Option<NewGithubIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGithubIssue {
  pub source_id: u64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_card_ignores_unknown_and_null_fields() {
    let card: Card = serde_json::from_value(json!({
      "id": 1,
      "number": 42,
      "title": "Fix login",
      "priority": null,
      "something_new": {"nested": true},
      "labels": [{"id": 3, "name": "bug"}]
    }))
    .unwrap();

    assert_eq!(card.number, 42);
    assert_eq!(card.priority, None);
    assert_eq!(card.labels[0].name, "bug");
  }

  #[test]
  fn test_new_card_omits_empty_fields() {
    let card = NewCard {
      project_id: 7,
      title: "Title".into(),
      ..NewCard::default()
    };

    assert_eq!(
      serde_json::to_value(&card).unwrap(),
      json!({"project_id": 7, "title": "Title", "body": ""})
    );
  }

  #[test]
  fn test_member_display_name_prefers_person() {
    let member: Member =
      serde_json::from_value(json!({"id": 1, "person": {"id": 9, "name": "dan"}})).unwrap();
    assert_eq!(member.display_name(), "dan");
    assert_eq!(member.person_id(), 9);
  }
}
