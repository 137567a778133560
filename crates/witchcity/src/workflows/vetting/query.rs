use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{VettingApplication, VettingStatus};
pub use crate::api::PagedResult;
use crate::identity::UserId;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    SubmittedAt,
    LastActivity,
    Status,
    SceneName,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Reviewer search criteria for the application grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationFilter {
    pub statuses: Vec<VettingStatus>,
    pub search_query: Option<String>,
    pub only_my_assignments: bool,
    pub submitted_after: Option<DateTime<Utc>>,
    pub submitted_before: Option<DateTime<Utc>>,
    pub page: usize,
    pub page_size: usize,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
}

impl Default for ApplicationFilter {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            search_query: None,
            only_my_assignments: false,
            submitted_after: None,
            submitted_before: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl ApplicationFilter {
    pub fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn matches(&self, application: &VettingApplication, reviewer: &UserId) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&application.status) {
            return false;
        }
        if self.only_my_assignments && application.assigned_reviewer.as_ref() != Some(reviewer) {
            return false;
        }
        if let Some(after) = self.submitted_after {
            if application.submitted_at < after {
                return false;
            }
        }
        if let Some(before) = self.submitted_before {
            if application.submitted_at > before {
                return false;
            }
        }

        match self
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
        {
            Some(query) => {
                let needle = query.to_lowercase();
                application
                    .application_number
                    .to_lowercase()
                    .contains(&needle)
                    || application
                        .display_scene_name()
                        .to_lowercase()
                        .contains(&needle)
            }
            None => true,
        }
    }

    pub fn compare(&self, left: &VettingApplication, right: &VettingApplication) -> Ordering {
        let ordering = match self.sort_by {
            SortField::SubmittedAt => left.submitted_at.cmp(&right.submitted_at),
            SortField::LastActivity => left.updated_at.cmp(&right.updated_at),
            SortField::Status => left.status.label().cmp(right.status.label()),
            SortField::SceneName => left
                .display_scene_name()
                .to_lowercase()
                .cmp(&right.display_scene_name().to_lowercase()),
            SortField::Priority => left.priority.cmp(&right.priority),
        };
        let ordering = ordering.then_with(|| left.id.cmp(&right.id));

        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        let mut filter = ApplicationFilter {
            page_size: 0,
            ..ApplicationFilter::default()
        };
        assert_eq!(filter.effective_page_size(), 1);
        filter.page_size = 500;
        assert_eq!(filter.effective_page_size(), MAX_PAGE_SIZE);
        filter.page = 0;
        assert_eq!(filter.effective_page(), 1);
    }

    #[test]
    fn filter_deserializes_with_defaults() {
        let filter: ApplicationFilter =
            serde_json::from_str(r#"{"statuses":["OnHold"],"sortDirection":"Asc"}"#)
                .expect("filter parses");
        assert_eq!(filter.statuses, vec![VettingStatus::OnHold]);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.sort_by, SortField::SubmittedAt);
        assert_eq!(filter.sort_direction, SortDirection::Asc);
    }
}
