use crate::filter::{self, FilterCriteria};
use crate::models::{ApplicationPatch, ApplicationRecord};

/// The locally cached application list between store reads. Successful writes
/// are folded back in by id instead of reloading everything.
#[derive(Debug, Default)]
pub struct ApplicationList {
    rows: Vec<ApplicationRecord>,
    filters: FilterCriteria,
    selected_id: Option<String>,
}

impl ApplicationList {
    pub fn new(rows: Vec<ApplicationRecord>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn all(&self) -> &[ApplicationRecord] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn visible(&self) -> Vec<&ApplicationRecord> {
        filter::apply(&self.rows, &self.filters)
    }

    /// Changing filters always drops the selection.
    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.selected_id = None;
    }

    pub fn reset_filters(&mut self) {
        self.set_filters(FilterCriteria::default());
    }

    pub fn clear_search(&mut self) {
        self.filters.search.clear();
        self.sync_selection();
    }

    pub fn selected(&self) -> Option<&ApplicationRecord> {
        let id = self.selected_id.as_deref()?;
        self.visible().into_iter().find(|r| r.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id.as_deref()?;
        self.visible().iter().position(|r| r.id == id)
    }

    /// Select a visible record. Returns false if `id` is filtered out or unknown.
    pub fn select(&mut self, id: &str) -> bool {
        let visible = self.visible().iter().any(|r| r.id == id);
        self.selected_id = visible.then(|| id.to_string());
        visible
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// Move the selection through the visible rows, starting at the top when
    /// nothing is selected.
    pub fn move_selection(&mut self, delta: isize) {
        let visible = self.visible();
        if visible.is_empty() {
            self.selected_id = None;
            return;
        }
        let next = match self.selected_index() {
            Some(idx) => idx.saturating_add_signed(delta).min(visible.len() - 1),
            None => 0,
        };
        let id = visible[next].id.clone();
        self.selected_id = Some(id);
    }

    /// A freshly created record goes to the top.
    pub fn insert_created(&mut self, record: ApplicationRecord) {
        self.rows.insert(0, record);
        self.sync_selection();
    }

    /// Fold a successful update into the cached copy. Returns false when the
    /// id is not cached.
    pub fn apply_update(&mut self, id: &str, patch: &ApplicationPatch) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        patch.apply_to(row);
        self.sync_selection();
        true
    }

    /// Drop the selection if the selected record no longer passes the filters.
    fn sync_selection(&mut self) {
        if let Some(id) = &self.selected_id {
            if !self.visible().iter().any(|r| &r.id == id) {
                self.selected_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, NewApplication};
    use pretty_assertions::assert_eq;

    fn record(id: &str, company: &str) -> ApplicationRecord {
        NewApplication {
            company_name: company.into(),
            role_title: "Engineer".into(),
            status: ApplicationStatus::Applied,
            priority: 3,
            applied_at: None,
            next_action_at: None,
            next_action_label: None,
            location: None,
            work_mode: None,
            notes: None,
        }
        .into_record(id.into())
    }

    fn list() -> ApplicationList {
        ApplicationList::new(vec![record("a", "Acme"), record("b", "Beta"), record("c", "Cobalt")])
    }

    fn selected_id(list: &ApplicationList) -> Option<&str> {
        list.selected().map(|r| r.id.as_str())
    }

    fn ids(list: &ApplicationList) -> Vec<&str> {
        list.visible().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn create_prepends() {
        let mut list = list();
        list.insert_created(record("z", "Zeta"));
        assert_eq!(ids(&list), vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut list = list();
        let patch = ApplicationPatch {
            company_name: Some("Beta Labs".into()),
            status: Some(ApplicationStatus::Offer),
            ..Default::default()
        };
        assert!(list.apply_update("b", &patch));
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        assert_eq!(list.all()[1].company_name, "Beta Labs");
        assert_eq!(list.all()[1].status, ApplicationStatus::Offer);
        assert!(!list.apply_update("missing", &patch));
    }

    #[test]
    fn changing_filters_clears_selection() {
        let mut list = list();
        assert!(list.select("a"));
        list.set_filters(FilterCriteria {
            search: "a".into(),
            ..Default::default()
        });
        assert_eq!(selected_id(&list), None);
    }

    #[test]
    fn update_that_filters_out_selection_drops_it() {
        let mut list = list();
        list.set_filters(FilterCriteria {
            status: Some(ApplicationStatus::Applied),
            ..Default::default()
        });
        assert!(list.select("b"));
        let patch = ApplicationPatch {
            status: Some(ApplicationStatus::Rejected),
            ..Default::default()
        };
        list.apply_update("b", &patch);
        assert_eq!(list.selected(), None);
        assert_eq!(ids(&list), vec!["a", "c"]);
    }

    #[test]
    fn cannot_select_hidden_rows() {
        let mut list = list();
        list.set_filters(FilterCriteria {
            search: "cobalt".into(),
            ..Default::default()
        });
        assert!(!list.select("a"));
        assert!(list.select("c"));
        assert_eq!(list.selected().map(|r| r.company_name.as_str()), Some("Cobalt"));
        list.clear_search();
        assert_eq!(selected_id(&list), Some("c"));
    }

    #[test]
    fn move_selection_stays_in_bounds() {
        let mut list = list();
        list.move_selection(1);
        assert_eq!(selected_id(&list), Some("a"));
        list.move_selection(5);
        assert_eq!(selected_id(&list), Some("c"));
        list.move_selection(-1);
        assert_eq!(list.selected_index(), Some(1));
        list.move_selection(-10);
        assert_eq!(selected_id(&list), Some("a"));
    }
}
