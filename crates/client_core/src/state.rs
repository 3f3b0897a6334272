//! Reducer owning the staged filter, the applied filter, the result set and
//! the detail dialog.
//!
//! Nothing here performs I/O. Intents mutate the state and hand back a ticket
//! describing the query that must be issued; the query's outcome is fed back
//! through [`DirectoryState::settle_list`] or [`DirectoryState::settle_detail`]
//! together with that ticket.

use serde_json::Value;
use shared::{
    domain::{EmployeeId, FilterCriteria, FilterField, ResultLimit},
    error::ApiError,
    protocol::{decode_employee_detail, normalize_employee_list, EmployeeDetail, EmployeeSummary},
};

use crate::settings::{FailureReporting, ResponseOrdering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Settled,
}

/// Monotonic sequence number stamped on every issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    fn bump(&mut self) -> Self {
        self.0 += 1;
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTicket {
    pub generation: Generation,
    pub filter: FilterCriteria,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub generation: Generation,
    pub employee_id: EmployeeId,
}

/// What happened to a query outcome fed back into the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    Failed(ApiError),
    /// A newer query superseded this one; its outcome was dropped.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListState {
    pub query: QueryState,
    pub loading: bool,
    pub results: Vec<EmployeeSummary>,
    /// Generation of the most recently issued list query.
    pub generation: Generation,
    pub in_flight: usize,
    pub last_error: Option<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModalState {
    pub open: bool,
    pub selected_employee_id: Option<EmployeeId>,
    pub detail: Option<EmployeeDetail>,
    pub loading: bool,
    pub query: QueryState,
    pub last_error: Option<ApiError>,
}

/// Read-only copy of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub staged: FilterCriteria,
    pub applied: FilterCriteria,
    pub limits: [ResultLimit; 4],
    pub list: ListState,
    pub modal: ModalState,
}

#[derive(Debug, Clone)]
pub struct DirectoryState {
    ordering: ResponseOrdering,
    reporting: FailureReporting,
    staged: FilterCriteria,
    applied: FilterCriteria,
    list: ListState,
    modal: ModalState,
    detail_generation: Generation,
}

impl DirectoryState {
    pub fn new(
        default_limit: ResultLimit,
        ordering: ResponseOrdering,
        reporting: FailureReporting,
    ) -> Self {
        let filter = FilterCriteria::with_limit(default_limit);
        Self {
            ordering,
            reporting,
            staged: filter.clone(),
            applied: filter,
            list: ListState::default(),
            modal: ModalState::default(),
            detail_generation: Generation::default(),
        }
    }

    pub fn staged(&self) -> &FilterCriteria {
        &self.staged
    }

    pub fn applied(&self) -> &FilterCriteria {
        &self.applied
    }

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            staged: self.staged.clone(),
            applied: self.applied.clone(),
            limits: ResultLimit::ALL,
            list: self.list.clone(),
            modal: self.modal.clone(),
        }
    }

    /// Records a keystroke in the staged filter. Never touches the applied
    /// filter and never issues a query.
    pub fn stage_edit(&mut self, field: FilterField, value: impl Into<String>) {
        self.staged.set_field(field, value);
    }

    /// Query for the filter in effect at startup.
    pub fn initial_query(&mut self) -> ListTicket {
        self.issue_list_query()
    }

    /// Limit changes skip staging: both filters take the new limit and a
    /// query is issued straight away.
    pub fn apply_limit(&mut self, limit: ResultLimit) -> ListTicket {
        self.applied.limit = limit;
        self.staged.limit = limit;
        self.issue_list_query()
    }

    /// Copies the staged text fields into the applied filter, keeping the
    /// applied limit, and issues a query.
    pub fn confirm_search(&mut self) -> ListTicket {
        self.applied.last_name = self.staged.last_name.clone();
        self.applied.first_name = self.staged.first_name.clone();
        self.issue_list_query()
    }

    fn issue_list_query(&mut self) -> ListTicket {
        let generation = self.list.generation.bump();
        self.list.loading = true;
        self.list.query = QueryState::Loading;
        self.list.in_flight += 1;
        ListTicket {
            generation,
            filter: self.applied.clone(),
        }
    }

    pub fn settle_list(
        &mut self,
        ticket: &ListTicket,
        outcome: Result<Value, ApiError>,
    ) -> Settlement {
        self.list.in_flight = self.list.in_flight.saturating_sub(1);

        if self.ordering == ResponseOrdering::LatestRequest
            && ticket.generation != self.list.generation
        {
            return Settlement::Discarded;
        }

        self.list.loading = false;
        self.list.query = QueryState::Settled;
        match outcome {
            Ok(payload) => {
                self.list.results = normalize_employee_list(payload);
                self.list.last_error = None;
                Settlement::Applied
            }
            Err(error) => {
                if self.reporting == FailureReporting::Surface {
                    self.list.last_error = Some(error.clone());
                }
                Settlement::Failed(error)
            }
        }
    }

    /// Opens the dialog in its loading state for `employee_id`, dropping any
    /// detail left from a previous selection.
    pub fn activate_row(&mut self, employee_id: EmployeeId) -> DetailTicket {
        let generation = self.detail_generation.bump();
        self.modal = ModalState {
            open: true,
            selected_employee_id: Some(employee_id.clone()),
            detail: None,
            loading: true,
            query: QueryState::Loading,
            last_error: None,
        };
        DetailTicket {
            generation,
            employee_id,
        }
    }

    /// Activates the result row at zero-based `index`. A row past the end of
    /// the result set, or one without an id, leaves the dialog untouched.
    pub fn activate_result_row(&mut self, index: usize) -> Option<DetailTicket> {
        let employee_id = self.list.results.get(index)?.id.clone()?;
        Some(self.activate_row(employee_id))
    }

    /// With [`ResponseOrdering::LastResponse`] this only hides the dialog and
    /// a pending response still lands in `detail`. Otherwise the dialog is
    /// cleared and any pending response is invalidated.
    pub fn close_modal(&mut self) {
        match self.ordering {
            ResponseOrdering::LastResponse => self.modal.open = false,
            ResponseOrdering::LatestRequest => {
                self.detail_generation.bump();
                self.modal = ModalState::default();
            }
        }
    }

    pub fn settle_detail(
        &mut self,
        ticket: &DetailTicket,
        outcome: Result<Value, ApiError>,
    ) -> Settlement {
        if self.ordering == ResponseOrdering::LatestRequest
            && ticket.generation != self.detail_generation
        {
            return Settlement::Discarded;
        }

        self.modal.loading = false;
        self.modal.query = QueryState::Settled;
        let decoded =
            outcome.and_then(|payload| decode_employee_detail(payload).map_err(ApiError::from));
        match decoded {
            Ok(detail) => {
                self.modal.detail = Some(detail);
                self.modal.last_error = None;
                Settlement::Applied
            }
            Err(error) => {
                if self.reporting == FailureReporting::Surface {
                    self.modal.last_error = Some(error.clone());
                }
                Settlement::Failed(error)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
