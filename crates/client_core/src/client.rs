use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{EmployeeId, FilterCriteria, FilterField, ResultLimit},
    error::{ApiError, ApiException, ErrorCode},
};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    Mutex,
};
use tracing::{debug, info, warn};

use crate::{
    settings::{ClientSettings, FailureReporting},
    state::{
        DetailTicket, DirectorySnapshot, DirectoryState, Generation, ListTicket, Settlement,
    },
    transport::DirectoryService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    List,
    Detail,
}

/// Notifications for the presentation layer. Each one follows a state
/// change; the current state is always available through `snapshot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    StagedFilterChanged {
        filter: FilterCriteria,
    },
    AppliedFilterChanged {
        generation: Generation,
        filter: FilterCriteria,
    },
    ListSettled {
        generation: Generation,
        settlement: Settlement,
        results: usize,
    },
    ModalOpened {
        generation: Generation,
        employee_id: EmployeeId,
    },
    DetailSettled {
        generation: Generation,
        employee_id: EmployeeId,
        settlement: Settlement,
    },
    ModalClosed,
    QueryFailed {
        query: QueryKind,
        error: ApiError,
    },
}

#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    async fn start(&self) -> Option<ListTicket>;
    async fn stage_edit(&self, field: FilterField, value: &str);
    async fn apply_limit(&self, limit: ResultLimit) -> ListTicket;
    async fn confirm_search(&self) -> ListTicket;
    async fn activate_row(&self, employee_id: EmployeeId) -> DetailTicket;
    async fn activate_result_row(&self, index: usize) -> Option<DetailTicket>;
    async fn close_modal(&self);
    async fn snapshot(&self) -> DirectorySnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<DirectoryEvent>;
}

pub struct DirectoryClient {
    service: Arc<dyn DirectoryService>,
    reporting: FailureReporting,
    inner: Mutex<DirectoryClientState>,
    events: broadcast::Sender<DirectoryEvent>,
}

struct DirectoryClientState {
    started: bool,
    directory: DirectoryState,
}

impl DirectoryClient {
    pub fn new(service: Arc<dyn DirectoryService>, settings: &ClientSettings) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            reporting: settings.failure_reporting,
            inner: Mutex::new(DirectoryClientState {
                started: false,
                directory: DirectoryState::new(
                    settings.default_limit,
                    settings.response_ordering,
                    settings.failure_reporting,
                ),
            }),
            events,
        })
    }

    /// Issues the query for the default filter. Only the first call does
    /// anything.
    pub async fn start(self: &Arc<Self>) -> Option<ListTicket> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            if guard.started {
                return None;
            }
            guard.started = true;
            let ticket = guard.directory.initial_query();
            self.publish_applied(&ticket);
            ticket
        };
        self.spawn_list_query(ticket.clone());
        Some(ticket)
    }

    pub async fn stage_edit(&self, field: FilterField, value: &str) {
        let mut guard = self.inner.lock().await;
        guard.directory.stage_edit(field, value);
        debug!(?field, value, "directory: staged filter edit");
        self.emit(DirectoryEvent::StagedFilterChanged {
            filter: guard.directory.staged().clone(),
        });
    }

    pub async fn apply_limit(self: &Arc<Self>, limit: ResultLimit) -> ListTicket {
        let ticket = {
            let mut guard = self.inner.lock().await;
            let ticket = guard.directory.apply_limit(limit);
            self.publish_applied(&ticket);
            ticket
        };
        self.spawn_list_query(ticket.clone());
        ticket
    }

    pub async fn confirm_search(self: &Arc<Self>) -> ListTicket {
        let ticket = {
            let mut guard = self.inner.lock().await;
            let ticket = guard.directory.confirm_search();
            self.publish_applied(&ticket);
            ticket
        };
        self.spawn_list_query(ticket.clone());
        ticket
    }

    pub async fn activate_row(self: &Arc<Self>, employee_id: EmployeeId) -> DetailTicket {
        let ticket = {
            let mut guard = self.inner.lock().await;
            let ticket = guard.directory.activate_row(employee_id);
            self.announce_detail(&ticket);
            ticket
        };
        self.spawn_detail_query(ticket.clone());
        ticket
    }

    /// Row activation from the result table by zero-based index. Rows that
    /// carry no employee id cannot be looked up and are ignored.
    pub async fn activate_result_row(self: &Arc<Self>, index: usize) -> Option<DetailTicket> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            let Some(ticket) = guard.directory.activate_result_row(index) else {
                warn!(
                    index,
                    results = guard.directory.list().results.len(),
                    "directory: row has no employee id or is out of range; not opening details"
                );
                return None;
            };
            self.announce_detail(&ticket);
            ticket
        };
        self.spawn_detail_query(ticket.clone());
        Some(ticket)
    }

    pub async fn close_modal(&self) {
        let mut guard = self.inner.lock().await;
        guard.directory.close_modal();
        debug!("directory: detail dialog closed");
        self.emit(DirectoryEvent::ModalClosed);
    }

    pub async fn snapshot(&self) -> DirectorySnapshot {
        self.inner.lock().await.directory.snapshot()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DirectoryEvent) {
        // No subscribers is fine; the state is still readable via snapshot.
        let _ = self.events.send(event);
    }

    fn publish_applied(&self, ticket: &ListTicket) {
        info!(
            generation = ticket.generation.0,
            limit = ticket.filter.limit.value(),
            last_name = %ticket.filter.last_name,
            first_name = %ticket.filter.first_name,
            "directory: querying employee list"
        );
        self.emit(DirectoryEvent::AppliedFilterChanged {
            generation: ticket.generation,
            filter: ticket.filter.clone(),
        });
    }

    fn announce_detail(&self, ticket: &DetailTicket) {
        info!(
            generation = ticket.generation.0,
            employee_id = %ticket.employee_id,
            "directory: fetching employee detail"
        );
        self.emit(DirectoryEvent::ModalOpened {
            generation: ticket.generation,
            employee_id: ticket.employee_id.clone(),
        });
    }

    fn spawn_list_query(self: &Arc<Self>, ticket: ListTicket) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = client
                .service
                .list_employees(&ticket.filter)
                .await
                .map_err(|err| classify_failure(&err));
            client.finish_list_query(&ticket, outcome).await;
        });
    }

    fn spawn_detail_query(self: &Arc<Self>, ticket: DetailTicket) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = client
                .service
                .employee_detail(&ticket.employee_id)
                .await
                .map_err(|err| classify_failure(&err));
            client.finish_detail_query(&ticket, outcome).await;
        });
    }

    async fn finish_list_query(
        &self,
        ticket: &ListTicket,
        outcome: std::result::Result<serde_json::Value, ApiError>,
    ) {
        let mut guard = self.inner.lock().await;
        let settlement = guard.directory.settle_list(ticket, outcome);
        let results = guard.directory.list().results.len();
        match &settlement {
            Settlement::Applied => info!(
                generation = ticket.generation.0,
                results, "directory: employee list settled"
            ),
            Settlement::Failed(error) => {
                warn!(
                    generation = ticket.generation.0,
                    code = ?error.code,
                    error = %error.message,
                    "directory: employee list query failed"
                );
                self.report_failure(QueryKind::List, error);
            }
            Settlement::Discarded => warn!(
                generation = ticket.generation.0,
                latest = guard.directory.list().generation.0,
                "directory: discarding superseded employee list response"
            ),
        }
        self.emit(DirectoryEvent::ListSettled {
            generation: ticket.generation,
            settlement,
            results,
        });
    }

    async fn finish_detail_query(
        &self,
        ticket: &DetailTicket,
        outcome: std::result::Result<serde_json::Value, ApiError>,
    ) {
        let mut guard = self.inner.lock().await;
        let settlement = guard.directory.settle_detail(ticket, outcome);
        match &settlement {
            Settlement::Applied => info!(
                generation = ticket.generation.0,
                employee_id = %ticket.employee_id,
                "directory: employee detail settled"
            ),
            Settlement::Failed(error) => {
                warn!(
                    generation = ticket.generation.0,
                    employee_id = %ticket.employee_id,
                    code = ?error.code,
                    error = %error.message,
                    "directory: employee detail query failed"
                );
                self.report_failure(QueryKind::Detail, error);
            }
            Settlement::Discarded => warn!(
                generation = ticket.generation.0,
                employee_id = %ticket.employee_id,
                "directory: discarding stale employee detail response"
            ),
        }
        self.emit(DirectoryEvent::DetailSettled {
            generation: ticket.generation,
            employee_id: ticket.employee_id.clone(),
            settlement,
        });
    }

    fn report_failure(&self, query: QueryKind, error: &ApiError) {
        if self.reporting == FailureReporting::Surface {
            self.emit(DirectoryEvent::QueryFailed {
                query,
                error: error.clone(),
            });
        }
    }
}

#[async_trait]
impl DirectoryHandle for Arc<DirectoryClient> {
    async fn start(&self) -> Option<ListTicket> {
        DirectoryClient::start(self).await
    }

    async fn stage_edit(&self, field: FilterField, value: &str) {
        DirectoryClient::stage_edit(self, field, value).await
    }

    async fn apply_limit(&self, limit: ResultLimit) -> ListTicket {
        DirectoryClient::apply_limit(self, limit).await
    }

    async fn confirm_search(&self) -> ListTicket {
        DirectoryClient::confirm_search(self).await
    }

    async fn activate_row(&self, employee_id: EmployeeId) -> DetailTicket {
        DirectoryClient::activate_row(self, employee_id).await
    }

    async fn activate_result_row(&self, index: usize) -> Option<DetailTicket> {
        DirectoryClient::activate_result_row(self, index).await
    }

    async fn close_modal(&self) {
        DirectoryClient::close_modal(self).await
    }

    async fn snapshot(&self) -> DirectorySnapshot {
        DirectoryClient::snapshot(self).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<DirectoryEvent> {
        DirectoryClient::subscribe_events(self)
    }
}

/// Maps a failed service call onto the two failure kinds the client knows.
pub fn classify_failure(err: &anyhow::Error) -> ApiError {
    match err.downcast_ref::<ApiException>() {
        Some(api) => ApiError::new(api.code, format!("{err:#}")),
        None => ApiError::new(ErrorCode::Transport, format!("{err:#}")),
    }
}

/// Waits for the list query with `generation` to settle, returning how it
/// settled.
pub async fn wait_for_list(
    events: &mut broadcast::Receiver<DirectoryEvent>,
    generation: Generation,
) -> Result<Settlement> {
    loop {
        match events.recv().await {
            Ok(DirectoryEvent::ListSettled {
                generation: settled,
                settlement,
                ..
            }) if settled == generation => return Ok(settlement),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(closed @ RecvError::Closed) => return Err(closed.into()),
        }
    }
}

/// Waits for the detail query with `generation` to settle.
pub async fn wait_for_detail(
    events: &mut broadcast::Receiver<DirectoryEvent>,
    generation: Generation,
) -> Result<Settlement> {
    loop {
        match events.recv().await {
            Ok(DirectoryEvent::DetailSettled {
                generation: settled,
                settlement,
                ..
            }) if settled == generation => return Ok(settlement),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(closed @ RecvError::Closed) => return Err(closed.into()),
        }
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
