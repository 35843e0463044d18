//! Bridge between the single-threaded UI state and the async user service.
//!
//! The UI produces `Request`s; the `Dispatcher` runs each one on the tokio
//! runtime and sends the outcome back as an `ApiEvent` over a channel that
//! the event loop drains between frames. Every request carries the `Ticket`
//! it was issued under so late replies can be recognised.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::api::{NewUser, Role, User, UserService, UserUpdate};
use crate::error::ApiError;

/// Identity of an issued request. Tickets are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// A single call against the user service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    ListAll,
    FindById(u64),
    FindByRole(Role),
    Create(NewUser),
    Update(UserUpdate),
    DeleteById(u64),
}

/// Outcome of an `ApiCall`, one variant per call.
#[derive(Debug)]
pub enum ApiReply {
    Listed(Result<Vec<User>, ApiError>),
    Found(Result<User, ApiError>),
    RoleMembers {
        role: Role,
        result: Result<Vec<String>, ApiError>,
    },
    Created(Result<(), ApiError>),
    Updated(Result<(), ApiError>),
    Deleted {
        id: u64,
        result: Result<(), ApiError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub ticket: Ticket,
    pub call: ApiCall,
}

#[derive(Debug)]
pub struct ApiEvent {
    pub ticket: Ticket,
    pub reply: ApiReply,
}

/// Run one call to completion. No retry.
pub async fn execute(service: &dyn UserService, call: ApiCall) -> ApiReply {
    match call {
        ApiCall::ListAll => ApiReply::Listed(service.list_all().await),
        ApiCall::FindById(id) => ApiReply::Found(service.find_by_id(id).await),
        ApiCall::FindByRole(role) => {
            let result = service.find_by_role(&role).await;
            ApiReply::RoleMembers { role, result }
        }
        ApiCall::Create(user) => ApiReply::Created(service.create(&user).await),
        ApiCall::Update(update) => ApiReply::Updated(service.update(&update).await),
        ApiCall::DeleteById(id) => ApiReply::Deleted {
            id,
            result: service.delete_by_id(id).await,
        },
    }
}

/// Spawns requests on a runtime and reports their outcomes on a channel.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn UserService>,
    handle: Handle,
    tx: UnboundedSender<ApiEvent>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn UserService>, handle: Handle) -> (Self, UnboundedReceiver<ApiEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { service, handle, tx }, rx)
    }

    /// Fire and forget; requests are not cancellable once issued.
    pub fn dispatch(&self, request: Request) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        tracing::debug!(ticket = request.ticket.0, call = ?request.call, "dispatching");
        self.handle.spawn(async move {
            let reply = execute(service.as_ref(), request.call).await;
            if tx
                .send(ApiEvent {
                    ticket: request.ticket,
                    reply,
                })
                .is_err()
            {
                tracing::debug!(ticket = request.ticket.0, "reply dropped: event loop gone");
            }
        });
    }
}
