//! IPC message dispatch

use chrono::{DateTime, Utc};
use rollcall_api::{
    API_VERSION, Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Request,
    Response, ResponsePayload,
};
use rollcall_core::{AdmissionEngine, AdmissionError, CoreEvent};
use rollcall_ipc::{IpcServer, ServerMessage};
use rollcall_store::{AuditEvent, AuditEventType, Session, Store};
use rollcall_util::ClientId;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Handle one message from the IPC layer.
///
/// Requests run on the blocking pool, so a slow store call never holds up
/// the accept loop or other clients.
pub async fn handle_message(
    engine: &Arc<AdmissionEngine>,
    ipc: &Arc<IpcServer>,
    store: &Arc<dyn Store>,
    msg: ServerMessage,
) {
    match msg {
        ServerMessage::Request { client_id, request } => {
            let engine = engine.clone();
            let ipc = ipc.clone();

            tokio::spawn(async move {
                let request_id = request.request_id;
                let worker = engine.clone();
                let response = match tokio::task::spawn_blocking(move || {
                    handle_request(&worker, client_id, request, rollcall_util::now())
                })
                .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        error!(error = %e, request_id, "Request handler panicked");
                        Response::error(
                            request_id,
                            ErrorInfo::new(ErrorCode::InternalError, "Internal error"),
                        )
                    }
                };

                if let Err(e) = ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Could not deliver response");
                }

                broadcast_events(&engine, &ipc);
            });
        }

        ServerMessage::ClientConnected { client_id, info } => {
            info!(client_id = %client_id, uid = ?info.uid, "Client registered");
            append_audit(
                store,
                AuditEventType::ClientConnected {
                    client_id: client_id.to_string(),
                    uid: info.uid,
                },
            );
        }

        ServerMessage::ClientDisconnected { client_id } => {
            debug!(client_id = %client_id, "Client disconnected");
            append_audit(
                store,
                AuditEventType::ClientDisconnected {
                    client_id: client_id.to_string(),
                },
            );
        }
    }
}

/// Push any queued core events to subscribed clients
pub fn broadcast_events(engine: &AdmissionEngine, ipc: &IpcServer) {
    for event in engine.drain_events() {
        ipc.broadcast_event(Event::new(event_payload(event)));
    }
}

/// Answer one request. Blocking; call from the blocking pool.
pub fn handle_request(
    engine: &AdmissionEngine,
    client_id: ClientId,
    request: Request,
    now: DateTime<Utc>,
) -> Response {
    let request_id = request.request_id;

    if request.api_version != API_VERSION {
        return Response::error(
            request_id,
            ErrorInfo::new(
                ErrorCode::InvalidRequest,
                format!(
                    "Unsupported API version {} (expected {})",
                    request.api_version, API_VERSION
                ),
            ),
        );
    }

    match handle_command(engine, client_id, request.command, now) {
        Ok(payload) => Response::success(request_id, payload),
        Err(e) => {
            match &e {
                AdmissionError::TransientStoreError(source) => {
                    error!(request_id, error = %source, "Store failure while handling request");
                }
                other => debug!(request_id, error = %other, "Request refused"),
            }
            Response::error(request_id, e.to_error_info())
        }
    }
}

/// Map a command onto the engine
pub fn handle_command(
    engine: &AdmissionEngine,
    client_id: ClientId,
    command: Command,
    now: DateTime<Utc>,
) -> Result<ResponsePayload, AdmissionError> {
    let registry = engine.registry();

    let payload = match command {
        Command::CreateSession { owner, session } => {
            let session = registry.create(session, &owner, now)?;
            ResponsePayload::Session(session.to_view())
        }

        Command::GetSession { session_id, owner } => {
            ResponsePayload::Session(registry.lookup_owned(&session_id, &owner)?.to_view())
        }

        Command::ListSessions { owner } => ResponsePayload::Sessions {
            sessions: registry
                .list_for_owner(&owner)?
                .iter()
                .map(Session::to_view)
                .collect(),
        },

        Command::GetLiveToken { session_id, owner } => {
            let token = registry.live_token(&session_id, &owner, now)?;
            ResponsePayload::Token(token.to_view(session_id))
        }

        Command::RotateToken { session_id, owner } => {
            let token = registry.rotate(&session_id, &owner, now)?;
            ResponsePayload::Token(token.to_view(session_id))
        }

        Command::SetSessionActive {
            session_id,
            owner,
            active,
        } => {
            let session = registry.set_active(&session_id, &owner, active, now)?;
            ResponsePayload::ActiveChanged {
                session_id,
                is_active: session.is_active,
            }
        }

        Command::UpdateSessionWindow {
            session_id,
            owner,
            update,
        } => {
            let session = registry.update_window(&session_id, &owner, update, now)?;
            ResponsePayload::Session(session.to_view())
        }

        Command::DeleteSession { session_id, owner } => {
            registry.archive(&session_id, &owner, now)?;
            ResponsePayload::Deleted { session_id }
        }

        Command::SubmitAttempt(attempt) => ResponsePayload::Submitted(engine.submit(&attempt, now)?),

        Command::GetAttendanceForSession { session_id, owner } => {
            ResponsePayload::SessionAttendance {
                records: engine.attendance_for_session(&session_id, &owner)?,
            }
        }

        Command::GetAttendanceForStudent { student_id } => {
            let history = engine.attendance_for_student(&student_id)?;
            ResponsePayload::StudentAttendance {
                records: history.records,
                stats: history.stats,
            }
        }

        Command::GetDeviceCollisions { session_id, owner } => ResponsePayload::DeviceCollisions {
            collisions: engine.device_collisions(&session_id, &owner)?,
        },

        // The IPC layer already flipped the subscription flag
        Command::SubscribeEvents => ResponsePayload::Subscribed { client_id },
        Command::UnsubscribeEvents => ResponsePayload::Unsubscribed,

        Command::GetHealth => ResponsePayload::Health(HealthStatus {
            live: true,
            store_healthy: engine.is_healthy(),
        }),

        Command::Ping => ResponsePayload::Pong,
    };

    Ok(payload)
}

/// Wire form of a core event
pub fn event_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::SessionCreated {
            session_id,
            course_name,
        } => EventPayload::SessionCreated {
            session_id,
            course_name,
        },
        CoreEvent::TokenRotated {
            session_id,
            expires_at,
            lazy,
        } => EventPayload::TokenRotated {
            session_id,
            expires_at,
            lazy,
        },
        CoreEvent::SessionActiveChanged {
            session_id,
            is_active,
        } => EventPayload::SessionActiveChanged {
            session_id,
            is_active,
        },
        CoreEvent::SessionUpdated { session_id } => EventPayload::SessionUpdated { session_id },
        CoreEvent::SessionArchived { session_id } => EventPayload::SessionArchived { session_id },
        CoreEvent::AttendanceRecorded {
            session_id,
            student_id,
            status,
        } => EventPayload::AttendanceRecorded {
            session_id,
            student_id,
            status,
        },
    }
}

pub fn append_audit(store: &Arc<dyn Store>, event: AuditEventType) {
    if let Err(e) = store.append_audit(AuditEvent::new(event)) {
        warn!(error = %e, "Failed to append audit event");
    }
}
