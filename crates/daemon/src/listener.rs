// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! them without blocking the rest of the daemon. One request per
//! connection; `JobWatch` answers with a stream of snapshot frames.

use std::sync::Arc;
use std::time::{Duration, Instant};

use isk_core::{JobId, JobSnapshot};
use isk_pool::{Engine, WorkerPool};
use isk_service::{JobRegistry, TranslationHandler};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Poll cadence for job watch streams.
const WATCH_POLL: Duration = Duration::from_millis(200);

/// Shared state for connection handling.
pub struct ListenCtx {
    pub handler: Arc<TranslationHandler>,
    pub registry: Arc<JobRegistry>,
    pub pool: Arc<WorkerPool>,
    pub engine: Engine,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ctx).await {
                            match e {
                                ConnectionError::Protocol(protocol::ProtocolError::Closed) => {
                                    debug!("client disconnected")
                                }
                                ConnectionError::Protocol(protocol::ProtocolError::TimedOut) => {
                                    warn!("connection timeout")
                                }
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
pub async fn handle_connection(
    stream: UnixStream,
    ctx: Arc<ListenCtx>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Status polls are frequent; log them quieter.
    if matches!(request, Request::Status | Request::Ping | Request::JobStatus { .. }) {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    if let Request::JobWatch { job_id } = request {
        return watch_job(&job_id, &ctx, &mut writer).await;
    }

    let response = handle_request(request, &ctx).await;
    debug!(response = ?response, "sending response");
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Stream job snapshots on every observed change; a terminal snapshot is
/// the last frame.
async fn watch_job<W: tokio::io::AsyncWriteExt + Unpin>(
    job_id: &str,
    ctx: &ListenCtx,
    writer: &mut W,
) -> Result<(), ConnectionError> {
    let id = JobId::new(job_id);
    let mut last: Option<JobSnapshot> = None;

    loop {
        let Some(snapshot) = ctx.handler.job_status(&id) else {
            let response = Response::Error {
                message: format!("job not found: {}", job_id),
            };
            protocol::write_response(writer, &response, DEFAULT_TIMEOUT).await?;
            return Ok(());
        };

        if last.as_ref() != Some(&snapshot) {
            let terminal = snapshot.status.is_terminal();
            let response = Response::Job {
                snapshot: snapshot.clone(),
            };
            protocol::write_response(writer, &response, DEFAULT_TIMEOUT).await?;
            last = Some(snapshot);
            if terminal {
                return Ok(());
            }
        }

        tokio::time::sleep(WATCH_POLL).await;
    }
}

/// Handle a single request and build its response. Translator-level
/// failures are already folded into responses by the handler; errors here
/// are validation and lookup failures.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => {
            let stats = ctx.pool.stats();
            Response::Status {
                version: PROTOCOL_VERSION.to_string(),
                engine: ctx.engine.to_string(),
                uptime_secs: ctx.start_time.elapsed().as_secs(),
                total_workers: stats.total,
                active_workers: stats.active,
                busy_workers: stats.busy,
                jobs: ctx.registry.len(),
                clients: ctx.handler.clients().len(),
            }
        }

        Request::Translate { request } => match ctx.handler.translate(request).await {
            Ok(response) => Response::Translate { response },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Submit { request } => match ctx.handler.submit(request) {
            Ok(job_id) => Response::JobCreated {
                job_id: job_id.to_string(),
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::JobStatus { job_id } => match ctx.handler.job_status(&JobId::new(&*job_id)) {
            Some(snapshot) => Response::Job { snapshot },
            None => Response::Error {
                message: format!("job not found: {}", job_id),
            },
        },

        Request::CheckTitle {
            title,
            source_language,
            language_tag,
        } => match ctx
            .handler
            .check_title(&title, &source_language, &language_tag)
            .await
        {
            Ok(check) => Response::TitleCheck { check },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::RegisterClient {
            client_name,
            client_version,
            namespace,
            metadata,
        } => match ctx
            .handler
            .register_client(&client_name, &client_version, &namespace, metadata)
        {
            Ok(registration) => Response::Registered { registration },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Heartbeat {
            client_id,
            client_name,
        } => match ctx.handler.heartbeat(&client_id, &client_name) {
            Ok(outcome) => Response::Heartbeat { outcome },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Metrics => Response::Metrics {
            text: ctx.pool.metrics().export(),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        // Handled before dispatch; a watch never reaches here.
        Request::JobWatch { job_id } => Response::Error {
            message: format!("job watch must be the only request on its connection: {}", job_id),
        },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
