//! Background request dispatcher
//!
//! A single named worker thread owns one [`InversionEngine`] and serves
//! requests strictly in arrival order. Callers block on [`Dispatcher::submit`]
//! until their reply arrives. The worker is idle while the queue is empty.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::admissibility::{AdmissibilityEngine, LedgerEntry};
use crate::config::EngineConfig;
use crate::inversion::{InversionEngine, InversionRecord};
use crate::parser::parse_source_with;
use crate::{Error, Result};

const WORKER_NAME: &str = "qgl-dispatcher";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    CheckAdmissibility { source: String },
    PerformInversion { source: String, boundary: String },
    GetLedger,
    GetHistory,
}

/// Programs are carried as canonical QGL text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Admissibility {
        admissible: bool,
        reason: String,
        program: String,
    },
    Inversion {
        success: bool,
        reason: String,
        original: String,
        program: String,
        inversion_count: usize,
    },
    Ledger { entries: Vec<LedgerEntry> },
    History { entries: Vec<InversionRecord> },
    Error { message: String },
}

/// Serve one request against `engine`
pub fn process(engine: &mut InversionEngine, config: &EngineConfig, request: Request) -> Response {
    match request {
        Request::CheckAdmissibility { source } => match parse_source_with(&source, &config.parser) {
            Ok(program) => {
                let verdict = engine.admissibility_mut().check(&program);
                Response::Admissibility {
                    admissible: verdict.admissible,
                    reason: verdict.reason,
                    program: program.to_string(),
                }
            }
            Err(e) => error_response(e),
        },
        Request::PerformInversion { source, boundary } => {
            match parse_source_with(&source, &config.parser) {
                Ok(program) => {
                    let original = program.to_string();
                    let outcome = engine.invert(program, &boundary);
                    Response::Inversion {
                        success: outcome.success,
                        reason: outcome.reason,
                        original,
                        program: outcome.program.to_string(),
                        inversion_count: engine.inversion_count(),
                    }
                }
                Err(e) => error_response(e),
            }
        }
        Request::GetLedger => Response::Ledger {
            entries: engine.admissibility().ledger(),
        },
        Request::GetHistory => Response::History {
            entries: engine.history(),
        },
    }
}

fn error_response(e: Error) -> Response {
    tracing::warn!(error = %e, "request failed");
    Response::Error {
        message: e.to_string(),
    }
}

struct Job {
    request: Request,
    reply: mpsc::Sender<Response>,
}

/// Handle to the worker thread
pub struct Dispatcher {
    queue: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the worker with a fresh engine built from `config`
    pub fn start(config: EngineConfig) -> Result<Self> {
        let (queue, jobs) = mpsc::channel::<Job>();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let mut engine = InversionEngine::new(AdmissibilityEngine::with_config(
                    config.admissibility.clone(),
                ));
                tracing::debug!("dispatcher worker started");
                for job in jobs {
                    let response = process(&mut engine, &config, job.request);
                    // The caller may have given up waiting
                    let _ = job.reply.send(response);
                }
                tracing::debug!("dispatcher worker stopped");
            })
            .map_err(|e| Error::Dispatch(format!("failed to spawn worker: {}", e)))?;

        Ok(Dispatcher {
            queue: Some(queue),
            worker: Some(worker),
        })
    }

    /// Queue a request and block until the worker answers
    pub fn submit(&self, request: Request) -> Result<Response> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| Error::Dispatch("dispatcher is stopped".into()))?;

        let (reply, response) = mpsc::channel();
        queue
            .send(Job { request, reply })
            .map_err(|_| Error::Dispatch("worker is not accepting requests".into()))?;
        response
            .recv()
            .map_err(|_| Error::Dispatch("worker exited before replying".into()))
    }

    pub fn is_running(&self) -> bool {
        self.queue.is_some()
    }

    /// Close the queue and wait for the worker to drain it
    pub fn stop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("dispatcher worker panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
