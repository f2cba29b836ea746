//! Per-connection session handler.
//!
//! A session owns at most one environment and drives it through the
//! reset -> step -> ... -> done lifecycle:
//!
//! ```text
//!               reset                 step (done=false)
//! Uninitialized ------> Ready <-----------------------+
//!                         |  ^                        |
//!      step (done=true)   |  | reset                  |
//!                         v  |                        |
//!                       Finished ---------------------+ (step rejected)
//! ```
//!
//! Commands are handled strictly one at a time: read, run the engine, write
//! exactly one reply. The first error is reported with a single `error`
//! message (when the connection can still carry one) and ends the session.
//! The environment is closed exactly once, on the way out of
//! [`Session::handle`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

use crate::core::{filter_env, Env, EnvError, EnvFactory};
use crate::observation::{self, EncodeError};
use crate::protocol::{parse_message, Command, ServerMessage};
use crate::types::{Action, EnvSpec, EventFilter, DEFAULT_FRAME_MS};
use crate::wire_log::{Direction, WireLog};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("reset: cannot step without a reset")]
    ResetRequired,

    #[error("invalid message type: {0}")]
    InvalidMessageType(String),

    #[error("{context}: {source}")]
    Env {
        context: &'static str,
        #[source]
        source: EnvError,
    },

    #[error("{context}: {source}")]
    Encode {
        context: &'static str,
        #[source]
        source: EncodeError,
    },

    #[error("engine task failed: {0}")]
    EngineTask(String),

    #[error("connection: {0}")]
    Transport(#[from] WsError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl SessionError {
    fn env(context: &'static str, source: EnvError) -> Self {
        SessionError::Env { context, source }
    }

    /// Whether the peer should be told about this error. Transport and
    /// decoding failures end the session silently.
    pub fn reportable(&self) -> bool {
        !matches!(
            self,
            SessionError::Transport(_) | SessionError::Json(_) | SessionError::Utf8(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Finished,
}

/// Per-session settings taken from the server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Simulated time each step advances the environment by.
    pub frame_time: Duration,
    pub filter: EventFilter,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_time: Duration::from_millis(DEFAULT_FRAME_MS),
            filter: EventFilter::NoFilter,
        }
    }
}

pub struct Session {
    id: usize,
    spec: EnvSpec,
    factory: Arc<dyn EnvFactory>,
    config: SessionConfig,
    env: Option<Box<dyn Env>>,
    done: bool,
    wire_log: Option<WireLog>,
}

impl Session {
    pub fn new(
        id: usize,
        spec: EnvSpec,
        factory: Arc<dyn EnvFactory>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id,
            spec,
            factory,
            config,
            env: None,
            done: false,
            wire_log: None,
        }
    }

    pub fn with_wire_log(mut self, wire_log: Option<WireLog>) -> Self {
        self.wire_log = wire_log;
        self
    }

    pub fn state(&self) -> SessionState {
        match (&self.env, self.done) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), false) => SessionState::Ready,
            (Some(_), true) => SessionState::Finished,
        }
    }

    /// Serve commands from `ws` until the peer disconnects or the first
    /// error. Consumes the session; the environment is closed before this
    /// returns.
    pub async fn handle<T>(mut self, mut ws: T) -> Result<(), SessionError>
    where
        T: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
    {
        let result = self.serve(&mut ws).await;

        let report = match &result {
            Err(e) if e.reportable() => Some(ServerMessage::error(e.to_string())),
            _ => None,
        };
        if let Some(msg) = report {
            if let Err(send_err) = self.send(&mut ws, &msg).await {
                debug!(session = self.id, "could not report error: {}", send_err);
            }
        }

        self.release().await;
        let _ = ws.close().await;
        result
    }

    async fn serve<T>(&mut self, ws: &mut T) -> Result<(), SessionError>
    where
        T: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
    {
        loop {
            let Some(text) = self.read_text(ws).await? else {
                return Ok(());
            };
            let reply = match parse_message(&text)? {
                Command::Reset => self.reset().await?,
                Command::Step(actions) => self.step(actions).await?,
                Command::Unknown(msg_type) => {
                    return Err(SessionError::InvalidMessageType(msg_type))
                }
            };
            self.send(ws, &reply).await?;
        }
    }

    /// Next text payload, or `None` once the peer closed the connection.
    async fn read_text<T>(&mut self, ws: &mut T) -> Result<Option<String>, SessionError>
    where
        T: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            let text = match ws.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes)?,
                Some(Ok(_)) => continue,
            };
            if let Some(log) = &self.wire_log {
                log.record(self.id, Direction::Inbound, &text);
            }
            return Ok(Some(text));
        }
    }

    async fn send<T>(&mut self, ws: &mut T, msg: &ServerMessage) -> Result<(), SessionError>
    where
        T: Sink<Message, Error = WsError> + Unpin,
    {
        let text = serde_json::to_string(msg)?;
        if let Some(log) = &self.wire_log {
            log.record(self.id, Direction::Outbound, &text);
        }
        ws.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn reset(&mut self) -> Result<ServerMessage, SessionError> {
        debug!(session = self.id, env = %self.spec.name, "reset");
        if self.env.is_none() {
            let factory = Arc::clone(&self.factory);
            let spec = self.spec.clone();
            let filter = self.config.filter;
            let env = tokio::task::spawn_blocking(move || {
                factory.create(&spec).map(|env| filter_env(env, filter))
            })
            .await
            .map_err(|e| SessionError::EngineTask(e.to_string()))?
            .map_err(|e| SessionError::env("reset", e))?;
            self.env = Some(env);
        }

        let observation = self
            .with_env(|env| {
                env.reset().map_err(|e| SessionError::env("reset", e))?;
                observe_encoded(env, "reset")
            })
            .await?;
        self.done = false;
        Ok(ServerMessage::reset(observation))
    }

    async fn step(&mut self, actions: Vec<Action>) -> Result<ServerMessage, SessionError> {
        if self.state() != SessionState::Ready {
            return Err(SessionError::ResetRequired);
        }
        debug!(session = self.id, events = actions.len(), "step");

        let frame_time = self.config.frame_time;
        let (result, observation) = self
            .with_env(move |env| {
                let result = env
                    .step(frame_time, &actions)
                    .map_err(|e| SessionError::env("step", e))?;
                let observation = observe_encoded(env, "step")?;
                Ok((result, observation))
            })
            .await?;

        if result.done {
            self.done = true;
        }
        Ok(ServerMessage::step(observation, result.reward, result.done))
    }

    /// Run `f` against the environment on the blocking pool. The environment
    /// moves to the worker thread and comes back with the result, even when
    /// the engine panics, so `release` still closes it.
    async fn with_env<R, F>(&mut self, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut dyn Env) -> Result<R, SessionError> + Send + 'static,
        R: Send + 'static,
    {
        let mut env = self.env.take().ok_or(SessionError::ResetRequired)?;
        let (env, result) = tokio::task::spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(env.as_mut())))
                .unwrap_or_else(|payload| {
                    Err(SessionError::EngineTask(panic_message(&*payload)))
                });
            (env, result)
        })
        .await
        .map_err(|e| SessionError::EngineTask(e.to_string()))?;
        self.env = Some(env);
        result
    }

    async fn release(&mut self) {
        let Some(mut env) = self.env.take() else {
            return;
        };
        match tokio::task::spawn_blocking(move || env.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(session = self.id, "close environment: {}", e),
            Err(e) => warn!(session = self.id, "close environment: {}", e),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("engine panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("engine panicked: {}", msg)
    } else {
        "engine panicked".to_string()
    }
}

fn observe_encoded(env: &mut dyn Env, context: &'static str) -> Result<String, SessionError> {
    let frame = env.observe().map_err(|e| SessionError::env(context, e))?;
    observation::encode(&frame).map_err(|source| SessionError::Encode { context, source })
}
