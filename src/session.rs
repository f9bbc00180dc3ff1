//! Session state and the boundary to the user interface.
//!
//! A `Session` owns one connection manager, one chat log and one pipeline.
//! Front ends feed it `Event`s and receive output through a `Renderer`.

use tracing::{error, info};

use crate::chat::{ChatRole, ChatSession};
use crate::connection::{ConnectionDescriptor, ConnectionManager};
use crate::error::{ChatDbError, Result};
use crate::pipeline::QueryPipeline;

/// Shown when a question arrives before any database is connected.
pub const CONNECT_FIRST: &str = "Please connect to the database first.";

/// Outcome class of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

/// User action delivered by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A natural-language question.
    Question(String),
    /// Connect using a full connection URL.
    ConnectUrl(String),
    /// Connect using discrete fields.
    ConnectFields(ConnectionDescriptor),
}

/// Output sink implemented by front ends.
pub trait Renderer {
    /// Shows a chat message.
    fn display_message(&mut self, role: ChatRole, text: &str);

    /// Shows a one-line status.
    fn display_status(&mut self, status: Status, text: &str);
}

/// One interactive user's state.
pub struct Session {
    manager: ConnectionManager,
    chat: ChatSession,
    pipeline: QueryPipeline,
}

impl Session {
    /// Creates a session with an empty chat log.
    pub fn new(manager: ConnectionManager, pipeline: QueryPipeline) -> Self {
        Self {
            manager,
            chat: ChatSession::new(),
            pipeline,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }

    /// Handles one event to completion.
    ///
    /// Connection failures are reported through the renderer. Failures while
    /// answering a question are returned; the user turn stays in the log
    /// without an assistant reply.
    pub async fn handle_event(&mut self, event: Event, renderer: &mut dyn Renderer) -> Result<()> {
        match event {
            Event::Question(question) => self.handle_question(&question, renderer).await,
            Event::ConnectUrl(url) => {
                self.handle_connect_url(&url, renderer).await;
                Ok(())
            }
            Event::ConnectFields(descriptor) => {
                self.handle_connect_fields(descriptor, renderer).await;
                Ok(())
            }
        }
    }

    async fn handle_question(&mut self, question: &str, renderer: &mut dyn Renderer) -> Result<()> {
        if !self.manager.is_connected() {
            renderer.display_status(Status::Error, CONNECT_FIRST);
            return Ok(());
        }

        self.chat.append(ChatRole::User, question);
        renderer.display_message(ChatRole::User, question);

        let answer = self.pipeline.ask(&self.manager, question).await?;

        self.chat.append(ChatRole::Assistant, answer.as_str());
        renderer.display_message(ChatRole::Assistant, &answer);
        Ok(())
    }

    async fn handle_connect_url(&mut self, url: &str, renderer: &mut dyn Renderer) {
        match self.manager.connect_from_url(url).await {
            Ok(_) => renderer.display_status(Status::Success, "Connected successfully via URL"),
            Err(e) => {
                error!("Connection failed: {e}");
                renderer.display_status(Status::Error, &format!("Failed to connect via URL: {e}"));
            }
        }
    }

    async fn handle_connect_fields(
        &mut self,
        descriptor: ConnectionDescriptor,
        renderer: &mut dyn Renderer,
    ) {
        match self.manager.connect_from_fields(descriptor).await {
            Ok(outcome) => {
                info!("Connected to {} database", outcome.kind);
                renderer.display_status(
                    Status::Success,
                    &format!("Connected to {} database", outcome.kind),
                );
                if let Some(e) = outcome.save_error {
                    renderer.display_status(
                        Status::Error,
                        &format!("Could not save connection info: {e}"),
                    );
                }
            }
            Err(ChatDbError::UnsupportedKind(kind)) => {
                error!("Unsupported database type: {kind}");
                renderer.display_status(Status::Error, "Unsupported database type");
            }
            Err(e) => {
                error!("Connection failed: {e}");
                renderer.display_status(Status::Error, &format!("Failed to connect via URL: {e}"));
            }
        }
    }

    /// Closes the live connection, if any.
    pub async fn close(&mut self) -> Result<()> {
        self.manager.close().await
    }
}
