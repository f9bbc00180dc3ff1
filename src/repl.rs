//! Line-oriented terminal front end.
//!
//! Reads commands and questions line by line, turns them into session
//! events, and prints chat turns and status lines.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

use crate::chat::ChatRole;
use crate::commands::{apply_fields, parse_command, Command, HELP_TEXT};
use crate::error::Result;
use crate::session::{Event, Renderer, Session, Status};

/// Renders session output as plain text lines.
///
/// Chat turns print as `[user] …` / `[assistant] …`; status lines as
/// `[ok] …` / `[error] …`.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Prints a block of text followed by a newline.
    pub fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            error!("Failed to write output: {e}");
        }
    }

    /// Prints the input prompt.
    pub fn prompt(&mut self) {
        if let Err(e) = write!(self.out, "> ").and_then(|()| self.out.flush()) {
            error!("Failed to write prompt: {e}");
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn display_message(&mut self, role: ChatRole, text: &str) {
        self.print(&format!("[{role}] {text}"));
    }

    fn display_status(&mut self, status: Status, text: &str) {
        let tag = match status {
            Status::Success => "ok",
            Status::Error => "error",
        };
        self.print(&format!("[{tag}] {text}"));
    }
}

/// Interactive loop over a session.
pub struct Repl<W: Write> {
    session: Session,
    renderer: TerminalRenderer<W>,
}

impl<W: Write> Repl<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self {
            session,
            renderer: TerminalRenderer::new(out),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Prints the greeting and connects to `url` if one was given.
    pub async fn start(&mut self, url: Option<String>) -> Result<()> {
        self.renderer
            .print("chat-db: ask questions about your database. Type /help for commands.");

        if let Some(last) = self.session.manager().last_known() {
            self.renderer
                .print(&format!("Last connection: {}", last.display_string()));
        }

        if let Some(url) = url {
            self.session
                .handle_event(Event::ConnectUrl(url), &mut self.renderer)
                .await?;
        }
        Ok(())
    }

    /// Processes lines from `input` until `/quit` or end of input, then
    /// closes the connection.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();

        loop {
            self.renderer.prompt();
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            };

            if !self.handle_line(&line).await {
                break;
            }
        }

        info!("Exiting");
        self.session.close().await
    }

    /// Handles one input line. Returns false when the loop should stop.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                self.renderer.display_status(Status::Error, &message);
                return true;
            }
        };

        match command {
            Command::Empty => {}
            Command::Quit => return false,
            Command::Help => self.renderer.print(HELP_TEXT),
            Command::Question(question) => self.dispatch(Event::Question(question)).await,
            Command::Url(url) => self.dispatch(Event::ConnectUrl(url)).await,
            Command::Connect(pairs) => {
                let base = self.session.manager().form_defaults();
                match apply_fields(base, &pairs) {
                    Ok(descriptor) => self.dispatch(Event::ConnectFields(descriptor)).await,
                    Err(message) => self.renderer.display_status(Status::Error, &message),
                }
            }
            Command::Schema => match self.session.manager().describe_schema().await {
                Ok(schema) => self.renderer.print(&schema),
                Err(e) => self
                    .renderer
                    .display_status(Status::Error, &format!("{}: {}", e.category(), e)),
            },
            Command::History => self.show_history(),
            Command::Status => self.show_status(),
        }
        true
    }

    async fn dispatch(&mut self, event: Event) {
        if let Err(e) = self.session.handle_event(event, &mut self.renderer).await {
            error!("{}: {}", e.category(), e);
            self.renderer
                .display_status(Status::Error, &format!("{}: {}", e.category(), e));
        }
    }

    fn show_history(&mut self) {
        let turns = self.session.chat().all();
        if turns.is_empty() {
            self.renderer.print("(no messages yet)");
            return;
        }
        let lines: Vec<String> = turns
            .iter()
            .map(|turn| format!("[{}] {}", turn.role, turn.content))
            .collect();
        self.renderer.print(&lines.join("\n"));
    }

    fn show_status(&mut self) {
        let manager = self.session.manager();
        let connection = match (manager.display_url(), manager.connected_kind()) {
            (Some(url), Some(kind)) => format!("Connected to {kind} database at {url}"),
            _ => "Not connected".to_string(),
        };
        let last = manager
            .last_known()
            .map(|d| format!("\nLast connection: {}", d.display_string()))
            .unwrap_or_default();
        let pipeline = self.session.pipeline();
        let mode = if pipeline.is_read_only() {
            "read-only"
        } else {
            "unrestricted"
        };

        let text = format!(
            "{connection}{last}\nCredentials: {}\nQueries: {mode}",
            manager.store().path().display()
        );
        self.renderer.print(&text);
    }

    /// Consumes the REPL, returning the output writer.
    pub fn into_output(self) -> W {
        self.renderer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::db::MockConnector;
    use crate::llm::{Gateway, MockLlmClient};
    use crate::persistence::CredentialStore;
    use crate::pipeline::QueryPipeline;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repl_with(llm: MockLlmClient) -> (Repl<Vec<u8>>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("connection_info.json"));
        let manager = ConnectionManager::new(Arc::new(MockConnector::new()), store);
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(llm)));
        (Repl::new(Session::new(manager, pipeline), Vec::new()), dir)
    }

    fn repl() -> (Repl<Vec<u8>>, TempDir) {
        repl_with(MockLlmClient::new())
    }

    fn output(repl: Repl<Vec<u8>>) -> String {
        String::from_utf8(repl.into_output()).unwrap()
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_failures_do_not_panic() {
        let mut renderer = TerminalRenderer::new(BrokenPipe);
        renderer.prompt();
        renderer.print("hello");
        renderer.display_status(Status::Error, "still running");
    }

    #[tokio::test]
    async fn test_question_before_connect() {
        let (mut repl, _dir) = repl();
        repl.run(&b"How many users?\n"[..]).await.unwrap();
        assert!(output(repl).contains("[error] Please connect to the database first."));
    }

    #[tokio::test]
    async fn test_url_then_question() {
        let (mut repl, _dir) = repl();
        let input = b"/url postgres://a@h/shop\nHow many users?\n/history\n/quit\nignored\n";
        repl.run(&input[..]).await.unwrap();

        let out = output(repl);
        assert!(out.contains("[ok] Connected successfully via URL"));
        assert!(out.contains("[user] How many users?"));
        assert!(out.contains("[assistant] According to the database"));
        assert!(!out.contains("ignored"));
    }

    #[tokio::test]
    async fn test_connect_with_fields_uses_defaults() {
        let (mut repl, _dir) = repl();
        repl.run(&b"/connect password=\"\" database=shop\n"[..])
            .await
            .unwrap();

        let stored = repl.session().manager().store().load().unwrap().unwrap();
        assert_eq!(stored.database, "shop");
        assert_eq!(stored.username, "root");
        assert!(output(repl).contains("[ok] Connected to MySQL database"));
    }

    #[tokio::test]
    async fn test_bad_input_reports_errors() {
        let (mut repl, _dir) = repl();
        repl.run(&b"/nope\n/connect sslmode=require\n/connect db_type=DB2\n"[..])
            .await
            .unwrap();

        let out = output(repl);
        assert!(out.contains("[error] Unknown command: /nope"));
        assert!(out.contains("[error] Unknown field 'sslmode'"));
        assert!(out.contains("[error] Unsupported database type"));
    }

    #[tokio::test]
    async fn test_failed_question_shows_error_and_continues() {
        let llm = MockLlmClient::new().with_response("Question: break it", "SELEC 1");
        let (mut repl, _dir) = repl_with(llm);
        repl.handle_line("/url postgres://a@h/shop").await;

        assert!(repl.handle_line("break it").await);
        assert_eq!(repl.session().chat().len(), 1);
        assert!(repl.handle_line("what is up").await);
        assert_eq!(repl.session().chat().len(), 3);

        let out = output(repl);
        assert!(out.contains("[error] Execution Error: Execution error: syntax error"));
    }

    #[tokio::test]
    async fn test_schema_and_status() {
        let (mut repl, _dir) = repl();
        repl.handle_line("/status").await;
        repl.handle_line("/url mysql://root@localhost/shop").await;
        repl.handle_line("/schema").await;
        repl.handle_line("/status").await;

        let out = output(repl);
        assert!(out.contains("Not connected"));
        assert!(out.contains("Table: users"));
        assert!(out.contains("Connected to MySQL database at mysql://root@localhost/shop"));
        assert!(out.contains("Queries: unrestricted"));
    }
}
