//! Interactive chat shell.

use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::ChatArgs;
use crate::agent::Conversation;
use crate::config::EchoConfig;
use crate::error::Result;
use crate::provider::ScriptedProvider;
use crate::tools::{wikipedia_tools, ToolDescriptor, ToolProvider, ToolRegistry, WikipediaClient};
use crate::types::Message;

#[cfg(feature = "mcp-client")]
use crate::mcp::RemoteTools;

const PREVIEW_CHARS: usize = 80;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Exit,
    Reset,
    Tools,
    History,
    /// `/window` without a usable size: show the current one.
    ShowWindow,
    SetWindow(NonZeroUsize),
    Ask(String),
    Empty,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Empty,
            "/exit" => Self::Exit,
            "/reset" => Self::Reset,
            "/tools" => Self::Tools,
            "/history" => Self::History,
            _ => match line.strip_prefix("/window") {
                Some(rest) => rest
                    .trim()
                    .parse::<NonZeroUsize>()
                    .map(Self::SetWindow)
                    .unwrap_or(Self::ShowWindow),
                None => Self::Ask(line.to_string()),
            },
        }
    }
}

pub fn help_line() -> &'static str {
    "Commands: /tools (list tools), /history (context), /window N (window size), /reset (new conversation), /exit (quit)"
}

/// Render the history listing printed by `/history`.
pub fn format_history(history: &[Message], window_len: usize) -> String {
    if history.is_empty() {
        return "(no conversation)\n".to_string();
    }

    let mut out = format!(
        "\nContext: {} messages (window: {window_len}):\n",
        history.len()
    );
    for (i, message) in history.iter().enumerate() {
        let text = message.to_string();
        let preview: String = text
            .chars()
            .take(PREVIEW_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        let ellipsis = if text.chars().count() > PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        out.push_str(&format!(
            "  [{}] {:<9} │ {preview}{ellipsis}\n",
            i + 1,
            message.role().to_string()
        ));
    }
    out
}

fn format_tools(tools: &[ToolDescriptor]) -> String {
    tools
        .iter()
        .map(|t| format!("  {}: {}\n", t.name, t.description))
        .collect()
}

/// Read commands from `input` until `/exit` or end of input.
///
/// Turn failures are printed and the loop continues.
pub async fn run_shell<R, W>(
    conversation: &mut Conversation,
    tools: &[ToolDescriptor],
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        match ShellCommand::parse(&line) {
            ShellCommand::Exit => break,
            ShellCommand::Empty => {}
            ShellCommand::Reset => {
                conversation.reset();
                writeln!(out, "\n[New conversation]\n")?;
            }
            ShellCommand::Tools => writeln!(out, "{}", format_tools(tools))?,
            ShellCommand::History => writeln!(
                out,
                "{}",
                format_history(conversation.history(), conversation.window().len())
            )?,
            ShellCommand::ShowWindow => writeln!(
                out,
                "Current window size: {} (change: /window N)\n",
                conversation.window_size()
            )?,
            ShellCommand::SetWindow(size) => {
                conversation.set_window_size(size);
                writeln!(out, "Window size: {size}\n")?;
            }
            ShellCommand::Ask(question) => match conversation.ask(question).await {
                Ok(answer) => writeln!(out, "\n{answer}\n")?,
                Err(e) => {
                    tracing::debug!(error = %e, "Turn failed");
                    writeln!(out, "Error: {e}\n")?;
                }
            },
        }
    }
    Ok(())
}

/// `mcp-echo chat`: connect tools, then run the shell on stdin/stdout.
pub async fn run_chat(args: ChatArgs, config: &EchoConfig) -> Result<()> {
    if args.local {
        let wiki = WikipediaClient::new(config.wikipedia_base_url())?;
        let registry = Arc::new(ToolRegistry::new().with_tools(wikipedia_tools(wiki)));
        let stdin = BufReader::new(tokio::io::stdin());
        return chat_with(registry, args.window, stdin, &mut std::io::stdout()).await;
    }
    run_remote_chat(args, config).await
}

#[cfg(feature = "mcp-client")]
async fn run_remote_chat(args: ChatArgs, config: &EchoConfig) -> Result<()> {
    let remote = connect_remote(&args, config).await?;
    let stdin = BufReader::new(tokio::io::stdin());
    chat_remote(remote, args.window, stdin, &mut std::io::stdout()).await
}

#[cfg(feature = "mcp-client")]
async fn connect_remote(args: &ChatArgs, config: &EchoConfig) -> Result<RemoteTools> {
    if args.stdio {
        let mut command = tokio::process::Command::new(std::env::current_exe()?);
        command.arg("stdio");
        if std::env::var_os("RUST_LOG").is_none() && !config.debug {
            command.env("RUST_LOG", "warn");
        }
        return RemoteTools::spawn(command).await;
    }
    let url = args.server.clone().unwrap_or_else(|| config.server_url());
    RemoteTools::connect(url).await
}

#[cfg(not(feature = "mcp-client"))]
async fn run_remote_chat(_args: ChatArgs, _config: &EchoConfig) -> Result<()> {
    Err(crate::error::EchoError::Configuration(
        "remote tools need the mcp-client feature; use --local".into(),
    ))
}

/// Run the shell over `remote`, closing the MCP session however the shell ends.
#[cfg(feature = "mcp-client")]
pub async fn chat_remote<R, W>(
    remote: RemoteTools,
    window: Option<NonZeroUsize>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let remote = Arc::new(remote);
    let outcome = chat_with(remote.clone(), window, input, out).await;

    let closed = match Arc::try_unwrap(remote) {
        Ok(remote) => remote.close().await,
        Err(_) => Ok(()),
    };
    outcome.and(closed)
}

/// Print the tool banner, then run the shell with a scripted conversation.
pub async fn chat_with<R, W>(
    tools: Arc<dyn ToolProvider>,
    window: Option<NonZeroUsize>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let descriptors = tools.list_tools().await?;
    let names: Vec<_> = descriptors.iter().map(|t| t.name.as_str()).collect();

    writeln!(
        out,
        "Connected. {} tools: {}",
        descriptors.len(),
        names.join(", ")
    )?;
    writeln!(out, "{}\n", help_line())?;

    let mut conversation = Conversation::new(tools, Arc::new(ScriptedProvider::new()));
    if let Some(size) = window {
        conversation.set_window_size(size);
    }

    run_shell(&mut conversation, &descriptors, input, out).await
}
