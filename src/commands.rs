use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::chat::{ChatCompletion, ChatSession, GroqClient, QaBot, Role, TRAVEL_TIPS, TravelBuddy};
use crate::config::Config;
use crate::rag::{DocumentQa, PipelineError, QueryState};

const TRAVEL_FAILURE: &str = "Sorry, I'm having trouble connecting right now.";

/// One line of user input in an interactive loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Quit,
    Clear,
    History,
    Tips,
    Build,
    Unknown(String),
    Message(String),
    Empty,
}

#[inline]
pub fn parse_line(line: &str) -> LineCommand {
    let line = line.trim();
    if line.is_empty() {
        return LineCommand::Empty;
    }
    if !line.starts_with('/') {
        return LineCommand::Message(line.to_string());
    }

    match line.to_ascii_lowercase().as_str() {
        "/quit" | "/exit" | "/q" => LineCommand::Quit,
        "/clear" => LineCommand::Clear,
        "/history" => LineCommand::History,
        "/tips" => LineCommand::Tips,
        "/build" => LineCommand::Build,
        _ => LineCommand::Unknown(line.to_string()),
    }
}

/// General Q&A chat with conversation memory
#[inline]
pub fn qa_chat() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let client: Arc<dyn ChatCompletion> =
        Arc::new(GroqClient::new(&config).context("Failed to set up chat completions")?);
    let bot = QaBot::new(client, &config.completion);

    println!("{}", style("Groq LLM Application").bold().cyan());
    println!("Powered by {}", config.completion.qa_model);
    println!("Commands: /history, /clear, /quit");

    run_qa_loop(&bot, io::stdin().lock(), &mut io::stdout())
}

#[inline]
pub fn run_qa_loop<R: BufRead, W: Write>(bot: &QaBot, input: R, out: &mut W) -> Result<()> {
    let mut session = ChatSession::new();

    for_each_line(input, out, |out, command| {
        match command {
            LineCommand::Clear => {
                session.clear();
                writeln!(out, "Chat history cleared.")?;
            }
            LineCommand::History => write_history(out, &session)?,
            LineCommand::Message(question) => {
                let spinner = spinner("Thinking...");
                let result = bot.ask(&mut session, &question);
                spinner.finish_and_clear();

                match result {
                    Ok(answer) => writeln!(out, "{} {}", style("🤖 Bot:").bold(), answer)?,
                    Err(e) => {
                        warn!("Q&A request failed: {}", e);
                        writeln!(out, "Error: {e}")?;
                    }
                }
            }
            other => write_unsupported(out, &other)?,
        }
        Ok(())
    })
}

/// Travel Buddy chat
#[inline]
pub fn travel_chat() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let client: Arc<dyn ChatCompletion> =
        Arc::new(GroqClient::new(&config).context("Failed to set up chat completions")?);
    let buddy = TravelBuddy::new(client, &config.completion);

    println!("{}", style("Travel Buddy").bold().cyan());
    println!("Your AI travel companion for planning amazing trips!");
    println!("Commands: /tips, /clear, /quit");

    run_travel_loop(&buddy, io::stdin().lock(), &mut io::stdout())
}

#[inline]
pub fn run_travel_loop<R: BufRead, W: Write>(
    buddy: &TravelBuddy,
    input: R,
    out: &mut W,
) -> Result<()> {
    let mut session = buddy.start_session();
    write_last_assistant(out, &session)?;

    for_each_line(input, out, |out, command| {
        match command {
            LineCommand::Clear => {
                buddy.clear_session(&mut session);
                write_last_assistant(out, &session)?;
            }
            LineCommand::Tips => {
                writeln!(out, "{}", style("Try asking about:").bold())?;
                for tip in TRAVEL_TIPS {
                    writeln!(out, "  - \"{tip}\"")?;
                }
            }
            LineCommand::Message(message) => {
                let spinner = spinner("Let me think about that...");
                let result = buddy.reply(&mut session, &message);
                spinner.finish_and_clear();

                match result {
                    Ok(_) => write_last_assistant(out, &session)?,
                    Err(e) => {
                        warn!("Travel Buddy request failed: {}", e);
                        writeln!(out, "{} {TRAVEL_FAILURE} Error: {e}", style("🌍").bold())?;
                    }
                }
            }
            other => write_unsupported(out, &other)?,
        }
        Ok(())
    })
}

/// Document Q&A over the PDFs in `dir`, or the configured directory
#[inline]
pub fn document_chat(dir: Option<PathBuf>, build: bool) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let dir = dir.unwrap_or_else(|| config.retrieval.documents_dir.clone());
    let qa = DocumentQa::from_config(&config)?;

    println!("{}", style("📄 Document Q&A Chatbot").bold().cyan());
    println!("Documents: {}", dir.display());
    println!("Commands: /build, /quit");

    let mut stdout = io::stdout();
    if build {
        build_index(&qa, &dir, &mut stdout)?;
    }

    run_document_loop(&qa, &dir, io::stdin().lock(), &mut stdout)
}

#[inline]
pub fn run_document_loop<R: BufRead, W: Write>(
    qa: &DocumentQa,
    dir: &Path,
    input: R,
    out: &mut W,
) -> Result<()> {
    for_each_line(input, out, |out, command| {
        match command {
            LineCommand::Build => build_index(qa, dir, out)?,
            LineCommand::Message(question) => answer_question(qa, &question, out)?,
            other => write_unsupported(out, &other)?,
        }
        Ok(())
    })
}

fn build_index<W: Write>(qa: &DocumentQa, dir: &Path, out: &mut W) -> Result<()> {
    writeln!(out, "🔄 Creating embeddings, please wait...")?;
    let spinner = spinner("Indexing documents...");
    let result = qa.build_index(dir);
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            for skipped in &report.skipped {
                writeln!(
                    out,
                    "{} Skipped {}: {}",
                    style("⚠").yellow(),
                    skipped.path.display(),
                    skipped.reason
                )?;
            }
            writeln!(
                out,
                "✅ Embeddings created successfully! {} chunks from {} pages in {} documents ({:.2}s)",
                report.chunks,
                report.pages,
                report.documents,
                report.elapsed.as_secs_f64()
            )?;
        }
        Err(e) => {
            warn!("Index build failed: {}", e);
            writeln!(out, "Error: {e}")?;
            if qa.is_ready() {
                writeln!(out, "The previous index is still in use.")?;
            }
        }
    }
    Ok(())
}

fn answer_question<W: Write>(qa: &DocumentQa, question: &str, out: &mut W) -> Result<()> {
    let spinner = spinner("Embedding the question...");
    let result = qa.ask(question, |state| match state {
        QueryState::Retrieving => spinner.set_message("Retrieving context..."),
        QueryState::Synthesizing => spinner.set_message("Generating the answer..."),
        _ => {}
    });
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) if matches!(e.source, PipelineError::IndexNotBuilt(_)) => {
            writeln!(
                out,
                "{}",
                style("⚠️ Please build the document index first with /build.").yellow()
            )?;
            return Ok(());
        }
        Err(e) => {
            writeln!(out, "Error: {e}")?;
            return Ok(());
        }
    };

    info!("Answered question in {:.2?}", result.elapsed);
    writeln!(out, "{}", style("🤖 Answer:").bold())?;
    writeln!(out, "{}", result.answer)?;
    writeln!(out)?;
    writeln!(
        out,
        "⏳ Response Time: {:.2} seconds",
        result.elapsed.as_secs_f64()
    )?;

    if !result.sources.is_empty() {
        writeln!(out, "{}", style("📄 Relevant Document Sections:").bold())?;
        for (i, source) in result.sources.iter().enumerate() {
            let file = source
                .chunk
                .source
                .file_name()
                .map_or_else(|| source.chunk.source.display().to_string(), |name| {
                    name.to_string_lossy().into_owned()
                });
            writeln!(
                out,
                "Chunk {} ({}, page {}, score {:.3}):",
                i + 1,
                file,
                source.chunk.page_number,
                source.score
            )?;
            writeln!(out, "{}", source.chunk.text)?;
            writeln!(out, "{}", "🔹".repeat(10))?;
        }
    }
    Ok(())
}

/// Prompt, read and dispatch lines until `/quit` or end of input
fn for_each_line<R, W, F>(input: R, out: &mut W, mut handle: F) -> Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&mut W, LineCommand) -> Result<()>,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{} ", style(">").green().bold())?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            return Ok(());
        };

        match parse_line(&line.context("Failed to read input")?) {
            LineCommand::Quit => return Ok(()),
            LineCommand::Empty => {}
            command => handle(out, command)?,
        }
    }
}

fn write_history<W: Write>(out: &mut W, session: &ChatSession) -> io::Result<()> {
    let turns = session.turns();
    if turns.is_empty() {
        return writeln!(out, "No chat history yet.");
    }

    writeln!(out, "{}", style("Chat History").bold())?;
    for turn in turns {
        writeln!(out, "{}", style("You:").bold())?;
        writeln!(out, "{}", turn.question)?;
        writeln!(out, "{}", style("🤖 Bot:").bold())?;
        writeln!(out, "{}", turn.answer)?;
        writeln!(out, "{}", "-".repeat(40))?;
    }
    Ok(())
}

fn write_last_assistant<W: Write>(out: &mut W, session: &ChatSession) -> io::Result<()> {
    match session.messages().last() {
        Some(message) if message.role == Role::Assistant => {
            writeln!(out, "{} {}", style("🌍").bold(), message.content)
        }
        _ => Ok(()),
    }
}

fn write_unsupported<W: Write>(out: &mut W, command: &LineCommand) -> io::Result<()> {
    match command {
        LineCommand::Unknown(text) => writeln!(out, "Unknown command: {text}"),
        _ => writeln!(out, "That command is not available here."),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
