#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::domain::models::BackendRef;
use crate::domain::models::BackendResponse;
use crate::domain::models::ConversationState;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::services::Consultation;
use crate::domain::services::SessionStore;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /quit (/q, /exit) - Save the session and exit.
- /reset - Start the consultation over, keeping the selected model.
- /save (/s) - Save the session now.
- /plan (/p) - Print the captured business plan.
- /help (/h) - Print this help text.
    "#;

    return text.trim().to_string();
}

fn print_transcript(state: &ConversationState) {
    for message in &state.messages {
        match message.role {
            Role::User => println!("{} {}\n", Paint::cyan("you>").bold(), message.content),
            Role::Assistant => println!("{} {}\n", Paint::green("consultant>").bold(), message.content),
        }
    }
}

fn print_prompt() -> Result<()> {
    print!("{} ", Paint::cyan("you>").bold());
    std::io::stdout().flush()?;
    return Ok(());
}

fn save_failure_notice(store: &SessionStore) -> String {
    return format!("Failed to save the session to {}.", store.path().display());
}

/// Saves the session, printing a red notice when the write fails.
async fn autosave(store: &SessionStore, state: &ConversationState) -> bool {
    let saved = store.save(state).await;
    if !saved {
        println!("{}\n", Paint::red(save_failure_notice(store)));
    }

    return saved;
}

/// Rewrites the current terminal line with a progress percentage.
pub fn write_progress(out: &mut impl Write, fraction: f32, text: &str) -> std::io::Result<()> {
    write!(out, "\r\x1b[2K[{:>3}%] {text}", (fraction * 100.0).round() as u32)?;
    out.flush()?;
    return Ok(());
}

/// Writes streamed chunks until the final message. Returns whether anything
/// was written.
async fn write_stream(
    rx: &mut mpsc::UnboundedReceiver<BackendResponse>,
    out: &mut impl Write,
) -> Result<bool> {
    let mut streamed = false;
    while let Some(res) = rx.recv().await {
        if res.done {
            break;
        }
        write!(out, "{}", res.text)?;
        out.flush()?;
        streamed = true;
    }

    return Ok(streamed);
}

/// Sends one user turn, printing streamed chunks as they arrive. Replies that
/// were never streamed, such as errors, are printed whole.
async fn run_turn(
    consultation: &Consultation<'_>,
    state: &mut ConversationState,
    input: &str,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();

    print!("\n{} ", Paint::green("consultant>").bold());
    std::io::stdout().flush()?;

    let responder = async {
        let tx = tx;
        return consultation.respond(state, input, &tx).await;
    };

    let printer = async {
        let mut stdout = std::io::stdout();
        return write_stream(&mut rx, &mut stdout).await;
    };

    let (reply, streamed) = tokio::join!(responder, printer);
    let streamed = streamed?;
    if !streamed {
        print!("{}", Paint::yellow(reply));
    }
    println!("\n");

    return Ok(());
}

/// Interactive consultation loop. The session is saved after every turn.
pub async fn consult(store: &SessionStore, backend: BackendRef<'_>, chat_model: &str) -> Result<()> {
    let mut state = ConversationState::new(chat_model);
    if store.load(&mut state).await {
        println!(
            "{}\n",
            Paint::new(format!("Resumed session from {}", store.path().display())).dimmed()
        );
    }

    if !backend.has_credential() {
        println!(
            "{}\n",
            Paint::yellow("No API key is configured. Replies will be disabled until one is set.")
        );
    }

    println!("{}\n", Paint::new("Type /help for commands.").dimmed());
    print_transcript(&state);

    let consultation = Consultation::new(backend);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = SlashCommand::parse(input) {
            if command.is_quit() {
                break;
            }
            if command.is_reset() {
                state.reset();
                autosave(store, &state).await;
                print_transcript(&state);
            }
            if command.is_save() {
                if autosave(store, &state).await {
                    println!("Saved session to {}\n", store.path().display());
                }
            }
            if command.is_plan() {
                if state.plan_generated {
                    println!("{}\n", state.plan_text);
                } else {
                    println!("No plan generated yet.\n");
                }
            }
            if command.is_help() {
                println!("{}\n", help_text());
            }
            continue;
        }

        let had_plan = state.plan_generated;
        run_turn(&consultation, &mut state, input).await?;
        autosave(store, &state).await;

        if !had_plan && state.plan_generated {
            println!(
                "{}\n",
                Paint::green("Business plan captured. Run `grantwright visuals` and then `grantwright export`.")
            );
        }
    }

    autosave(store, &state).await;
    return Ok(());
}
