use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::ProgressBar;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use uuid::Uuid;

use crate::chat::persona::THINKING;
use crate::chat::{PersonaSpec, PromptAssembler, Session, Turn};
use crate::core::AppConfig;
use crate::core::logging::{init_tracing, repl_filter};
use crate::openai::OpenAiClient;

const CLEAR_COMMAND: &str = "/clear";

#[derive(Debug, PartialEq)]
enum ReplInput<'a> {
    Blank,
    Clear,
    /// Sent as typed, same as the HTTP host
    Message(&'a str),
}

fn classify(line: &str) -> ReplInput<'_> {
    match line.trim() {
        "" => ReplInput::Blank,
        CLEAR_COMMAND => ReplInput::Clear,
        _ => ReplInput::Message(line),
    }
}

fn print_turn(turn: Option<&Turn>) {
    if let Some(turn) = turn {
        println!("{}\n", turn.content);
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(THINKING);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub async fn run(config: AppConfig) -> Result<()> {
    init_tracing(&repl_filter());

    let persona = Arc::new(PersonaSpec::load(config.system_message.as_deref())?);
    let assembler = PromptAssembler::from_config(Arc::clone(&persona), &config);
    let llm = OpenAiClient::new(
        &config.api_base_url,
        &config.api_key,
        config.request_timeout,
    )?;
    let mut session = Session::new(&Uuid::new_v4().to_string(), persona);
    let mut rl = DefaultEditor::new()?;

    println!("(輸入 {} 清空對話紀錄，Ctrl-D 離開)\n", CLEAR_COMMAND);
    print_turn(session.snapshot().last());

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let input = classify(&line);
                if input != ReplInput::Blank {
                    if let Err(err) = rl.add_history_entry(line.trim()) {
                        tracing::warn!("Unable to add history entry: {}", err);
                    }
                }

                match input {
                    ReplInput::Blank => continue,
                    ReplInput::Clear => session.clear()?,
                    ReplInput::Message(message) => {
                        let spinner = thinking_spinner();
                        session.submit(&assembler, &llm, message).await?;
                        spinner.finish_and_clear();
                    }
                }
                print_turn(session.snapshot().last());
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_skips_blank_lines() {
        assert_eq!(classify(""), ReplInput::Blank);
        assert_eq!(classify("  \t"), ReplInput::Blank);
    }

    #[test]
    fn it_recognizes_clear_with_surrounding_whitespace() {
        assert_eq!(classify("/clear"), ReplInput::Clear);
        assert_eq!(classify("  /clear "), ReplInput::Clear);
    }

    #[test]
    fn it_sends_messages_untrimmed() {
        assert_eq!(classify("  我失戀了 "), ReplInput::Message("  我失戀了 "));
        assert_eq!(classify("/clear please"), ReplInput::Message("/clear please"));
    }
}
