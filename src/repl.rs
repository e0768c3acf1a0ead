use log::{ debug, info, warn };
use std::io::{ self, Write };
use tokio::io::{ AsyncBufRead, AsyncBufReadExt };
use tokio::sync::mpsc;

use crate::chat::ChatServiceError;
use crate::controller::ConversationController;
use crate::render::TerminalRenderer;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Clear,
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/clear" => Command::Clear,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Submit(line.to_string()),
    }
}

/// Drives one chat session: input lines and chat replies are handled as
/// discrete events, one at a time. The chat request runs on its own task so
/// input is still read (and submits rejected) while a reply is pending.
/// Ends on `/quit` or end of input, after any pending reply has settled.
/// Lines that are not UTF-8 and terminal write failures are logged and
/// skipped; a failing input stream counts as end of input.
pub async fn run_session<R, W>(controller: &mut ConversationController, mut input: R, out: W)
    where R: AsyncBufRead + Unpin, W: Write
{
    let mut renderer = TerminalRenderer::new(out);
    let (tx, mut rx) = mpsc::channel::<Result<String, ChatServiceError>>(1);
    let mut buf = Vec::new();
    let mut input_open = true;

    draw(renderer.sync(&controller.view()));
    draw(renderer.prompt(controller.is_pending()));

    loop {
        tokio::select! {
            read = input.read_until(b'\n', &mut buf), if input_open => {
                let command = match read {
                    Ok(0) if buf.is_empty() => Command::Quit,
                    Ok(_) => {
                        let raw = std::mem::take(&mut buf);
                        match decode_line(raw) {
                            Some(line) => parse_command(&line),
                            None => continue,
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        buf.clear();
                        Command::Quit
                    }
                };
                match command {
                    Command::Quit => {
                        input_open = false;
                        if !controller.is_pending() {
                            break;
                        }
                        info!("Waiting for the pending reply before exiting");
                    }
                    Command::Clear => {
                        controller.clear();
                        draw(renderer.reset("conversation cleared"));
                        draw(renderer.sync(&controller.view()));
                    }
                    Command::Submit(text) => {
                        controller.set_draft(text);
                        match controller.submit_draft() {
                            Some(request) => {
                                draw(renderer.sync(&controller.view()));
                                let service = controller.chat_service();
                                let tx = tx.clone();
                                tokio::spawn(async move {
                                    let outcome = service.chat(&request).await;
                                    let _ = tx.send(outcome).await;
                                });
                            }
                            None => debug!("Input not submitted"),
                        }
                    }
                }
                if input_open {
                    draw(renderer.prompt(controller.is_pending()));
                }
            }
            Some(outcome) = rx.recv() => {
                controller.receive_reply(outcome);
                draw(renderer.sync(&controller.view()));
                if !input_open {
                    break;
                }
                draw(renderer.prompt(controller.is_pending()));
            }
        }
    }
}

/// Strips the line terminator; `None` for input that is not UTF-8.
fn decode_line(mut raw: Vec<u8>) -> Option<String> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    match String::from_utf8(raw) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!("Skipping input line that is not valid UTF-8: {}", e.utf8_error());
            None
        }
    }
}

fn draw(result: io::Result<()>) {
    if let Err(e) = result {
        warn!("Failed to write to the terminal: {}", e);
    }
}
