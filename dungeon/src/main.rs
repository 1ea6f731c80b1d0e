//! Interactive dungeon adventure in the terminal.
//!
//! Talks to a local Ollama service and loops: narrate, print, read one line
//! of player input, repeat. There are no flags or config files; every run
//! starts from the same initial state. The loop only ends on an error or a
//! non-default end condition, so quit with Ctrl-C.

use dungeon_core::{Outcome, Session, SessionConfig, SessionError};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SessionError> {
    let mut session = Session::new(SessionConfig::new());
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let scene = session.next_scene().await?;
        println!("{}", scene.narrative);
        println!("Context length: {}", scene.context_len);

        print!("> ");
        std::io::stdout().flush()?;

        let line = input.next_line().await?.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "standard input closed")
        })?;

        match session.player_input(&line) {
            Outcome::Continue => {}
            Outcome::Win => {
                println!("Your adventure ends in victory.");
                break;
            }
            Outcome::Lose => {
                println!("Your adventure ends here.");
                break;
            }
        }
    }

    Ok(())
}
