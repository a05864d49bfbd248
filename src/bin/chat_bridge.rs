use std::error::Error;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use firebase_ai_chat_bridge::app::{initialize_app, set_log_level};
use firebase_ai_chat_bridge::bridge::{BridgeConfig, ChatBridge, Outcome, WriterOutput};

const ENTER: &str = "Enter";

/// Reads one prompt per stdin line and prints the bridge output to stdout.
///
/// Configuration comes from the environment, for example:
///
/// ```text
/// FIREBASE_CONFIG='{"apiKey":"...","projectId":"...","appId":"..."}' chat-bridge
/// ```
///
/// Arguments, when given, are joined into a single prompt that is submitted
/// once instead of reading stdin.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = BridgeConfig::from_env()?;
    if let Some(level) = config.log_level {
        set_log_level(level);
    }

    let app = initialize_app(config.firebase, None).await?;
    let output = Arc::new(WriterOutput::new(io::stdout()));
    let bridge = Arc::new(ChatBridge::connect(app, config.settings, output).await?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let prompt = args.join(" ");
        report(bridge.on_key(ENTER, &prompt).await);
        return Ok(());
    }

    // Each line is an Enter press; submissions run concurrently so a slow
    // answer does not hold back the next prompt.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut submissions = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let bridge = Arc::clone(&bridge);
        submissions.push(tokio::spawn(async move { bridge.on_key(ENTER, &line).await }));
    }

    for joined in futures::future::join_all(submissions).await {
        match joined {
            Ok(result) => report(result),
            Err(err) => eprintln!("submission task failed: {err}"),
        }
    }
    Ok(())
}

fn report(result: firebase_ai_chat_bridge::bridge::BridgeResult<Outcome>) {
    match result {
        Ok(Outcome::Superseded) => eprintln!("(an earlier answer was discarded)"),
        Ok(_) => {}
        Err(err) => eprintln!("error: {err}"),
    }
}
