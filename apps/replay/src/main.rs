mod script;

use std::path::PathBuf;

use anyhow::{bail, Context};
use chatsync_config::load as load_config;
use chatsync_runtime::{
    run, telemetry, ChannelCommand, ForwardingChannel, HttpConversationApi, SessionCommand,
    SessionInput, SyncSession,
};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::script::{parse_line, ScriptLine};

#[derive(Parser)]
#[command(name = "chatsync-replay")]
#[command(about = "Replay recorded channel frames through a chatsync session")]
struct Cli {
    /// Identity the session logs in as
    #[arg(long)]
    identity: String,
    /// Newline-delimited JSON input (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Conversation opened before the first frame
    #[arg(long)]
    active: Option<String>,
    /// Load the conversation baseline from the REST api first
    #[arg(long)]
    baseline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    let (channel, mut transport) = ForwardingChannel::new();
    let printer = tokio::spawn(async move {
        while let Some(command) = transport.recv().await {
            match command {
                ChannelCommand::Connect { identity } => info!(%identity, "channel connected"),
                ChannelCommand::Disconnect => info!("channel disconnected"),
                ChannelCommand::Send(frame) => match frame.to_text() {
                    Ok(text) => println!("{text}"),
                    Err(error) => warn!(%error, "unable to encode outbound frame"),
                },
            }
        }
    });

    let mut session = SyncSession::login(cli.identity.as_str(), channel, &config)?;
    if cli.baseline {
        let api = HttpConversationApi::new(&config.api)?;
        session.load_baseline(&api).await?;
    }

    let (input_tx, input_rx) = mpsc::channel(config.realtime.frame_buffer);
    let driver = tokio::spawn(run(session, input_rx, config.realtime.sweep_interval()));

    if let Some(active) = cli.active {
        input_tx
            .send(SessionCommand::SetActive(Some(active)).into())
            .await
            .context("session stopped before replay started")?;
    }

    let fed = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            feed(BufReader::new(file), &input_tx).await
        }
        None => feed(BufReader::new(tokio::io::stdin()), &input_tx).await,
    };
    drop(input_tx);

    let session = driver.await.context("session task failed")?;
    fed?;

    let snapshot = serde_json::to_string_pretty(&session.snapshot())
        .context("failed to encode snapshot")?;
    println!("{snapshot}");

    drop(session.logout());
    printer.await.context("transport task failed")?;
    Ok(())
}

async fn feed<R>(reader: R, inputs: &mpsc::Sender<SessionInput>) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut number = 0;
    let mut replayed = 0;

    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        number += 1;
        let input = match parse_line(&line, number)? {
            None => continue,
            Some(ScriptLine::Frame(frame)) => SessionInput::Frame(frame),
            Some(ScriptLine::Active { active }) => SessionCommand::SetActive(active).into(),
        };
        if inputs.send(input).await.is_err() {
            bail!("session stopped at line {number}");
        }
        replayed += 1;
    }

    info!(replayed, "input exhausted");
    Ok(replayed)
}
