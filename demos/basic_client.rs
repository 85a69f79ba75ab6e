// ABOUTME: Basic example demonstrating a chat session over WebSocket
// ABOUTME: Authenticates, prints the backlog, then relays stdin lines as chat messages

use chatwire::{ChatMessage, Connector, Credentials};
use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Terminal chat client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// WebSocket URL of the chat server
    #[arg(short, long, default_value = "ws://localhost:15000")]
    server: String,

    /// Username to authenticate as
    #[arg(short, long)]
    username: String,

    /// Password for the username
    #[arg(short, long)]
    password: String,

    /// Seconds to wait for the authentication response (0 waits forever)
    #[arg(long, default_value_t = 10)]
    handshake_timeout: u64,
}

fn print_chat(chat: &ChatMessage) {
    match &chat.dst {
        Some(dst) => println!("[{} -> {}] {}", chat.src, dst, chat.msg),
        None => println!("[{}] {}", chat.src, chat.msg),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut connector = Connector::new(&args.server);
    if args.handshake_timeout > 0 {
        connector = connector.with_handshake_timeout(Duration::from_secs(args.handshake_timeout));
    }

    println!("Connecting to {}...", args.server);

    let session = connector
        .connect(Credentials::new(&args.username, &args.password))
        .await?;

    println!("Logged in as {}", session.username());
    for chat in session.chats() {
        print_chat(chat);
    }
    println!("Type a message, or /dm <user> <message> for a direct message");

    let mut receive_loop = session.make_receive_loop(|chat| print_chat(&chat));
    let receiver = tokio::spawn(async move { receive_loop.run().await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.strip_prefix("/dm ").and_then(|rest| rest.split_once(' ')) {
            Some((dest, msg)) => session.send_direct_message(msg, dest),
            None => session.send_group_message(line),
        }
    }

    session.close().await?;
    receiver.abort();

    Ok(())
}
