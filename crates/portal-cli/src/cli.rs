use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Portal: multi-turn chat sessions in front of an OpenAI-compatible inference server.
#[derive(Parser, Debug)]
#[command(name = "portal", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the upstream server answers a minimal completion.
    Probe,

    /// Send one message and print the reply.
    Ask {
        /// Session id. A fresh one is generated when omitted.
        #[arg(long)]
        session: Option<String>,

        /// System prompt used if the session is created by this call.
        #[arg(long)]
        system: Option<String>,

        /// Print the reply incrementally.
        #[arg(long)]
        stream: bool,

        message: String,
    },

    /// Interactive chat on stdin with streamed replies.
    Chat {
        #[arg(long)]
        session: Option<String>,

        #[arg(long)]
        system: Option<String>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
