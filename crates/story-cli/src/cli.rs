use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use story_types::Address;

#[derive(Parser, Debug)]
#[command(
    name = "story",
    about = "Story Chain: branching stories with content-derived addresses",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./story.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an author keypair
    Keygen(KeygenArgs),
    /// Mint a new root story
    Root(MintArgs),
    /// Mint a branch continuing an existing node
    Branch(BranchArgs),
    /// List every story as a tree
    Tree,
    /// Show one node and its branches
    Show(ShowArgs),
    /// Compute a node address without minting
    Derive(DeriveArgs),
    /// Check every node's branch counter against the stored branches
    Verify,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Overwrite an existing keypair file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct MintArgs {
    #[arg(long)]
    pub title: String,
    /// Content URI, or the story text itself with --inline
    #[arg(long)]
    pub content: String,
    /// Embed --content as a data: URI
    #[arg(long)]
    pub inline: bool,
    #[arg(long, default_value = "")]
    pub image: String,
}

#[derive(Args, Debug)]
pub struct BranchArgs {
    #[arg(long)]
    pub parent: Address,
    #[command(flatten)]
    pub mint: MintArgs,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub address: Address,
}

#[derive(Args, Debug)]
pub struct DeriveArgs {
    #[arg(long)]
    pub author: Address,
    #[arg(long)]
    pub parent: Option<Address>,
    #[arg(long)]
    pub title: String,
}
