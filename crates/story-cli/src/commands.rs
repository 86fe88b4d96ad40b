use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use story_crypto::{title_seed, AddressDeriver, Keypair, NodeSeeds};
use story_program::{Runtime, StoryNode, SystemClock};
use story_sdk::{
    branch_label, format_date, inline_content_uri, select_wallet, MintReceipt, StoryClient,
    StoryTree, WalletEnvironment,
};
use story_store::FileAccountStore;
use story_types::{Address, TitleSeed};
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(&config, args, format),
        Command::Root(args) => cmd_root(&config, args, format).await,
        Command::Branch(args) => cmd_branch(&config, args, format).await,
        Command::Tree => cmd_tree(&config, format),
        Command::Show(args) => cmd_show(&config, args, format),
        Command::Derive(args) => cmd_derive(&config, args, format),
        Command::Verify => cmd_verify(&config, format),
    }
}

fn open_runtime(config: &CliConfig) -> anyhow::Result<Arc<Runtime>> {
    let store = FileAccountStore::open(&config.ledger_path)
        .with_context(|| format!("opening ledger {}", config.ledger_path.display()))?;
    debug!(
        ledger = %config.ledger_path.display(),
        program = %config.program_id,
        "ledger opened"
    );
    Ok(Arc::new(Runtime::new(
        config.runtime_config(),
        Arc::new(store),
        Arc::new(SystemClock),
    )))
}

fn open_client(config: &CliConfig) -> anyhow::Result<StoryClient> {
    let runtime = open_runtime(config)?;
    let env = WalletEnvironment::from_process(Some(config.keypair_path.clone()));
    let wallet = select_wallet(&env, runtime.clone())?;
    Ok(StoryClient::new(runtime, wallet))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn node_json(address: &Address, node: &StoryNode) -> Value {
    json!({
        "address": address.to_hex(),
        "author": node.author.to_hex(),
        "parent": if node.is_root() { Value::Null } else { json!(node.parent.to_hex()) },
        "title": node.title,
        "content_uri": node.content_uri,
        "image_uri": node.image_uri,
        "children_count": node.children_count,
        "created_at": node.created_at,
        "bump": node.bump,
    })
}

fn cmd_keygen(config: &CliConfig, args: KeygenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = &config.keypair_path;
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let keypair = Keypair::generate();
    keypair.write_file(path)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "address": keypair.address().to_hex(),
            "path": path.display().to_string(),
        })),
        OutputFormat::Text => {
            println!("{} Wrote keypair to {}", "✓".green().bold(), path.display());
            println!("  Author: {}", keypair.address().to_string().cyan());
            Ok(())
        }
    }
}

fn content_uri(args: &MintArgs) -> String {
    if args.inline {
        inline_content_uri(args.content.trim())
    } else {
        args.content.clone()
    }
}

fn print_receipt(kind: &str, receipt: &MintReceipt, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "address": receipt.address.to_hex(),
            "signature": receipt.signature.to_hex(),
        })),
        OutputFormat::Text => {
            println!("{} {} minted", "✓".green().bold(), kind);
            println!("  Node: {}", receipt.address.to_string().yellow());
            println!("  TX:   {}", receipt.signature.to_hex().dimmed());
            Ok(())
        }
    }
}

async fn cmd_root(config: &CliConfig, args: MintArgs, format: OutputFormat) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let receipt = client
        .mint_root(&args.title, &content_uri(&args), &args.image)
        .await?;
    print_receipt("Root node", &receipt, format)
}

async fn cmd_branch(
    config: &CliConfig,
    args: BranchArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let receipt = client
        .mint_branch(
            args.parent,
            &args.mint.title,
            &content_uri(&args.mint),
            &args.mint.image,
        )
        .await?;
    print_receipt("Branch", &receipt, format)
}

fn load_tree(config: &CliConfig) -> anyhow::Result<StoryTree> {
    let runtime = open_runtime(config)?;
    Ok(StoryTree::load(runtime.store().as_ref(), &runtime.program_id())?)
}

fn node_line(address: &Address, node: &StoryNode) -> String {
    format!(
        "{} {} by {} · {} · {}",
        node.title.bold(),
        address.short().yellow(),
        node.author.short().cyan(),
        format_date(node.created_at).dimmed(),
        branch_label(node.children_count)
    )
}

fn cmd_tree(config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let tree = load_tree(config)?;
    if let OutputFormat::Json = format {
        let nodes: Vec<Value> = tree
            .walk()
            .into_iter()
            .filter_map(|(depth, address)| {
                let mut v = node_json(&address, tree.get(&address)?);
                v["depth"] = json!(depth);
                Some(v)
            })
            .collect();
        return print_json(&Value::Array(nodes));
    }

    if tree.is_empty() {
        println!("No stories yet.");
        return Ok(());
    }
    let orphans = tree.orphans();
    for (depth, address) in tree.walk() {
        let Some(node) = tree.get(&address) else {
            continue;
        };
        let marker = if depth == 0 && orphans.contains(&address) {
            "?".red().to_string()
        } else if depth == 0 {
            "●".green().to_string()
        } else {
            "└".dimmed().to_string()
        };
        println!("{}{} {}", "  ".repeat(depth), marker, node_line(&address, node));
    }
    Ok(())
}

fn cmd_show(config: &CliConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tree = load_tree(config)?;
    let Some(node) = tree.get(&args.address) else {
        bail!("story node not found: {}", args.address);
    };
    let children = tree.children(&args.address);

    if let OutputFormat::Json = format {
        let mut v = node_json(&args.address, node);
        v["children"] = json!(children.iter().map(Address::to_hex).collect::<Vec<_>>());
        return print_json(&v);
    }

    println!("{}", node.title.bold());
    println!("  Address: {}", args.address.to_string().yellow());
    println!("  Author:  {}", node.author.to_string().cyan());
    if node.is_root() {
        println!("  Parent:  {}", "(root)".dimmed());
    } else {
        println!("  Parent:  {}", node.parent.to_string().yellow());
    }
    println!("  Created: {}", format_date(node.created_at));
    println!("  Content: {}", node.content_uri);
    if !node.image_uri.is_empty() {
        println!("  Image:   {}", node.image_uri);
    }
    println!("  {}", branch_label(node.children_count));
    if children.is_empty() {
        println!("    {}", "No branches yet".dimmed());
    }
    for child in children {
        if let Some(c) = tree.get(child) {
            println!("    └ {}", node_line(child, c));
        }
    }
    Ok(())
}

/// Address and bump a mint with these inputs would produce. The title is
/// trimmed exactly as the mint client trims it.
fn derive_node(
    program_id: Address,
    author: Address,
    parent: Option<Address>,
    title: &str,
) -> anyhow::Result<(Address, u8, TitleSeed)> {
    let deriver = AddressDeriver::new(program_id);
    let seed = title_seed(title.trim());
    let seeds = match parent {
        Some(parent) => NodeSeeds::branch(author, parent, seed),
        None => NodeSeeds::root(author, seed),
    };
    let (address, bump) = seeds.derive(&deriver)?;
    Ok((address, bump, seed))
}

fn cmd_derive(config: &CliConfig, args: DeriveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (address, bump, seed) =
        derive_node(config.program_id, args.author, args.parent, &args.title)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "address": address.to_hex(),
            "bump": bump,
            "title_seed": seed.to_hex(),
        })),
        OutputFormat::Text => {
            println!("{} (bump {})", address.to_string().yellow(), bump);
            println!("  Title seed: {}", seed.to_hex().dimmed());
            Ok(())
        }
    }
}

fn cmd_verify(config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let tree = load_tree(config)?;
    let report = tree.check_counters();
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&report)?)?,
        OutputFormat::Text => {
            if report.is_consistent() {
                println!("{} Branch counters consistent", "✓".green().bold());
            } else {
                println!("{} Branch counter drift", "✗".red().bold());
            }
            println!("  Nodes:   {}", report.nodes_checked);
            println!("  Orphans: {}", report.orphans);
            for m in &report.mismatches {
                println!(
                    "  {} recorded {} observed {}",
                    m.address.short().yellow(),
                    m.recorded,
                    m.observed
                );
            }
        }
    }
    if !report.is_consistent() {
        bail!("{} node(s) with inconsistent branch counters", report.mismatches.len());
    }
    Ok(())
}
