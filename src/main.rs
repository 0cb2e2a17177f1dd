//! scenechat - streaming animation chat agent
//!
//! CLI entry point: runs one chat request and prints the newline-delimited
//! record stream to stdout.

use std::io::Write;

use clap::Parser;
use futures::StreamExt;

use scenechat::{run_chat, ChatRequest, Config, ManimInvoker};

/// scenechat - chat with an LLM that previews its own animations
#[derive(Parser, Debug)]
#[command(name = "scenechat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The user prompt to start the conversation with
    #[arg(required_unless_present_any = ["check", "init_config"])]
    prompt: Option<String>,

    /// Model backend: openai or groq
    #[arg(long, short = 'e', default_value = "openai")]
    engine: String,

    /// Model name (defaults to the engine's default)
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Project title shown to the model for context
    #[arg(long, default_value = "Untitled project")]
    project_title: String,

    /// Custom rules appended to the system prompt
    #[arg(long, default_value = "")]
    rules: String,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Report backend credentials and renderer availability, then exit
    #[arg(long)]
    check: bool,

    /// Write the current configuration to the config file, then exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load();
    if args.debug {
        config.agent.debug = true;
    }

    if args.init_config {
        config.save()?;
        println!("Wrote {}", Config::config_file().display());
        return Ok(());
    }

    if args.check {
        let openai = if config.backends.openai_api_key.is_some() {
            "configured"
        } else {
            "missing OPENAI_API_KEY"
        };
        let groq = if config.backends.groq_api_key.is_some() {
            "configured"
        } else {
            "missing GROQ_API_KEY"
        };
        let manim = if ManimInvoker::is_available().await {
            "found"
        } else {
            "not found on PATH"
        };
        println!("openai: {openai}");
        println!("groq: {groq}");
        println!("manim: {manim}");
        return Ok(());
    }

    let request = ChatRequest {
        prompt: args.prompt,
        engine: Some(args.engine),
        model: args.model,
        project_title: args.project_title,
        global_prompt: args.rules,
        ..Default::default()
    };

    let mut records = run_chat(request, &config)?;

    let mut stdout = std::io::stdout();
    while let Some(record) = records.next().await {
        stdout.write_all(record.to_line().as_bytes())?;
        stdout.flush()?;
    }

    Ok(())
}
