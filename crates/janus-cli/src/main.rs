//! Janus CLI - present commands through either channel.
//!
//! The binary hosts the bundled demo command set and drives the engine
//! end to end: `janus run greet -p name=ada` resolves, executes and
//! renders on the selected channel.
//!
//! # Configuration
//!
//! Sources, highest priority first:
//!
//! 1. CLI arguments (`--channel`, `--verbose`)
//! 2. Environment variables (`JANUS_CHANNEL`, `JANUS_VERBOSE`)
//! 3. Project config (`./janus.toml`)
//! 4. Defaults (text channel, quiet)
//!
//! # Channels
//!
//! - `text`: renders through the console renderer (markdown via
//!   termimad, plain lines as-is).
//! - `widget`: prints the retained-widget surface commands as JSON
//!   lines, the feed a graphical host would consume.

mod config;
mod demo;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::{Channel, CliConfig};
use janus_app::App;
use janus_engine::{
    surface_port, ChannelContext, ConsoleRenderer, RunState, SurfaceCommand, TextChannel, Widget,
    WidgetChannel,
};
use janus_spec::{CommandSpec, ParamMap, ParamType, ParamValue};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Janus CLI - dual-channel command presenter.
#[derive(Parser, Debug)]
#[command(name = "janus")]
#[command(version, about, long_about = None)]
struct Args {
    /// Presentation channel: text or widget (also: JANUS_CHANNEL)
    #[arg(long)]
    channel: Option<String>,

    /// Verbose logging (also: JANUS_VERBOSE)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available commands
    List,
    /// Run one command and exit
    Run {
        /// Command name; grouped commands qualify as group:command
        name: String,

        /// Parameter values as key=value pairs
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let arg_channel = args
        .channel
        .as_deref()
        .map(str::parse::<Channel>)
        .transpose()?;
    let config = CliConfig::load(arg_channel, args.verbose)?;
    init_tracing(config.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building the async runtime")?;
    runtime.block_on(async move {
        match config.channel {
            Channel::Text => run_text(args.command).await,
            Channel::Widget => run_widget(args.command).await,
        }
    })
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_text(command: Command) -> Result<()> {
    let (port, receiver) = surface_port();
    let renderer = tokio::spawn(ConsoleRenderer::new().run(receiver));
    {
        let app = App::new(
            demo::app_spec(),
            TextChannel::new(),
            Arc::new(port),
            tokio::runtime::Handle::current(),
        );
        app.enable_immediate_output();
        execute(&app, command).await?;
    }
    // The application is gone, every port with it; the renderer drains
    // the remaining commands and finishes.
    let _ = renderer.await;
    Ok(())
}

async fn run_widget(command: Command) -> Result<()> {
    let (port, mut receiver) = surface_port::<Widget>();
    let dumper = tokio::spawn(async move {
        while let Some(surface_command) = receiver.recv().await {
            print_widget_command(&surface_command);
        }
    });
    {
        let app = App::new(
            demo::app_spec(),
            WidgetChannel::new(),
            Arc::new(port),
            tokio::runtime::Handle::current(),
        );
        app.enable_immediate_output();
        execute(&app, command).await?;
    }
    let _ = dumper.await;
    Ok(())
}

async fn execute<C: ChannelContext>(app: &App<C>, command: Command) -> Result<()> {
    match command {
        Command::List => {
            list_commands(app);
            Ok(())
        }
        Command::Run { name, params } => {
            let handle = app.command(&name)?;
            let params = parse_params(handle.spec(), &params)?;
            handle.run(params).wait().await;
            if handle.state() == RunState::Failed {
                bail!("command '{name}' failed");
            }
            Ok(())
        }
    }
}

fn list_commands<C: ChannelContext>(app: &App<C>) {
    if let Some(title) = &app.spec().title {
        println!("{title}");
    }
    for handle in app.commands() {
        let spec = handle.spec();
        println!(
            "  {:<16} [{}] {}",
            handle.key().qualified(),
            spec.effective_mode(),
            spec.help.as_deref().unwrap_or("")
        );
    }
}

/// Parses `key=value` pairs against the command's parameter specs, so
/// values reach validation already typed.
fn parse_params(spec: &CommandSpec, raw: &[String]) -> Result<ParamMap> {
    let mut params = ParamMap::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{pair}'"))?;
        let param = spec
            .params
            .iter()
            .find(|param| param.name == key)
            .with_context(|| format!("unknown parameter '{key}'"))?;
        let value = match param.param_type {
            ParamType::Integer => ParamValue::Int(
                value
                    .parse()
                    .with_context(|| format!("parameter '{key}' expects an integer"))?,
            ),
            ParamType::Float => ParamValue::Float(
                value
                    .parse()
                    .with_context(|| format!("parameter '{key}' expects a number"))?,
            ),
            ParamType::Boolean => ParamValue::Bool(
                value
                    .parse()
                    .with_context(|| format!("parameter '{key}' expects true or false"))?,
            ),
            ParamType::List => {
                ParamValue::List(value.split(',').map(str::to_string).collect())
            }
            ParamType::String | ParamType::Choice => ParamValue::Str(value.to_string()),
        };
        params.insert(key.to_string(), value);
    }
    Ok(params)
}

fn print_widget_command(command: &SurfaceCommand<Widget>) {
    let line = match command {
        SurfaceCommand::Append { key, artifact, .. } => format!(
            "append {key} {}",
            serde_json::to_string(artifact).unwrap_or_default()
        ),
        SurfaceCommand::UpdateText { key, text, .. } => {
            format!("update-text {key} {text:?}")
        }
        SurfaceCommand::ReplaceRegion {
            key,
            region,
            artifact,
        } => format!(
            "replace-region {key} {region} {}",
            serde_json::to_string(artifact).unwrap_or_default()
        ),
        SurfaceCommand::StreamAppend {
            key,
            stream,
            artifact,
        } => format!(
            "stream-append {key} {stream} {}",
            serde_json::to_string(artifact).unwrap_or_default()
        ),
        SurfaceCommand::SetVisible { key, visible } => format!("visible {key} {visible}"),
        SurfaceCommand::SetRunEnabled { key, enabled } => {
            format!("run-enabled {key} {enabled}")
        }
        SurfaceCommand::Clear { key } => format!("clear {key}"),
        SurfaceCommand::ScrollToEnd { key } => format!("scroll {key}"),
        SurfaceCommand::Clipboard { text } => format!("clipboard {text:?}"),
        SurfaceCommand::Overlay { message } => format!("overlay {message:?}"),
    };
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use janus_spec::ParamSpec;

    fn spec() -> CommandSpec {
        CommandSpec::sync("probe", |_| Ok(None))
            .with_param(ParamSpec::string("name"))
            .with_param(ParamSpec::integer("count"))
            .with_param(ParamSpec::boolean("fast"))
            .with_param(ParamSpec::list("tags"))
    }

    #[test]
    fn params_parse_to_their_declared_types() {
        let params = parse_params(
            &spec(),
            &[
                "name=ada".to_string(),
                "count=3".to_string(),
                "fast=true".to_string(),
                "tags=a,b,c".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(params["name"], ParamValue::Str("ada".into()));
        assert_eq!(params["count"], ParamValue::Int(3));
        assert_eq!(params["fast"], ParamValue::Bool(true));
        assert_eq!(
            params["tags"],
            ParamValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn malformed_pairs_and_unknown_names_fail() {
        assert!(parse_params(&spec(), &["no-equals".to_string()]).is_err());
        assert!(parse_params(&spec(), &["bogus=1".to_string()]).is_err());
        assert!(parse_params(&spec(), &["count=three".to_string()]).is_err());
    }
}
