use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tasagent_plugin::session::{self, SessionConfig};
use tasagent_plugin::{BotClient, IconSet, Plugin, RunOutcome};
use tracing_subscriber::EnvFilter;

/// The host launches plugins as
/// `-port <n> -pluginUUID <id> -registerEvent <name> -info <json>`.
#[derive(Parser, Debug)]
#[command(name = "tasagent_plugin")]
struct Args {
    #[arg(long)]
    port: u16,

    #[arg(long = "pluginUUID")]
    plugin_uuid: String,

    #[arg(long = "registerEvent")]
    register_event: String,

    /// Host/device description JSON. Informational only.
    #[arg(long)]
    info: String,

    #[arg(long, value_name = "DIR", default_value = "Images")]
    images_dir: PathBuf,
}

/// clap wants `--name`; the host passes `-name`.
fn double_dash(a: String) -> String {
    let single_dash_word = a.starts_with('-')
        && !a.starts_with("--")
        && a[1..].starts_with(|c: char| c.is_ascii_alphabetic());
    if single_dash_word && a.len() > 2 {
        format!("-{a}")
    } else {
        a
    }
}

/// Rewrites the host launch line for clap. Options this binary does not know, and
/// their values, are dropped so a newer host can add parameters.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let command = Args::command();
    let known: Vec<String> = command
        .get_arguments()
        .filter_map(|a| a.get_long())
        .map(|long| format!("--{long}"))
        .chain(Some("--help".to_string()))
        .collect();

    let mut args = args.into_iter().map(double_dash).peekable();
    let mut out: Vec<String> = args.next().into_iter().collect();
    while let Some(arg) = args.next() {
        let name = arg.split('=').next().unwrap_or_default();
        if !arg.starts_with("--") {
            out.push(arg);
        } else if known.iter().any(|k| k == name) {
            let inline_value = arg.contains('=');
            out.push(arg);
            if !inline_value {
                out.extend(args.next_if(|v| !v.starts_with("--")));
            }
        } else {
            args.next_if(|v| !v.starts_with("--"));
        }
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse_from(normalize_args(std::env::args()));
    tracing::debug!("launch info: {}", args.info);

    let icons = IconSet::load(&args.images_dir)
        .with_context(|| format!("loading icons from {}", args.images_dir.display()))?;
    let bot = BotClient::new()?;

    let (session, events) = session::spawn(SessionConfig {
        port: args.port,
        plugin_uuid: args.plugin_uuid,
        register_event: args.register_event,
    });

    let plugin = Plugin::new(bot, session, icons);
    if plugin.run(events).await == RunOutcome::NeverConnected {
        tracing::warn!("exiting without a host connection");
    }
    Ok(())
}
