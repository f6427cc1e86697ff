use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use plan_statusline::api::{HttpClient, UreqClient};
use plan_statusline::cli::{Args, Command};
use plan_statusline::config::{load_credentials, save_credentials};
use plan_statusline::display::{
    RenderOptions, print_json_output, render_error, render_text, terminal_width,
};
use plan_statusline::engine::{EngineOptions, UsageEngine};
use plan_statusline::error::QuotaError;
use plan_statusline::models::HookInput;
use plan_statusline::utils::{format_path, read_stdin};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    match &args.command {
        Command::Auth {
            token,
            group_id,
            secondary,
        } => {
            let path = save_credentials(token, group_id, *secondary)?;
            println!(
                "Saved {} credentials to {}",
                if *secondary { "secondary" } else { "primary" },
                format_path(&path.to_string_lossy())
            );
            Ok(())
        }
        Command::Status {
            json,
            watch,
            interval,
        } => run_status(&args, *json, *watch, *interval),
        Command::Statusline => run_statusline(&args),
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn color_enabled(args: &Args) -> bool {
    !args.no_color && env::var_os("NO_COLOR").is_none()
}

fn build_engine(args: &Args) -> Result<UsageEngine, QuotaError> {
    let creds = load_credentials()?;
    let primary: Arc<dyn HttpClient> = Arc::new(UreqClient::new(
        &args.base_url,
        &creds.primary.token,
        &creds.primary.group_id,
        args.timeout_ms,
    ));
    let secondary = creds.secondary.map(|c| {
        Arc::new(UreqClient::new(
            &args.secondary_base_url,
            &c.token,
            &c.group_id,
            args.timeout_ms,
        )) as Arc<dyn HttpClient>
    });
    Ok(UsageEngine::new(
        primary,
        secondary,
        EngineOptions {
            max_pages: args.max_pages,
            preferred_model: args.model.clone(),
        },
    ))
}

fn run_status(args: &Args, json: bool, watch: bool, interval: u64) -> Result<()> {
    let engine = build_engine(args)?;
    let interval = Duration::from_secs(interval.max(1));
    loop {
        let opts = RenderOptions {
            locale: args.locale,
            context_limit: args.context_limit,
            color: color_enabled(args),
            width: terminal_width(),
            cwd: None,
        };
        match engine.refresh(None) {
            Ok(payload) if json => print_json_output(&payload)?,
            Ok(payload) => println!("{}", render_text(&payload, &opts)),
            Err(err) if !watch => return Err(err).context("refresh failed"),
            // A failed cycle does not end the watch
            Err(err) => eprintln!("{}", render_error(&err.to_string(), opts.color)),
        }
        if !watch {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

fn run_statusline(args: &Args) -> Result<()> {
    let color = color_enabled(args);
    let stdin = read_stdin()?;
    let hook: Option<HookInput> = if stdin.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&stdin) {
            Ok(hook) => Some(hook),
            Err(err) => {
                tracing::warn!(%err, "ignoring unparsable hook input");
                None
            }
        }
    };
    let transcript = hook.as_ref().and_then(|h| h.transcript_path.as_deref());

    let result = build_engine(args).and_then(|engine| engine.refresh(transcript.map(Path::new)));
    match result {
        Ok(payload) => {
            let opts = RenderOptions {
                locale: args.locale,
                context_limit: args.context_limit,
                color,
                width: None,
                cwd: hook.as_ref().and_then(|h| h.cwd.clone()),
            };
            println!("{}", render_text(&payload, &opts));
        }
        // The host shows whatever we print; never fail the hook
        Err(err) => println!("{}", render_error(&err.to_string(), color)),
    }
    Ok(())
}
