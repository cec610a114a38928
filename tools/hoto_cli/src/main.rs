mod state;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hoto_core::drughoto::{build_output, parse_hoto, Duty, HotoMode, HotoRequest};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use state::{FormState, FormStore};

#[derive(Parser)]
#[command(name = "hoto")]
#[command(about = "Create or update the Daily Drugs HOTO handover message")]
struct Cli {
    /// JSON file remembering the form fields between runs
    #[arg(long, global = true, env = "HOTO_STATE_FILE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the handover for the given form fields
    Render(RenderArgs),
    /// Print the parsed structure of a handover as JSON
    Parse {
        /// Handover file, or - for stdin
        input: String,
    },
    /// Forget the remembered drugs
    Clear,
}

#[derive(Args, Default)]
struct RenderArgs {
    /// create or update
    #[arg(long)]
    mode: Option<HotoMode>,
    /// Shift date, YYYY-MM-DD (default: today, UTC)
    #[arg(long, env = "HOTO_DATE")]
    date: Option<String>,
    /// DD or ND
    #[arg(long, env = "HOTO_DUTY")]
    duty: Option<Duty>,
    /// Call sign, e.g. A441D. Pass an empty string to drop the previous one
    #[arg(long)]
    call_sign: Option<String>,
    /// Drugs used, one `<name> xN` per line
    #[arg(long, conflicts_with = "drugs_file")]
    drugs: Option<String>,
    /// File holding the drugs used
    #[arg(long)]
    drugs_file: Option<PathBuf>,
    /// Existing handover file, or - for stdin (update mode)
    #[arg(long)]
    existing: Option<String>,
    /// Complete request as JSON; ignores the other fields and the state file
    #[arg(long, conflicts_with_all = ["mode", "date", "duty", "call_sign", "drugs", "drugs_file", "existing"])]
    request: Option<PathBuf>,
}

/// Default log directive; `RUST_LOG` adds to it.
const LOG_DIRECTIVE: &str = "hoto=info";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = cli.state.as_deref().map(FormStore::new);

    match cli.command {
        Commands::Render(args) => {
            let output = render(args, store.as_ref())?;
            println!("{}", output);
        }
        Commands::Parse { input } => {
            let text = read_input(&input)?;
            let parsed = parse_hoto(&text);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Clear => {
            let store = store.context("clear needs --state or HOTO_STATE_FILE")?;
            store.clear_drugs()?;
            info!(path = %store.path().display(), "cleared remembered drugs");
        }
    }
    Ok(())
}

fn render(args: RenderArgs, store: Option<&FormStore>) -> anyhow::Result<String> {
    if let Some(path) = &args.request {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?;
        let req = HotoRequest::from_json(&raw)?;
        return Ok(build_output(&req));
    }

    let remembered = match store {
        Some(store) => store.load()?,
        None => FormState::default(),
    };
    let drugs_text = match &args.drugs_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading drugs {}", path.display()))?,
        ),
        None => args.drugs.clone(),
    };
    let existing_text = match &args.existing {
        Some(input) => read_input(input)?,
        None => String::new(),
    };

    let (req, next_state) = fill_request(&args, &remembered, drugs_text, existing_text, &today());
    debug!(mode = %req.mode, call_sign = %req.call_sign, "rendering handover");
    let output = build_output(&req);

    if let Some(store) = store {
        store.save(&next_state)?;
    }
    Ok(output)
}

/// Flags win over remembered fields; remembered fields win over defaults. The
/// remembered call sign becomes the previous call sign of the request.
fn fill_request(
    args: &RenderArgs,
    remembered: &FormState,
    drugs_text: Option<String>,
    existing_text: String,
    today: &str,
) -> (HotoRequest, FormState) {
    let next = FormState {
        mode: args.mode.or(remembered.mode),
        date: args.date.clone().or_else(|| remembered.date.clone()),
        duty: args.duty.or(remembered.duty),
        call_sign: args.call_sign.clone().or_else(|| remembered.call_sign.clone()),
        drugs_used: drugs_text.or_else(|| remembered.drugs_used.clone()),
    };
    let req = HotoRequest {
        mode: next.mode.unwrap_or_default(),
        date: next.date.clone().unwrap_or_else(|| today.to_string()),
        duty: next.duty.unwrap_or_default(),
        call_sign: next.call_sign.clone().unwrap_or_default(),
        drugs_text: next.drugs_used.clone().unwrap_or_default(),
        existing_text,
        previous_call_sign: remembered.call_sign.clone(),
    };
    (req, next)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(Path::new(input)).with_context(|| format!("reading {}", input))
}

fn today() -> String {
    time::OffsetDateTime::now_utc().date().to_string()
}
