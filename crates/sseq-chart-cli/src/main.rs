use serde::Serialize;
use sseq_chart::{
    ChartClass, ChartConfig, ChartSession, ChartSettings, Page, SseqChart, decode_message_log,
    from_json_str,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const LOG_ENV: &str = "SSEQ_CHART_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Chart(sseq_chart::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Chart(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<sseq_chart::Error> for CliError {
    fn from(value: sseq_chart::Error) -> Self {
        Self::Chart(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Default)]
enum Command {
    #[default]
    Apply,
    Degree(Vec<i32>),
    Tooltip(Uuid),
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    chart: Option<String>,
    messages: Option<String>,
    config: Option<String>,
    undo: usize,
    page: Option<Page>,
    pretty: bool,
}

#[derive(Serialize)]
struct DegreeOut<'a> {
    degree: &'a [i32],
    classes: Vec<&'a ChartClass>,
}

fn usage() -> &'static str {
    "sseq-chart-cli\n\
\n\
USAGE:\n\
  sseq-chart-cli [apply] [--chart <path>] [--messages <path>|-] [--undo <n>] [--config <path>] [--pretty]\n\
  sseq-chart-cli degree <d0,d1,...> [--chart <path>] [--messages <path>|-] [--config <path>] [--pretty]\n\
  sseq-chart-cli tooltip <uuid> --page <p> [--chart <path>] [--messages <path>|-] [--config <path>]\n\
\n\
NOTES:\n\
  - --chart loads a serialized chart; without it the chart starts empty.\n\
  - --messages reads a JSON array or newline-delimited JSON messages, applied in order.\n\
  - --config is a JSON object of chart settings (name, num_gradings, page_list, ranges, projections).\n\
  - --undo rebuilds the chart without the last <n> log messages; it never undoes past the log.\n\
  - apply prints the resulting chart; degree prints the classes in one degree, in idx order.\n\
  - Set SSEQ_CHART_LOG (e.g. debug) to log to stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_degree(raw: &str) -> Result<Vec<i32>, CliError> {
    raw.split(',')
        .map(|d| d.trim().parse::<i32>().map_err(|_| CliError::Usage(usage())))
        .collect()
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut command_seen = false;

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "apply" if !command_seen => {
                command_seen = true;
                args.command = Command::Apply;
            }
            "degree" if !command_seen => {
                command_seen = true;
                args.command = Command::Degree(parse_degree(next_value(&mut it)?)?);
            }
            "tooltip" if !command_seen => {
                command_seen = true;
                let raw = next_value(&mut it)?;
                let uuid = Uuid::parse_str(raw).map_err(|_| CliError::Usage(usage()))?;
                args.command = Command::Tooltip(uuid);
            }
            "--pretty" => args.pretty = true,
            "--chart" => args.chart = Some(next_value(&mut it)?.clone()),
            "--messages" => args.messages = Some(next_value(&mut it)?.clone()),
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--undo" => {
                args.undo = next_value(&mut it)?
                    .parse::<usize>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--page" => {
                let page = next_value(&mut it)?
                    .parse::<Page>()
                    .map_err(|_| CliError::Usage(usage()))?;
                args.page = Some(page);
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }

    if matches!(args.command, Command::Tooltip(_)) && args.page.is_none() {
        return Err(CliError::Usage(usage()));
    }
    if args.chart.as_deref() == Some("-") {
        // Only the message log may come from stdin.
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(input)?)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<Option<ChartConfig>, CliError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let value = serde_json::from_str(&read_input(path)?)?;
    Ok(Some(ChartConfig::from_value(value)))
}

/// Loads the starting chart, applies the message log, then undoes the requested suffix.
fn build_session(args: &Args) -> Result<ChartSession, CliError> {
    let config = load_config(args.config.as_deref())?;
    let chart = match (args.chart.as_deref(), &config) {
        (Some(path), config) => {
            let mut chart = from_json_str(&read_input(path)?)?;
            if let Some(config) = config {
                chart.update_settings(config.as_value())?;
            }
            chart
        }
        (None, Some(config)) => SseqChart::from_settings(ChartSettings::from_config(config)?)?,
        (None, None) => SseqChart::default(),
    };

    let mut session = ChartSession::from_snapshot(chart)?;
    let mut applied = 0;
    if let Some(path) = args.messages.as_deref() {
        let messages = decode_message_log(&read_input(path)?)?;
        applied = session.apply_all(messages)?;
        tracing::info!(applied, "applied message log");
    }
    // The snapshot's own objects are never undone.
    let undo = args.undo.min(applied);
    if undo < args.undo {
        tracing::warn!(requested = args.undo, undo, "undo capped at the message log length");
    }
    for _ in 0..undo {
        session.undo()?;
    }
    Ok(session)
}

fn run(args: Args) -> Result<(), CliError> {
    let session = build_session(&args)?;
    let chart = session.chart();

    match &args.command {
        Command::Apply => write_json(chart, args.pretty),
        Command::Degree(degree) => {
            let classes = chart
                .classes_in_degree(degree)?
                .iter()
                .filter_map(|uuid| chart.class(*uuid))
                .collect();
            write_json(&DegreeOut { degree, classes }, args.pretty)
        }
        Command::Tooltip(uuid) => {
            let page = args.page.ok_or(CliError::Usage(usage()))?;
            println!("{}", chart.class_tooltip(*uuid, page)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
