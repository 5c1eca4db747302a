use std::path::{Path, PathBuf};

use a0lree::prelude::*;

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("a0lree")
        .about("Infers a regular expression from example words via 0-reversible automata")
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .arg(
            Arg::new("examples")
                .help("The example words, use \"\" for the empty word")
                .action(ArgAction::Append)
                .required_unless_present("file")
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Reads one example per line, an empty line stands for the empty word")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("simplify")
                .short('s')
                .long("simplify")
                .help("How much effort is spent on keeping expressions small")
                .value_parser(["off", "identities", "nested", "closures"])
                .default_value("nested"),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .help("Writes a DOT file of the automaton after every stage into the directory")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("render")
                .long("render")
                .help("Renders a PNG of the automaton after every stage into the directory")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let Ok(Some(verbosity)) = matches.try_get_one::<String>("verbosity") else {
        return;
    };

    let level = match verbosity.as_str() {
        "trace" => filter::LevelFilter::TRACE,
        "debug" => filter::LevelFilter::DEBUG,
        _ => filter::LevelFilter::INFO,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn read_examples(matches: &ArgMatches) -> Result<Vec<String>, String> {
    if let Some(path) = matches.get_one::<PathBuf>("file") {
        debug!("reading examples from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?;
        return Ok(contents.lines().map(str::to_string).collect());
    }
    Ok(matches
        .get_many::<String>("examples")
        .into_iter()
        .flatten()
        .cloned()
        .collect())
}

/// Writes every observed stage as a numbered DOT file and, if requested, as a PNG. With
/// `log_tables` set, the transition table of each stage is also logged through [`LogTables`].
struct StageWriter {
    dot: Option<PathBuf>,
    render: Option<PathBuf>,
    log_tables: bool,
    written: usize,
    failures: Vec<String>,
}

impl StageWriter {
    fn from_matches(matches: &ArgMatches) -> Self {
        let log_tables = matches
            .get_one::<String>("verbosity")
            .is_some_and(|level| level == "debug" || level == "trace");
        Self {
            dot: matches.get_one::<PathBuf>("dot").cloned(),
            render: matches.get_one::<PathBuf>("render").cloned(),
            log_tables,
            written: 0,
            failures: vec![],
        }
    }

    fn file_name(&self, dir: &Path, stage: Stage, extension: &str) -> PathBuf {
        dir.join(format!("{:02}-{stage}.{extension}", self.written))
    }
}

impl Observer for StageWriter {
    fn observe(&mut self, stage: Stage, snapshot: &Snapshot) {
        if self.log_tables {
            LogTables.observe(stage, snapshot);
        }
        let name = stage.to_string();
        if let Some(dir) = &self.dot {
            let path = self.file_name(dir, stage, "dot");
            debug!("writing {}", path.display());
            if let Err(e) = std::fs::write(&path, snapshot.dot_representation(&name)) {
                self.failures
                    .push(format!("could not write {}: {e}", path.display()));
            }
        }
        if let Some(dir) = &self.render {
            let path = self.file_name(dir, stage, "png");
            debug!("rendering {}", path.display());
            if let Err(e) = render(snapshot, &name, &path) {
                self.failures
                    .push(format!("could not render {}: {e}", path.display()));
            }
        }
        self.written += 1;
    }

    fn is_enabled(&self) -> bool {
        self.log_tables || self.dot.is_some() || self.render.is_some()
    }
}

#[cfg(feature = "graphviz")]
fn render(snapshot: &Snapshot, name: &str, path: &Path) -> std::io::Result<()> {
    snapshot.render_to_file_name(name, &path.to_string_lossy())
}

#[cfg(not(feature = "graphviz"))]
fn render(_snapshot: &Snapshot, _name: &str, _path: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "rendering requires the graphviz feature",
    ))
}

fn run(matches: &ArgMatches) -> Result<Extraction, String> {
    let words = read_examples(matches)?;
    let sample = FiniteSample::new(words).map_err(|e| e.to_string())?;
    info!(
        "read {} distinct examples over {} symbols, the longest has length {}",
        sample.len(),
        sample.alphabet().size(),
        sample.max_word_len()
    );

    let simplification = matches
        .get_one::<String>("simplify")
        .map(|name| name.parse::<Simplification>())
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    let mut writer = StageWriter::from_matches(matches);
    for dir in writer.dot.iter().chain(writer.render.iter()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("could not create {}: {e}", dir.display()))?;
    }

    let start = std::time::Instant::now();
    let options = Options::default()
        .with_simplification(simplification)
        .with_observe(writer.log_tables);
    let extraction = Pipeline::new(options)
        .infer_observed(&sample, &mut writer)
        .map_err(|e| format!("internal error: {e}"))?;
    info!("inference took {}µs", start.elapsed().as_micros());

    if let Some(failure) = writer.failures.first() {
        return Err(failure.clone());
    }
    Ok(extraction)
}

pub fn main() {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match run(&matches) {
        Ok(extraction) => println!("{extraction}"),
        Err(message) => {
            error!("{message}");
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    }
}
