use itertools::Itertools;

use super::{Snapshot, StateIndex};

/// Escapes a label so it can be placed inside a double quoted DOT string.
fn sanitize_dot_label(label: &str) -> String {
    label
        .chars()
        .flat_map(|chr| match chr {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            c => vec![c],
        })
        .collect()
}

fn dot_state_ident(state: StateIndex) -> String {
    format!("q{state}")
}

impl Snapshot {
    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    /// Initial states are drawn filled, accepting states with a double circle.
    pub fn dot_representation(&self, name: &str) -> String {
        let header = [
            format!("digraph \"{}\" {{", sanitize_dot_label(name)),
            "rankdir=LR".to_string(),
            "init [label=\"\", shape=point]".to_string(),
            format!("init -> {}", dot_state_ident(self.initial)),
        ];

        let states = self.states.iter().map(|q| {
            let shape = if self.is_accepting(*q) {
                "doublecircle"
            } else {
                "circle"
            };
            let fill = if *q == self.initial {
                ", style=filled, fillcolor=yellow"
            } else {
                ""
            };
            format!(
                "{} [label=<q<SUB>{q}</SUB>>, shape={shape}{fill}]",
                dot_state_ident(*q)
            )
        });

        let transitions = self.transitions.iter().map(|(p, label, q)| {
            format!(
                "{} -> {} [label=\"{}\"]",
                dot_state_ident(*p),
                dot_state_ident(*q),
                sanitize_dot_label(label)
            )
        });

        header
            .into_iter()
            .chain(states)
            .chain(transitions)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// Attempts to render the snapshot to a PNG file with the given filename by invoking the
    /// `dot` executable on a temporary file holding the DOT representation. This method is only
    /// available on the `graphviz` crate feature.
    #[cfg(feature = "graphviz")]
    pub fn render_to_file_name(&self, name: &str, filename: &str) -> Result<(), std::io::Error> {
        use std::io::Write;
        use tracing::trace;

        trace!("Outputting dot and rendering to png");
        let dot = self.dot_representation(name);
        let mut tempfile = tempfile::NamedTempFile::new()?;

        tempfile.write_all(dot.as_bytes())?;
        let tempfile_name = tempfile.path();

        let mut command = std::process::Command::new("dot");
        command
            .arg("-Tpng")
            .arg("-o")
            .arg(filename)
            .arg(tempfile_name);
        run_to_completion(command)
    }
}

/// Runs `command` and turns a non-zero exit status into an error carrying its stderr. The
/// output is collected while waiting, so a chatty process can not fill up the pipe and stall.
#[cfg(feature = "graphviz")]
fn run_to_completion(mut command: std::process::Command) -> Result<(), std::io::Error> {
    let output = command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .spawn()?
        .wait_with_output()?;
    if output.status.success() {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!(
            "{:?} exited with status {}: {}",
            command.get_program(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        ),
    ))
}
