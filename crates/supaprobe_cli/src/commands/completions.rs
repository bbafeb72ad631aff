//! Completions command - prints shell completion scripts.

use clap_complete::Shell;

/// Writes the completion script for `shell` to stdout.
pub fn run(shell: Shell, cmd: &mut clap::Command) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, &mut std::io::stdout());
}
