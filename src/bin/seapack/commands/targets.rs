//! `seapack targets` command

use anyhow::Result;

use seapack::ops::explain::{capability_matrix, format_matrix};
use seapack::util::Shell;

pub fn execute(shell: &Shell) -> Result<()> {
    let rows = capability_matrix();
    if shell.is_json() {
        for row in &rows {
            shell.json_event(row);
        }
    } else {
        shell.print(format_matrix(&rows));
    }
    Ok(())
}
