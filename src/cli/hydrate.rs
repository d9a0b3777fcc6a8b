// src/cli/hydrate.rs — On-demand mirror reconciliation

use crate::session::Sessions;

pub fn run(sessions: &Sessions) -> anyhow::Result<()> {
    let synced = sessions.hydrate()?;
    if synced == 0 {
        println!("Session mirror already up to date.");
    } else {
        println!("Synchronized {synced} session(s) from disk.");
    }
    Ok(())
}
