//! Status command - show helm's status for each selected app

use crate::error::Result;
use crate::helm;
use crate::session::Session;

pub fn run(session: &Session) -> Result<()> {
    for app in &session.apps {
        helm::run(&helm::status_args(&app.id), None)?;
    }
    Ok(())
}
