//! Destroy command - delete each selected app's release

use crate::display;
use crate::error::Result;
use crate::helm;
use crate::session::Session;

pub fn run(session: &Session, purge: bool) -> Result<()> {
    for app in &session.apps {
        display::step("Destroying", &app.id);
        helm::run(&helm::delete_args(&app.id, purge), None)?;
    }

    display::done(&format!("{} app(s) destroyed", session.apps.len()));
    Ok(())
}
