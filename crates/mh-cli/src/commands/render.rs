//! Render command - run the full pipeline and print the results
//!
//! Nothing is deployed and the kubectl context is not checked.

use mh_engine::AppRenderer;

use crate::display;
use crate::error::{CliError, Result};
use crate::session::Session;

pub fn run(session: &Session, json: bool) -> Result<()> {
    let renderer = AppRenderer::new();
    let rendered = session
        .apps
        .iter()
        .map(|app| renderer.render(app, &session.main))
        .collect::<mh_engine::Result<Vec<_>>>()?;

    if json {
        let out = display::rendered_json(&rendered).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", out);
    } else {
        print!("{}", display::rendered_yaml(&rendered));
    }

    Ok(())
}
