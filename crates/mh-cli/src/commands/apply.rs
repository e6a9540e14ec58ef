//! Apply command - render each app and hand its overrides to `helm upgrade`
//!
//! Also backs `simulate`, which sets `simulate` on the CLI layer.

use mh_engine::AppRenderer;

use crate::display;
use crate::error::Result;
use crate::helm;
use crate::session::Session;

pub fn run(session: &Session) -> Result<()> {
    let renderer = AppRenderer::new();

    for app in &session.apps {
        let rendered = renderer.render(app, &session.main)?;

        if app.config.print_rendered {
            print!("{}", rendered.overrides);
        }

        let simulate = app.config.simulate;
        display::step(if simulate { "Simulating" } else { "Applying" }, &app.id);

        let args = helm::upgrade_args(&rendered, simulate);
        helm::run(&args, Some(rendered.overrides.as_bytes()))?;
    }

    display::done(&format!("{} app(s) processed", session.apps.len()));
    Ok(())
}
