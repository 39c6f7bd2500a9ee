//! Built-in route renderers.
//!
//! Each project family gets a minimal renderer so generated projects run out
//! of the box. The interesting output is the region text; the scaffold is
//! only written once, when a file is first created.

mod express;
mod go_chi;

use std::time::Duration;

use tracing::{debug, instrument};

use bffgen_core::{
    application::ports::{GenerationTarget, RouteRenderer},
    domain::{ConfigModel, ProjectType},
};

pub use express::ExpressRenderer;
pub use go_chi::GoChiRenderer;

/// Dispatches to the renderer matching the model's project type.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinRenderer {
    go: GoChiRenderer,
    node: ExpressRenderer,
}

impl BuiltinRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteRenderer for BuiltinRenderer {
    #[instrument(skip_all, fields(project_type = %model.project_type))]
    fn render(&self, model: &ConfigModel) -> Vec<GenerationTarget> {
        let targets = match model.project_type {
            ProjectType::Go => self.go.render(model),
            ProjectType::NodeJs => self.node.render(model),
        };
        debug!(targets = targets.len(), routes = model.route_count(), "Rendered");
        targets
    }
}

/// Whole milliseconds, saturating.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Escape for a double- or single-quoted string literal in Go or JS.
pub(crate) fn quote(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
