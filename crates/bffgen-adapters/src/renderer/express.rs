//! Node.js project renderer: express app with a small fetch-based proxy.

use std::fmt::Write as _;
use std::path::PathBuf;

use bffgen_core::{
    application::ports::GenerationTarget,
    domain::{CommentStyle, ConfigModel, HttpMethod, Scaffold},
};

use super::{millis, quote};

pub const ROUTES_FILE: &str = "src/index.js";
pub const SERVICES_FILE: &str = "src/services.js";

#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressRenderer;

impl ExpressRenderer {
    pub fn render(&self, model: &ConfigModel) -> Vec<GenerationTarget> {
        vec![self.routes(model), self.services(model)]
    }

    fn routes(&self, model: &ConfigModel) -> GenerationTarget {
        let mut region = String::new();
        let mut routes = Vec::new();

        for (i, service) in model.services.values().enumerate() {
            if i > 0 {
                region.push('\n');
            }
            let _ = writeln!(region, "// {} service routes", service.name);
            for endpoint in &service.endpoints {
                let _ = writeln!(
                    region,
                    "app.{}({}, createProxyHandler(services[{}], {}));",
                    express_method(endpoint.method),
                    quote(&express_path(&endpoint.expose_as), '\''),
                    quote(&service.name, '\''),
                    quote(&express_path(&endpoint.path), '\''),
                );
                routes.push(service.route_key(endpoint));
            }
        }

        let port = model.settings.port;
        let footer = format!(
            "
app.use((req, res) => {{
  res.status(404).json({{ error: 'Not found' }});
}});

const port = process.env.PORT || {port};
app.listen(port, () => {{
  console.log(`listening on :${{port}}`);
}});
"
        );

        GenerationTarget {
            path: PathBuf::from(ROUTES_FILE),
            region,
            scaffold: Scaffold::new(INDEX_HEADER, footer),
            comment_style: CommentStyle::Slash,
            routes,
        }
    }

    fn services(&self, model: &ConfigModel) -> GenerationTarget {
        let mut region = String::new();
        for service in model.services.values() {
            let timeout = service.timeout.unwrap_or(model.settings.timeout);
            let retries = service.retries.unwrap_or(model.settings.retries);
            let _ = writeln!(
                region,
                "  {}: {{ baseUrl: {}, timeout: {}, retries: {} }},",
                quote(&service.name, '\''),
                quote(&service.base_url, '\''),
                millis(timeout),
                retries,
            );
        }

        GenerationTarget {
            path: PathBuf::from(SERVICES_FILE),
            region,
            scaffold: Scaffold::new(
                "'use strict';\n\n// Upstream services this BFF proxies to.\nmodule.exports = {\n",
                "};\n",
            ),
            comment_style: CommentStyle::Slash,
            routes: Vec::new(),
        }
    }
}

const INDEX_HEADER: &str = "\
'use strict';

const express = require('express');
const services = require('./services');

const app = express();
app.use(express.json({ limit: '5mb' }));

app.get('/health', (req, res) => {
  res.json({ status: 'ok' });
});

function createProxyHandler(service, backendPath) {
  return async (req, res, next) => {
    const path = backendPath.replace(/:(\\w+)/g, (_, name) => encodeURIComponent(req.params[name]));
    const query = new URLSearchParams(req.query).toString();
    const url = `${service.baseUrl}${path}${query ? `?${query}` : ''}`;
    try {
      const upstream = await fetch(url, {
        method: req.method,
        headers: { 'content-type': 'application/json' },
        body: ['GET', 'HEAD'].includes(req.method) ? undefined : JSON.stringify(req.body),
        signal: AbortSignal.timeout(service.timeout),
      });
      res.status(upstream.status);
      res.set('content-type', upstream.headers.get('content-type') || 'application/json');
      res.send(Buffer.from(await upstream.arrayBuffer()));
    } catch (err) {
      next(err);
    }
  };
}

";

fn express_method(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "get",
        HttpMethod::Post => "post",
        HttpMethod::Put => "put",
        HttpMethod::Patch => "patch",
        HttpMethod::Delete => "delete",
        HttpMethod::Head => "head",
        HttpMethod::Options => "options",
    }
}

/// express spells parameters `:id`; configs may use chi-style `{id}`.
fn express_path(path: &str) -> String {
    path.split('/')
        .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if !name.is_empty() => format!(":{name}"),
            _ => seg.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
