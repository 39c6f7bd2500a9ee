//! Go project renderer: chi router with reverse-proxy handlers.

use std::fmt::Write as _;
use std::path::PathBuf;

use bffgen_core::{
    application::ports::GenerationTarget,
    domain::{CommentStyle, ConfigModel, HttpMethod, Scaffold},
};

use super::{millis, quote};

pub const ROUTES_FILE: &str = "cmd/server/main.go";
pub const SERVICES_FILE: &str = "internal/services/services.go";

#[derive(Debug, Default, Clone, Copy)]
pub struct GoChiRenderer;

impl GoChiRenderer {
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
            let _ = writeln!(region, "\t// {} service routes", service.name);
            for endpoint in &service.endpoints {
                let _ = writeln!(
                    region,
                    "\tr.{}({}, createProxyHandler({}, {}))",
                    chi_method(endpoint.method),
                    quote(&chi_path(&endpoint.expose_as), '"'),
                    quote(&service.base_url, '"'),
                    quote(&chi_path(&endpoint.path), '"'),
                );
                routes.push(service.route_key(endpoint));
            }
        }

        GenerationTarget {
            path: PathBuf::from(ROUTES_FILE),
            region,
            scaffold: Scaffold::new(main_header(model), main_footer(model)),
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
                "\t{}: {{BaseURL: {}, Timeout: {} * time.Millisecond, Retries: {}}},",
                quote(&service.name, '"'),
                quote(&service.base_url, '"'),
                millis(timeout),
                retries,
            );
        }

        let header = "\
// Package services lists the upstream services this BFF proxies to.
package services

import \"time\"

// Service describes one upstream.
type Service struct {
\tBaseURL string
\tTimeout time.Duration
\tRetries int
}

// All upstreams by name.
var All = map[string]Service{
";
        GenerationTarget {
            path: PathBuf::from(SERVICES_FILE),
            region,
            scaffold: Scaffold::new(header, "}\n"),
            comment_style: CommentStyle::Slash,
            routes: Vec::new(),
        }
    }
}

fn chi_method(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "Get",
        HttpMethod::Post => "Post",
        HttpMethod::Put => "Put",
        HttpMethod::Patch => "Patch",
        HttpMethod::Delete => "Delete",
        HttpMethod::Head => "Head",
        HttpMethod::Options => "Options",
    }
}

/// chi spells parameters `{id}`; configs may use express-style `:id`.
fn chi_path(path: &str) -> String {
    path.split('/')
        .map(|seg| match seg.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => seg.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn main_header(model: &ConfigModel) -> String {
    let name = model.project_name.as_deref().unwrap_or("bff");
    format!(
        "\
// Command server runs the {name} backend-for-frontend.
package main

import (
\t\"fmt\"
\t\"log\"
\t\"net/http\"
\t\"net/http/httputil\"
\t\"net/url\"
\t\"strings\"

\t\"github.com/go-chi/chi/v5\"
\t\"github.com/go-chi/chi/v5/middleware\"
)

func main() {{
\tr := chi.NewRouter()
\tr.Use(middleware.RequestID)
\tr.Use(middleware.RealIP)
\tr.Use(middleware.Logger)
\tr.Use(middleware.Recoverer)

\tr.Get(\"/health\", func(w http.ResponseWriter, r *http.Request) {{
\t\tw.WriteHeader(http.StatusOK)
\t\tfmt.Fprint(w, \"ok\")
\t}})

"
    )
}

fn main_footer(model: &ConfigModel) -> String {
    let port = model.settings.port;
    format!(
        "
\tlog.Printf(\"listening on :{port}\")
\tlog.Fatal(http.ListenAndServe(\":{port}\", r))
}}

func createProxyHandler(backendURL, backendPath string) http.HandlerFunc {{
\ttarget, err := url.Parse(backendURL)
\tif err != nil {{
\t\tlog.Fatalf(\"invalid backend URL %q: %v\", backendURL, err)
\t}}
\tproxy := httputil.NewSingleHostReverseProxy(target)
\treturn func(w http.ResponseWriter, r *http.Request) {{
\t\tpath := backendPath
\t\tfor _, key := range chi.RouteContext(r.Context()).URLParams.Keys {{
\t\t\tpath = strings.ReplaceAll(path, \"{{\"+key+\"}}\", chi.URLParam(r, key))
\t\t}}
\t\tr.URL.Path = path
\t\tr.Host = target.Host
\t\tproxy.ServeHTTP(w, r)
\t}}
}}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bffgen_core::domain::{ConfigFormat, MarkerSplicer};

    const CONFIG: &str = r#"
services:
  users:
    baseUrl: http://localhost:4000
    timeout: 5s
    endpoints:
      - name: list-users
        path: /users
        method: GET
        exposeAs: /api/users
      - name: get-user
        path: /users/:id
        method: GET
        exposeAs: /api/users/:id
  orders:
    baseUrl: http://localhost:4001
    endpoints:
      - { name: create, path: /orders, method: POST, exposeAs: /api/orders }
settings:
  port: 9090
"#;

    fn model() -> ConfigModel {
        ConfigModel::parse(CONFIG, ConfigFormat::Yaml).unwrap()
    }

    #[test]
    fn routes_region_groups_by_service_in_name_order() {
        let targets = GoChiRenderer.render(&model());
        let region = &targets[0].region;

        assert_eq!(
            region,
            "\t// orders service routes\n\
             \tr.Post(\"/api/orders\", createProxyHandler(\"http://localhost:4001\", \"/orders\"))\n\
             \n\
             \t// users service routes\n\
             \tr.Get(\"/api/users\", createProxyHandler(\"http://localhost:4000\", \"/users\"))\n\
             \tr.Get(\"/api/users/{id}\", createProxyHandler(\"http://localhost:4000\", \"/users/{id}\"))\n"
        );
        assert_eq!(targets[0].routes.len(), 3);
    }

    #[test]
    fn scaffold_uses_configured_port() {
        let target = &GoChiRenderer.render(&model())[0];
        assert!(target.scaffold.footer.contains("http.ListenAndServe(\":9090\", r)"));
    }

    #[test]
    fn fresh_file_has_one_region_inside_main() {
        let target = &GoChiRenderer.render(&model())[0];
        let file = MarkerSplicer::new(CommentStyle::Slash)
            .splice(None, &target.region, &target.scaffold)
            .unwrap();

        let begin = file.find("// bffgen:begin").unwrap();
        let end = file.find("// bffgen:end").unwrap();
        assert!(file.find("func main()").unwrap() < begin);
        assert!(end < file.find("ListenAndServe").unwrap());
    }

    #[test]
    fn services_region_applies_defaults() {
        let targets = GoChiRenderer.render(&model());
        let services = &targets[1];
        assert!(services.routes.is_empty());
        assert!(services.region.contains(
            "\t\"users\": {BaseURL: \"http://localhost:4000\", Timeout: 5000 * time.Millisecond, Retries: 3},"
        ));
        assert!(services.region.contains("Timeout: 30000 * time.Millisecond"));
    }

    #[test]
    fn colon_params_become_braces() {
        assert_eq!(chi_path("/users/:id/posts/:post"), "/users/{id}/posts/{post}");
        assert_eq!(chi_path("/users/{id}"), "/users/{id}");
    }
}
