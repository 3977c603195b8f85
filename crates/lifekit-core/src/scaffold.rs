//! Project scaffolding from built-in or user templates.
//!
//! User templates are plain directories under `<home>/templates/<name>/`; a
//! user template shadows a built-in one of the same name. File paths and
//! contents may use `{{name}}`, `{{date}}` and `{{year}}`.

use crate::error::{LifeError, Result};
use crate::io;
use crate::paths;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Builtin,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateFile {
    /// Relative path, may contain placeholders.
    pub path: String,
    #[serde(skip)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub name: String,
    pub description: String,
    pub origin: Origin,
    pub files: Vec<TemplateFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Built-in templates
// ---------------------------------------------------------------------------

const SCRIPT_SH: &str = r#"#!/usr/bin/env bash
# {{name}}: created {{date}}
set -euo pipefail

usage() {
    echo "usage: {{name}} [args...]"
}

main() {
    if [[ "${1:-}" == "-h" || "${1:-}" == "--help" ]]; then
        usage
        exit 0
    fi
    echo "{{name}}: hello"
}

main "$@"
"#;

const PYTHON_MAIN: &str = r#"#!/usr/bin/env python3
"""{{name}}: created {{date}}."""

import argparse


def main() -> None:
    parser = argparse.ArgumentParser(prog="{{name}}")
    parser.parse_args()
    print("Hello from {{name}}")


if __name__ == "__main__":
    main()
"#;

const PYTHON_REQUIREMENTS: &str = "";

const NODE_PACKAGE: &str = r#"{
  "name": "{{name}}",
  "version": "0.1.0",
  "private": true,
  "main": "index.js",
  "scripts": {
    "start": "node index.js"
  }
}
"#;

const NODE_INDEX: &str = r#"console.log("Hello from {{name}}");
"#;

const WEB_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{name}}</title>
  <link rel="stylesheet" href="style.css">
</head>
<body>
  <h1>{{name}}</h1>
  <script src="main.js"></script>
</body>
</html>
"#;

const WEB_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  margin: 2rem auto;
  max-width: 40rem;
}
"#;

const WEB_JS: &str = r#"document.title = "{{name}}";
"#;

const NOTES_INDEX: &str = r#"# {{name}}

Started {{date}}.

## Ideas

## Links

## Log
"#;

const RUST_CARGO: &str = r#"[package]
name = "{{name}}"
version = "0.1.0"
edition = "2021"

[dependencies]
"#;

const RUST_MAIN: &str = r#"fn main() {
    println!("Hello from {{name}}");
}
"#;

const GITIGNORE_NODE: &str = "node_modules/\n";
const GITIGNORE_PYTHON: &str = "__pycache__/\n.venv/\n";
const GITIGNORE_RUST: &str = "/target\n";

const README: &str = r#"# {{name}}

Created {{date}}.
"#;

fn file(path: &str, content: &str) -> TemplateFile {
    TemplateFile {
        path: path.to_string(),
        content: content.to_string(),
    }
}

fn builtin(name: &str, description: &str, files: Vec<TemplateFile>) -> Template {
    Template {
        name: name.to_string(),
        description: description.to_string(),
        origin: Origin::Builtin,
        files,
    }
}

pub fn builtins() -> Vec<Template> {
    vec![
        builtin(
            "script",
            "Bash script with usage and strict mode",
            vec![file("{{name}}.sh", SCRIPT_SH), file("README.md", README)],
        ),
        builtin(
            "python",
            "Python command-line program",
            vec![
                file("main.py", PYTHON_MAIN),
                file("requirements.txt", PYTHON_REQUIREMENTS),
                file(".gitignore", GITIGNORE_PYTHON),
                file("README.md", README),
            ],
        ),
        builtin(
            "node",
            "Node.js package",
            vec![
                file("package.json", NODE_PACKAGE),
                file("index.js", NODE_INDEX),
                file(".gitignore", GITIGNORE_NODE),
                file("README.md", README),
            ],
        ),
        builtin(
            "web",
            "Static HTML/CSS/JS page",
            vec![
                file("index.html", WEB_INDEX),
                file("style.css", WEB_CSS),
                file("main.js", WEB_JS),
            ],
        ),
        builtin(
            "notes",
            "Markdown notes folder",
            vec![file("index.md", NOTES_INDEX)],
        ),
        builtin(
            "rust",
            "Rust binary crate",
            vec![
                file("Cargo.toml", RUST_CARGO),
                file("src/main.rs", RUST_MAIN),
                file(".gitignore", GITIGNORE_RUST),
                file("README.md", README),
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// User templates
// ---------------------------------------------------------------------------

fn load_user(dir: &Path, name: &str) -> Result<Template> {
    let mut files = Vec::new();
    collect(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(Template {
        name: name.to_string(),
        description: format!("user template in {}", dir.display()),
        origin: Origin::User,
        files,
    })
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<TemplateFile>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(root, &path, out)?;
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        match std::fs::read_to_string(&path) {
            Ok(content) => out.push(TemplateFile { path: rel, content }),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "skipping unreadable template file"
                )
            }
        }
    }
    Ok(())
}

fn user_templates(home: &Path) -> Result<Vec<Template>> {
    let dir = paths::templates_dir(home);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push(load_user(&path, &name)?);
    }
    Ok(out)
}

/// Every available template, user templates shadowing built-ins, sorted by
/// name.
pub fn list(home: &Path) -> Result<Vec<Template>> {
    let user = user_templates(home)?;
    let mut all: Vec<Template> = builtins()
        .into_iter()
        .filter(|b| !user.iter().any(|u| u.name == b.name))
        .collect();
    all.extend(user);
    all.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(all)
}

pub fn find(home: &Path, name: &str) -> Result<Template> {
    list(home)?
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| LifeError::not_found("template", name))
}

pub fn render(text: &str, name: &str, date: NaiveDate) -> String {
    text.replace("{{name}}", name)
        .replace("{{date}}", &date.format("%Y-%m-%d").to_string())
        .replace("{{year}}", &date.year().to_string())
}

/// Create `<dir>/<name>` from `template`. Fails if the target already exists.
pub fn create(
    home: &Path,
    template: &str,
    name: &str,
    dir: &Path,
    date: NaiveDate,
) -> Result<Created> {
    paths::validate_slug(name)?;
    let template = find(home, template)?;
    let root = dir.join(name);
    if root.exists() {
        return Err(LifeError::exists("directory", root.display()));
    }
    io::ensure_dir(&root)?;
    let mut files = Vec::new();
    for f in &template.files {
        let rel = render(&f.path, name, date);
        if Path::new(&rel)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(LifeError::InvalidInput(format!(
                "template file '{rel}' escapes the project directory"
            )));
        }
        let path = root.join(&rel);
        io::atomic_write(&path, render(&f.content, name, date).as_bytes())?;
        if f.content.starts_with("#!") {
            make_executable(&path)?;
        }
        files.push(path);
    }
    tracing::debug!(template = %template.name, root = %root.display(), "scaffolded project");
    Ok(Created { root, files })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 9).unwrap()
    }

    #[test]
    fn builtin_names() {
        let names: Vec<String> = builtins().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["script", "python", "node", "web", "notes", "rust"]);
    }

    #[test]
    fn render_placeholders() {
        assert_eq!(
            render("{{name}} {{date}} {{year}}", "demo", date()),
            "demo 2024-07-09 2024"
        );
    }

    #[test]
    fn create_rust_project() {
        let home = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let created = create(home.path(), "rust", "demo-app", out.path(), date()).unwrap();
        assert_eq!(created.root, out.path().join("demo-app"));
        let cargo = std::fs::read_to_string(created.root.join("Cargo.toml")).unwrap();
        assert!(cargo.contains("name = \"demo-app\""));
        assert!(created.root.join("src/main.rs").exists());
    }

    #[cfg(unix)]
    #[test]
    fn script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let created = create(home.path(), "script", "tidy", out.path(), date()).unwrap();
        let script = created.root.join("tidy.sh");
        let mode = std::fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn refuses_existing_target_and_bad_names() {
        let home = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::create_dir(out.path().join("taken")).unwrap();
        assert!(matches!(
            create(home.path(), "notes", "taken", out.path(), date()),
            Err(LifeError::AlreadyExists { .. })
        ));
        assert!(matches!(
            create(home.path(), "notes", "Bad Name", out.path(), date()),
            Err(LifeError::InvalidSlug(_))
        ));
        assert!(matches!(
            create(home.path(), "nope", "ok", out.path(), date()),
            Err(LifeError::NotFound { .. })
        ));
    }

    #[test]
    fn user_template_shadows_builtin() {
        let home = TempDir::new().unwrap();
        let tpl = paths::templates_dir(home.path()).join("notes");
        std::fs::create_dir_all(tpl.join("docs")).unwrap();
        std::fs::write(tpl.join("docs/{{name}}.md"), "# {{name}} ({{year}})\n").unwrap();

        let all = list(home.path()).unwrap();
        let notes: Vec<&Template> = all.iter().filter(|t| t.name == "notes").collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].origin, Origin::User);

        let out = TempDir::new().unwrap();
        let created = create(home.path(), "notes", "ideas", out.path(), date()).unwrap();
        let text = std::fs::read_to_string(created.root.join("docs/ideas.md")).unwrap();
        assert_eq!(text, "# ideas (2024)\n");
    }
}
