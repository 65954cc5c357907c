//! Plain-text serialization of the installation store.
//!
//! The on-disk layout is a sectioned key-value / delimited-record file:
//!
//! ```text
//! [SETTINGS]
//! defaultProjectLocation=<path>
//! defaultEngineLocation=<path>
//!
//! [ENGINES]
//! <version>|<true|false>|<installedPathOrEmpty>
//!
//! [PROJECTS]
//! <name>|<path>|<version>|<ISO-8601 date>
//! ```
//!
//! Blank lines and `#` comments are ignored. A `[SECTION]` header
//! switches the active section until the next header. Malformed lines
//! are skipped with a warning rather than failing the whole load, so a
//! partially damaged store still yields everything readable.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;

use crate::project::Project;
use crate::store::{EngineRecord, Settings};

/// Date format used for the project last-opened field.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a store file can carry.
#[derive(Debug, Default, Clone)]
pub(crate) struct Document {
    pub settings: Settings,
    pub engines: Vec<EngineRecord>,
    pub projects: Vec<Project>,
}

/// Sections of the store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Settings,
    Engines,
    Projects,
}

/// Parse the textual store format.
///
/// Never fails: unknown sections, unknown keys and malformed records
/// are skipped line by line.
pub(crate) fn parse(text: &str) -> Document {
    let mut doc = Document::default();
    let mut section = Section::None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line {
            "[SETTINGS]" => {
                section = Section::Settings;
                continue;
            }
            "[ENGINES]" => {
                section = Section::Engines;
                continue;
            }
            "[PROJECTS]" => {
                section = Section::Projects;
                continue;
            }
            _ if line.starts_with('[') => {
                warn!(line = lineno + 1, section = line, "unknown store section");
                section = Section::None;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Settings => parse_setting(&mut doc.settings, line),
            Section::Engines => {
                if let Some(record) = parse_engine(line) {
                    doc.engines.push(record);
                } else {
                    warn!(line = lineno + 1, "skipping malformed engine record");
                }
            }
            Section::Projects => {
                if let Some(project) = parse_project(line) {
                    doc.projects.push(project);
                } else {
                    warn!(line = lineno + 1, "skipping malformed project record");
                }
            }
            Section::None => {
                warn!(line = lineno + 1, "skipping line outside any section");
            }
        }
    }

    doc
}

fn parse_setting(settings: &mut Settings, line: &str) {
    let Some((key, value)) = line.split_once('=') else {
        warn!(line, "skipping malformed setting");
        return;
    };

    match key {
        "defaultProjectLocation" => settings.default_project_dir = PathBuf::from(value),
        "defaultEngineLocation" => settings.default_engine_dir = PathBuf::from(value),
        _ => warn!(key, "skipping unknown setting"),
    }
}

fn parse_engine(line: &str) -> Option<EngineRecord> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 3 {
        return None;
    }

    let installed_path = if parts[2].is_empty() {
        None
    } else {
        Some(PathBuf::from(parts[2]))
    };

    let record = EngineRecord {
        version: parts[0].to_string(),
        installed: parts[1] == "true",
        installed_path,
    };
    // An installed flag at odds with the path field cannot be trusted;
    // the version then falls back to not-installed.
    if !record.is_consistent() {
        return None;
    }
    Some(record)
}

fn parse_project(line: &str) -> Option<Project> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 4 {
        return None;
    }

    let last_opened = NaiveDate::parse_from_str(parts[3], DATE_FORMAT).ok()?;

    Some(Project {
        name: parts[0].to_string(),
        root: PathBuf::from(parts[1]),
        engine_version: parts[2].to_string(),
        last_opened,
    })
}

/// Render the store to its textual form.
pub(crate) fn render(settings: &Settings, engines: &[EngineRecord], projects: &[Project]) -> String {
    let mut out = String::new();

    out.push_str("# Hangar data file\n");
    out.push_str("# Do not edit manually\n\n");

    out.push_str("[SETTINGS]\n");
    let _ = writeln!(
        out,
        "defaultProjectLocation={}",
        settings.default_project_dir.display()
    );
    let _ = writeln!(
        out,
        "defaultEngineLocation={}",
        settings.default_engine_dir.display()
    );
    out.push('\n');

    out.push_str("[ENGINES]\n");
    for record in engines {
        let path = record
            .installed_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "{}|{}|{}", record.version, record.installed, path);
    }
    out.push('\n');

    out.push_str("[PROJECTS]\n");
    for project in projects {
        let _ = writeln!(
            out,
            "{}|{}|{}|{}",
            project.name,
            project.root.display(),
            project.engine_version,
            project.last_opened.format(DATE_FORMAT)
        );
    }

    out
}
