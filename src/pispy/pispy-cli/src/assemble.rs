//! Section assembly: turns a [`Package`] into the sections shown to the user.

use crate::display::{
    DisplayRow, DisplaySection, Field, Presentation, RowKind, classify, fixed, is_markdown, link, plain,
};
use crate::registry::{FetchError, RawPayload};
use crate::requires::resolve_requires;
use pispy_data::{DistributionArtifact, Package};
use serde::Serialize;

pub const DETAILS_TITLE: &str = "Details";
pub const DESCRIPTION_TITLE: &str = "Description";
pub const NOT_FOUND_TITLE: &str = "Not Found";

/// Everything the renderer needs for one finished lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupView {
    /// The name as the user asked for it (not the registry's canonical name).
    pub package_name: String,
    pub found: bool,
    pub sections: Vec<DisplaySection>,
}

impl LookupView {
    pub fn found(requested: &str, package: &Package) -> Self {
        Self {
            package_name: requested.to_string(),
            found: true,
            sections: assemble(package),
        }
    }

    pub fn not_found(requested: &str, error: &FetchError) -> Self {
        Self {
            package_name: requested.to_string(),
            found: false,
            sections: vec![not_found_section(requested, error)],
        }
    }

    /// The sentinel for a lookup that ended without any answer at all.
    pub fn interrupted(requested: &str) -> Self {
        Self {
            package_name: requested.to_string(),
            found: false,
            sections: vec![sentinel_section(
                requested,
                "The lookup stopped before the registry answered.".to_string(),
            )],
        }
    }

    /// Build the view for whatever the registry answered.
    pub fn from_outcome(requested: &str, outcome: Result<RawPayload, FetchError>) -> Self {
        match outcome {
            Ok(payload) => Self::found(requested, &Package::normalize(&payload.body)),
            Err(err) => Self::not_found(requested, &err),
        }
    }
}

/// Details, then the description when there is one, then one section per
/// distribution file in registry order.
pub fn assemble(package: &Package) -> Vec<DisplaySection> {
    let mut sections = Vec::with_capacity(package.urls.len() + 2);
    sections.push(details(package));
    sections.extend(description(package));
    sections.extend(package.urls.iter().map(artifact));
    sections
}

fn details(pkg: &Package) -> DisplaySection {
    let mut section = DisplaySection::new(DETAILS_TITLE);

    section.push(plain("Name", pkg.name.as_str()));
    section.push(plain("Version", pkg.version.as_str()));
    section.push(plain("Summary", pkg.summary.as_str()));
    section.push(link("URL", pkg.package_url.as_str()));
    section.push(plain("Author", pkg.author.as_str()));
    section.push(plain("Author Email", pkg.author_email.as_str()));
    section.push(link("Bug Track URL", pkg.bugtrack_url.as_str()));
    section.push(plain("Classifiers", Field::joined(&pkg.classifiers, "\n")));
    section.push(link("Documentation URL", pkg.docs_url.as_str()));
    section.push(link("Download URL", pkg.download_url.as_str()));
    section.push(link("Homepage", pkg.homepage.as_str()));
    section.push(plain("Keywords", Field::joined(&pkg.keywords, ", ")));
    section.push(plain("License", pkg.license.as_str()));
    section.push(plain("Maintainer", pkg.maintainer.as_str()));
    section.push(plain("Maintainer Email", pkg.maintainer_email.as_str()));
    section.push(plain("Platform", pkg.platform.as_str()));
    section.push(link("Project URL", pkg.project_url.as_str()));
    for (label, url) in &pkg.project_urls {
        section.push(link(label, url.as_str()));
    }
    section.push(link("Release URL", pkg.release_url.as_str()));

    let requires = resolve_requires(&pkg.requires_dist);
    section.push(
        plain("Requires", requires.to_string()).map(|row| row.with_references(requires.into_names())),
    );
    section.push(plain("Requires Python", pkg.requires_python.as_str()));
    section.push(plain("Yanked", pkg.yanked));
    section.push(plain("Yanked Reason", pkg.yanked_reason.as_str()));

    section
}

fn description(pkg: &Package) -> Option<DisplaySection> {
    let presentation = Presentation::Description {
        markdown: is_markdown(&pkg.description_content_type),
    };
    let row = classify(DESCRIPTION_TITLE, pkg.description.as_str().into(), presentation)?;
    Some(DisplaySection {
        title: DESCRIPTION_TITLE.to_string(),
        rows: vec![row],
    })
}

/// Artifact sections have a fixed row set; empty values show a placeholder
/// rather than dropping the row.
fn artifact(file: &DistributionArtifact) -> DisplaySection {
    use Presentation::{Link, Plain};

    let mut rows = vec![
        fixed("URL", file.url.as_str(), Link),
        fixed("Package Type", file.packagetype.as_str(), Plain),
        fixed("Python Version", file.python_version.as_str(), Plain),
        fixed("Size", file.size, Plain),
        fixed("MD5 Digest", file.md5_digest.as_str(), Plain),
        fixed("Uploaded", file.upload_time_iso_8601.as_str(), Plain),
        fixed("Has Signature", file.has_sig, Plain),
        fixed("Downloads", file.downloads, Plain),
        fixed("Comments", file.comment_text.as_str(), Plain),
    ];
    rows.extend(
        file.digests
            .iter()
            .map(|(algorithm, digest)| fixed(algorithm, digest.as_str(), Plain)),
    );
    rows.push(fixed("Yanked", file.yanked, Plain));
    rows.push(fixed("Yanked Reason", file.yanked_reason.as_str(), Plain));

    DisplaySection {
        title: file.filename.clone(),
        rows,
    }
}

/// The sentinel shown in place of package data when a lookup fails.
fn not_found_section(requested: &str, error: &FetchError) -> DisplaySection {
    let reason = match error {
        FetchError::NotFound { .. } => "The registry has no package by this name.".to_string(),
        FetchError::Timeout(_) | FetchError::Transport(_) => {
            format!("The registry could not be reached ({error}).")
        }
        FetchError::Malformed(_) => "The registry sent a response that could not be read.".to_string(),
    };
    sentinel_section(requested, reason)
}

fn sentinel_section(requested: &str, reason: String) -> DisplaySection {
    DisplaySection {
        title: NOT_FOUND_TITLE.to_string(),
        rows: vec![
            DisplayRow::new("Package", requested, RowKind::PlainText),
            DisplayRow::new("Reason", reason, RowKind::PlainText),
        ],
    }
}
