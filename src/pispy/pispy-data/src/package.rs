use crate::Error;
use crate::field::{self, Object};
use serde::Serialize;
use serde_json::Value;

/// Metadata for one release of a package, as published on the registry.
///
/// Built by [`Package::normalize`]; every field is populated, with absent
/// registry values replaced by the empty value of the field's type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    pub author: String,
    pub author_email: String,
    pub bugtrack_url: String,
    pub classifiers: Vec<String>,
    pub description: String,
    pub description_content_type: String,
    pub docs_url: String,
    pub download_url: String,
    pub homepage: String,
    pub keywords: Vec<String>,
    pub license: String,
    pub maintainer: String,
    pub maintainer_email: String,
    pub name: String,
    pub package_url: String,
    pub platform: String,
    pub project_url: String,
    /// Named project links (`"Source"`, `"Changelog"`, ...) in registry order.
    pub project_urls: Vec<(String, String)>,
    pub release_url: String,
    /// Raw dependency specifiers, e.g. `"idna<4,>=2.5"`.
    pub requires_dist: Vec<String>,
    pub requires_python: String,
    pub summary: String,
    pub version: String,
    pub yanked: bool,
    pub yanked_reason: String,
    /// Distribution files for this release, in registry order.
    pub urls: Vec<DistributionArtifact>,
}

/// One downloadable file (wheel or sdist) belonging to a [`Package`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionArtifact {
    pub comment_text: String,
    /// Digest algorithm name to hex digest, in registry order.
    pub digests: Vec<(String, String)>,
    pub downloads: i64,
    pub filename: String,
    pub has_sig: bool,
    pub md5_digest: String,
    pub packagetype: String,
    pub python_version: String,
    pub size: i64,
    pub upload_time_iso_8601: String,
    pub url: String,
    pub yanked: bool,
    pub yanked_reason: String,
}

impl Package {
    /// Build a package from a decoded `/pypi/{name}/json` payload.
    ///
    /// Never fails. A payload without an `info` object yields a package whose
    /// fields are all defaults; a payload without `urls` has no artifacts.
    pub fn normalize(raw: &Value) -> Package {
        let root = raw.as_object();
        let info = field::object(root, "info");

        Package {
            author: field::text(info, "author"),
            author_email: field::text(info, "author_email"),
            bugtrack_url: field::text(info, "bugtrack_url"),
            classifiers: field::strings(info, "classifiers"),
            description: field::text(info, "description"),
            description_content_type: field::text(info, "description_content_type"),
            docs_url: field::text(info, "docs_url"),
            download_url: field::text(info, "download_url"),
            homepage: homepage(info),
            keywords: split_keywords(&field::text(info, "keywords")),
            license: field::text(info, "license"),
            maintainer: field::text(info, "maintainer"),
            maintainer_email: field::text(info, "maintainer_email"),
            name: field::text(info, "name"),
            package_url: field::text(info, "package_url"),
            platform: field::text(info, "platform"),
            project_url: field::text(info, "project_url"),
            project_urls: field::pairs(info, "project_urls"),
            release_url: field::text(info, "release_url"),
            requires_dist: field::strings(info, "requires_dist"),
            requires_python: field::text(info, "requires_python"),
            summary: field::text(info, "summary"),
            version: field::text(info, "version"),
            yanked: field::flag(info, "yanked"),
            yanked_reason: field::text(info, "yanked_reason"),
            urls: field::array(root, "urls")
                .iter()
                .map(DistributionArtifact::normalize)
                .collect(),
        }
    }

    /// Parse and normalize a payload from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Package, Error> {
        let raw: Value = serde_json::from_str(json)?;
        Ok(Package::normalize(&raw))
    }
}

impl DistributionArtifact {
    /// Build an artifact from one entry of the payload's `urls` array.
    pub fn normalize(raw: &Value) -> DistributionArtifact {
        let obj: Option<&Object> = raw.as_object();

        DistributionArtifact {
            comment_text: field::text(obj, "comment_text"),
            digests: field::pairs(obj, "digests"),
            downloads: field::integer(obj, "downloads"),
            filename: field::text(obj, "filename"),
            has_sig: field::flag(obj, "has_sig"),
            md5_digest: field::text(obj, "md5_digest"),
            packagetype: field::text(obj, "packagetype"),
            python_version: field::text(obj, "python_version"),
            size: field::integer(obj, "size"),
            upload_time_iso_8601: field::text(obj, "upload_time_iso_8601"),
            url: field::text(obj, "url"),
            yanked: field::flag(obj, "yanked"),
            yanked_reason: field::text(obj, "yanked_reason"),
        }
    }
}

/// The JSON API spells this `home_page`; older mirrors use `homepage`.
fn homepage(info: Option<&Object>) -> String {
    let spelled = field::text(info, "home_page");
    if spelled.is_empty() {
        field::text(info, "homepage")
    } else {
        spelled
    }
}

/// Keywords arrive as a single string separated by spaces, commas, or both.
fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}
