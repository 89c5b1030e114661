//! Plain-text rendering of lookup views and stats, for non-interactive output.

use crate::assemble::LookupView;
use crate::display::{RowKind, group_thousands};
use pispy_data::TopPackages;
use std::fmt::Write;

/// Render a view as indented plain text, one section after another.
pub fn render_view(view: &LookupView) -> String {
    let mut out = String::new();

    for (i, section) in view.sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "== {} ==", section.title);

        for row in &section.rows {
            let value = match row.kind {
                RowKind::Link => format!("<{}>", row.value),
                RowKind::PlainText | RowKind::LongText => row.value.clone(),
            };

            let mut lines = value.lines();
            match (lines.next(), value.contains('\n')) {
                (Some(first), false) => {
                    let _ = writeln!(out, "{}: {}", row.label, first);
                }
                _ => {
                    let _ = writeln!(out, "{}:", row.label);
                    for line in value.lines() {
                        if line.is_empty() {
                            out.push('\n');
                        } else {
                            let _ = writeln!(out, "    {line}");
                        }
                    }
                }
            }
        }
    }

    out
}

/// Render the top `limit` packages as a right-aligned size column and name.
pub fn render_top_packages(stats: &TopPackages, limit: usize) -> String {
    let mut out = String::new();
    let rows: Vec<(String, &str)> = stats
        .packages
        .iter()
        .take(limit)
        .map(|p| (group_thousands(p.size), p.name.as_str()))
        .collect();
    let width = rows.iter().map(|(size, _)| size.len()).max().unwrap_or(0);

    let _ = writeln!(out, "Total size of all packages: {}", group_thousands(stats.total_size));
    for (rank, (size, name)) in rows.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {:>width$}  {}", rank + 1, size, name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FetchError;
    use expect_test::expect;
    use pispy_data::{Package, TopPackage};
    use serde_json::json;

    #[test]
    fn renders_sections() {
        let package = Package::normalize(&json!({
            "info": {
                "name": "demo",
                "version": "1.0",
                "classifiers": ["License :: OSI Approved", "Programming Language :: Python"],
                "package_url": "https://pypi.org/project/demo/",
                "requires_dist": ["idna<4", "certifi"],
                "description": "Line one\n\nLine three",
                "description_content_type": "text/plain"
            },
            "urls": [{ "filename": "demo-1.0.tar.gz", "size": 2048, "has_sig": true }]
        }));
        let view = LookupView::found("demo", &package);
        expect![[r#"
            == Details ==
            Name: demo
            Version: 1.0
            URL: <https://pypi.org/project/demo/>
            Classifiers:
                License :: OSI Approved
                Programming Language :: Python
            Requires: certifi, idna
            Yanked: No

            == Description ==
            Description:
                Line one

                Line three

            == demo-1.0.tar.gz ==
            URL: None
            Package Type: None
            Python Version: None
            Size: 2,048
            MD5 Digest: None
            Uploaded: None
            Has Signature: Yes
            Downloads: 0
            Comments: None
            Yanked: No
            Yanked Reason: None
        "#]]
        .assert_eq(&render_view(&view));
    }

    #[test]
    fn renders_not_found() {
        let view = LookupView::not_found("nope", &FetchError::NotFound { status: 404 });
        expect![[r#"
            == Not Found ==
            Package: nope
            Reason: The registry has no package by this name.
        "#]]
        .assert_eq(&render_view(&view));
    }

    #[test]
    fn renders_top_packages() {
        let stats = TopPackages {
            total_size: 98765432,
            packages: vec![
                TopPackage { name: "tensorflow".into(), size: 123456789 },
                TopPackage { name: "torch".into(), size: 9876543 },
                TopPackage { name: "tiny".into(), size: 12 },
            ],
        };
        expect![[r#"
            Total size of all packages: 98,765,432
              1. 123,456,789  tensorflow
              2.   9,876,543  torch
        "#]]
        .assert_eq(&render_top_packages(&stats, 2));
    }
}
