//! A realistic payload through the whole pipeline, down to plain text.

use expect_test::expect;
use indoc::indoc;
use pispy_cli::render::render_view;
use pispy_cli::{LookupView, RawPayload, RowKind};

const ATTRS: &str = indoc! {r##"
    {
      "info": {
        "author": "",
        "author_email": "Hynek Schlawack <hs@ox.cx>",
        "description": "# attrs\n\n*attrs* is the Python package.",
        "description_content_type": "text/markdown",
        "home_page": null,
        "keywords": "class, attribute, boilerplate",
        "license": "MIT",
        "name": "attrs",
        "package_url": "https://pypi.org/project/attrs/",
        "project_urls": {
          "Documentation": "https://www.attrs.org/",
          "Changelog": "https://www.attrs.org/en/stable/changelog.html"
        },
        "requires_dist": [
          "importlib-metadata; python_version < \"3.8\"",
          "attrs[tests]; extra == \"cov\"",
          "zope-interface; extra == \"tests\""
        ],
        "requires_python": ">=3.7",
        "summary": "Classes Without Boilerplate",
        "version": "23.1.0",
        "yanked": false,
        "yanked_reason": null
      },
      "urls": [
        {
          "comment_text": "",
          "digests": { "blake2b_256": "f0eb", "md5": "ab12", "sha256": "1f28" },
          "downloads": -1,
          "filename": "attrs-23.1.0-py3-none-any.whl",
          "has_sig": false,
          "md5_digest": "ab12",
          "packagetype": "bdist_wheel",
          "python_version": "py3",
          "size": 61160,
          "upload_time_iso_8601": "2023-04-16T10:07:57.286086Z",
          "url": "https://files.pythonhosted.org/attrs-23.1.0-py3-none-any.whl",
          "yanked": false
        }
      ]
    }
"##};

fn attrs_view() -> LookupView {
    let body = serde_json::from_str(ATTRS).unwrap();
    LookupView::from_outcome("attrs", Ok(RawPayload { status: 200, body }))
}

#[test]
fn attrs_plain_text() {
    expect![[r#"
        == Details ==
        Name: attrs
        Version: 23.1.0
        Summary: Classes Without Boilerplate
        URL: <https://pypi.org/project/attrs/>
        Author Email: Hynek Schlawack <hs@ox.cx>
        Keywords: class, attribute, boilerplate
        License: MIT
        Documentation: <https://www.attrs.org/>
        Changelog: <https://www.attrs.org/en/stable/changelog.html>
        Requires: attrs, importlib-metadata, zope-interface
        Requires Python: >=3.7
        Yanked: No

        == Description ==
        Description:
            # attrs

            *attrs* is the Python package.

        == attrs-23.1.0-py3-none-any.whl ==
        URL: <https://files.pythonhosted.org/attrs-23.1.0-py3-none-any.whl>
        Package Type: bdist_wheel
        Python Version: py3
        Size: 61,160
        MD5 Digest: ab12
        Uploaded: 2023-04-16T10:07:57.286086Z
        Has Signature: No
        Downloads: -1
        Comments: None
        blake2b_256: f0eb
        md5: ab12
        sha256: 1f28
        Yanked: No
        Yanked Reason: None
    "#]]
    .assert_eq(&render_view(&attrs_view()));
}

#[test]
fn attrs_row_kinds() {
    let view = attrs_view();
    let kinds: Vec<(&str, RowKind)> = view.sections[0]
        .rows
        .iter()
        .filter(|row| row.kind != RowKind::PlainText)
        .map(|row| (row.label.as_str(), row.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("URL", RowKind::Link),
            ("Documentation", RowKind::Link),
            ("Changelog", RowKind::Link),
        ]
    );
    assert_eq!(view.sections[1].rows[0].kind, RowKind::LongText);
}
