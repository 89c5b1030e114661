use crate::field;
use serde::Serialize;
use serde_json::Value;

/// A package and the total size of all its files on the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPackage {
    pub name: String,
    pub size: i64,
}

/// The registry's largest packages, from the `/stats/` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopPackages {
    /// Total size of every file hosted by the registry.
    pub total_size: i64,
    /// Largest first; equal sizes are ordered by name.
    pub packages: Vec<TopPackage>,
}

impl TopPackages {
    /// Build the ranking from a decoded `/stats/` payload.
    ///
    /// Like [`Package::normalize`](crate::Package::normalize) this never
    /// fails; entries without a usable size count as size `0`.
    pub fn normalize(raw: &Value) -> TopPackages {
        let root = raw.as_object();

        let mut packages: Vec<TopPackage> = field::object(root, "top_packages")
            .map(|top| {
                top.iter()
                    .map(|(name, stats)| TopPackage {
                        name: name.clone(),
                        size: field::integer(stats.as_object(), "size"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        packages.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));

        TopPackages {
            total_size: field::integer(root, "total_packages_size"),
            packages,
        }
    }
}
