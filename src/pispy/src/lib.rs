//! pispy: look up Python packages on PyPI from the terminal.
//!
//! The data model and its normalizers live in [`pispy_data`] and are
//! re-exported here. With the `cli` feature (on by default) the lookup
//! pipeline, the registry client and the terminal UI are available under
//! [`cli`], and the `pispy` binary is built.
//!
//! ```rust,ignore
//! let package = pispy::Package::from_json_str(body)?;
//! println!("{} {}", package.name, package.version);
//! ```

pub use pispy_data::{
    DistributionArtifact, Error, Package, TopPackage, TopPackages, project_name,
};

#[cfg(feature = "cli")]
pub use pispy_cli as cli;
