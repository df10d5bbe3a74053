//! hscript parsing and validation for hwaf.
//!
//! This crate defines the configuration layer: the YAML normalizer (`value`),
//! the schema validator producing a typed `Configuration` (`hscript`), tag
//! resolution (`tags`), `configure.env` templating (`environ`) and the
//! flattening of the `build` section into ordered actions (`build`).

pub mod build;
pub mod environ;
pub mod error;
pub mod hscript;
pub mod tags;
pub mod value;

pub use build::{extract_actions, Action, BuildItem, BuildRule, BuildSection, NamedRule};
pub use environ::{apply_env, EnvAssignment, EnvMode, Environment, PATH_SEPARATOR};
pub use error::{Mismatch, Shape, ValidationError, ValidationErrors};
pub use hscript::{
    parse_hscript_file, parse_hscript_str, validate, ConfigureSection, Configuration,
    HscriptError, PackageSection, HSCRIPT_FILE,
};
pub use tags::{resolve_tags, TagDecl};
pub use value::{normalize_list, normalize_scalar_or_list};
