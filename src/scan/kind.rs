//! File classification by name and extension.

use std::path::Path;

/// Extensions whose contents are a parsed data value.
pub const DATA_EXTENSIONS: [&str; 2] = ["json", "jsonc"];

/// Extensions resolved through a module loader.
pub const MODULE_EXTENSIONS: [&str; 4] = ["ts", "js", "mjs", "cjs"];

/// Directory-config lookup order; the first existing file wins.
pub const CONFIG_EXTENSIONS: [&str; 6] = ["ts", "js", "mjs", "cjs", "toml", "json"];

const CONFIG_STEM: &str = "index.config";
const DECLARATION_SUFFIX: &str = ".d.ts";

/// What a file on disk is, as far as route discovery cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    DirectoryConfig,
    Data,
    Module,
    Unsupported,
}

impl FileKind {
    pub fn is_route_source(&self) -> bool {
        matches!(self, FileKind::Data | FileKind::Module)
    }
}

/// Classify a file path.
pub fn classify(path: &Path) -> FileKind {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return FileKind::Unsupported;
    };

    if is_directory_config_name(name) {
        return FileKind::DirectoryConfig;
    }
    if name.ends_with(DECLARATION_SUFFIX) {
        return FileKind::Unsupported;
    }

    match extension(name) {
        Some(ext) if DATA_EXTENSIONS.contains(&ext.as_str()) => FileKind::Data,
        Some(ext) if MODULE_EXTENSIONS.contains(&ext.as_str()) => FileKind::Module,
        _ => FileKind::Unsupported,
    }
}

/// True for `index.config.<ext>` with a recognised config extension.
pub fn is_directory_config_name(name: &str) -> bool {
    name.strip_prefix(CONFIG_STEM)
        .and_then(|rest| rest.strip_prefix('.'))
        .map(|ext| CONFIG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Candidate config file names for a directory, in lookup order.
pub fn config_file_names() -> impl Iterator<Item = String> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", CONFIG_STEM, ext))
}

/// Lowercased extension of a file name.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}
