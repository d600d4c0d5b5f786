//! Font discovery for report rendering.
//!
//! `genpdf` embeds TrueType fonts and needs all four styles of a family on
//! disk.  The Roboto family is searched in, in order:
//!
//! 1. the directory passed by the caller (usually `ReportConfig::fonts_dir`),
//! 2. `CUPPING_RADAR_FONTS_DIR`,
//! 3. `assets/fonts` next to the running executable,
//! 4. `assets/fonts` in the crate directory.
//!
//! When none of them holds the files, a system family is used instead:
//! Liberation Sans, then DejaVu Sans, then Arial on Windows.  The system font
//! directory can be overridden with `CUPPING_RADAR_SYSTEM_FONTS_DIR`.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the bundled family.
pub const FONTS_DIR_ENV: &str = "CUPPING_RADAR_FONTS_DIR";

/// Environment variable overriding the system font directory.
pub const SYSTEM_FONTS_DIR_ENV: &str = "CUPPING_RADAR_SYSTEM_FONTS_DIR";

const FONT_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

const LIBERATION_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/liberation-sans",
];

const DEJAVU_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
];

/// A font family installed by the operating system, with its file names.
struct SystemFamily {
    name: &'static str,
    directories: &'static [&'static str],
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "Liberation Sans",
        directories: LIBERATION_DIRECTORIES,
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    SystemFamily {
        name: "DejaVu Sans",
        directories: DEJAVU_DIRECTORIES,
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
    SystemFamily {
        name: "Arial",
        directories: &[],
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
];

impl SystemFamily {
    fn files(&self) -> [(&'static str, &'static str); 4] {
        [
            ("regular", self.regular),
            ("bold", self.bold),
            ("italic", self.italic),
            ("bold italic", self.bold_italic),
        ]
    }

    fn is_complete(&self, directory: &Path) -> bool {
        self.files()
            .iter()
            .all(|(_, file)| directory.join(file).is_file())
    }

    fn load(&self, directory: &Path) -> Result<FontFamily<FontData>, Error> {
        let load = |style: &str, file: &str| {
            let path = directory.join(file);
            FontData::load(&path, None).map_err(|err| {
                Error::new(
                    format!(
                        "Failed to load {} {} font at {}: {}",
                        self.name,
                        style,
                        path.display(),
                        err
                    ),
                    io::Error::new(io::ErrorKind::Other, err.to_string()),
                )
            })
        };

        Ok(FontFamily {
            regular: load("regular", self.regular)?,
            bold: load("bold", self.bold)?,
            italic: load("italic", self.italic)?,
            bold_italic: load("bold italic", self.bold_italic)?,
        })
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit {
        push_unique(&mut candidates, path.to_path_buf());
    }

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(&mut candidates, path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(&mut candidates, bundled_fonts_source_dir());
    candidates
}

/// Returns the `assets/fonts` directory of the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn missing_family_files(path: &Path, family: &str) -> Vec<PathBuf> {
    FONT_STYLES
        .iter()
        .map(|style| path.join(format!("{family}-{style}.ttf")))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(explicit) {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_family_files(&candidate, DEFAULT_FONT_FAMILY_NAME);
        if missing.is_empty() {
            return Ok(candidate);
        }

        let missing_list = missing
            .iter()
            .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
            .collect::<Vec<_>>()
            .join(", ");
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing_list
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font family. Checked: {}. Set {} or configure fonts_dir.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_family(directory: &Path, family: &str) -> Result<FontFamily<FontData>, Error> {
    fonts::from_files(directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            let candidate = root.join("Fonts");
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Finds the first complete system family.
///
/// `override_dir` is searched for every family before the family's own
/// directories and the Windows font directory.
fn find_system_family(override_dir: Option<&Path>) -> Option<(&'static SystemFamily, PathBuf)> {
    let windows_dir = windows_font_directory();
    for family in SYSTEM_FAMILIES {
        let directories = override_dir
            .map(Path::to_path_buf)
            .into_iter()
            .chain(family.directories.iter().map(PathBuf::from))
            .chain(windows_dir.clone());
        for directory in directories {
            if family.is_complete(&directory) {
                return Some((family, directory));
            }
        }
    }
    None
}

fn system_fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let override_dir = env_path(SYSTEM_FONTS_DIR_ENV);
    match find_system_family(override_dir.as_deref()) {
        Some((family, directory)) => {
            debug!("Using {} fonts from {}", family.name, directory.display());
            family.load(&directory)
        }
        None => Err(Error::new(
            "No system font family found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
        )),
    }
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the font family used for reports.
///
/// Prefers Roboto from `explicit` or the default search path and falls back
/// to a system family when no Roboto files are found.
pub fn font_family(explicit: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let primary = resolve_font_directory(explicit)
        .and_then(|directory| load_family(&directory, DEFAULT_FONT_FAMILY_NAME));

    match primary {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match system_fallback_font_family() {
            Ok(fallback) => {
                warn!("{} fonts unavailable ({}); using system fonts.", DEFAULT_FONT_FAMILY_NAME, err);
                Ok(fallback)
            }
            Err(fallback_err) => Err(Error::new(
                format!(
                    "{} fonts unavailable ({}) and system fallback failed: {}",
                    DEFAULT_FONT_FAMILY_NAME, err, fallback_err
                ),
                io::Error::new(io::ErrorKind::NotFound, "report fonts are not available"),
            )),
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether a usable font family can be found without loading it.
pub fn fonts_available(explicit: Option<&Path>) -> bool {
    resolve_font_directory(explicit).is_ok()
        || find_system_family(env_path(SYSTEM_FONTS_DIR_ENV).as_deref()).is_some()
}
