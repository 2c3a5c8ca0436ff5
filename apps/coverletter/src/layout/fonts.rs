//! Font resolution: family name → font file → measured, embeddable font.
//!
//! Standard PDF families need no file. Every other family must resolve to a
//! TrueType or OpenType file on the host; if it does not, rendering fails
//! before anything is drawn. There is no fallback substitution.
//!
//! A `.ttc` collection contributes its first face, copied out into a
//! standalone sfnt so it can be embedded as a simple font.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use ttf_parser::Face;

use crate::layout::font_metrics::{FontMetrics, StandardFont, FIRST_CHAR, LAST_CHAR};
use crate::layout::winansi;

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("System font '{0}' not found. Ensure it is installed or choose another font.")]
    NotFound(String),

    #[error("Unable to read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font file {path} is not a usable TrueType/OpenType font: {reason}")]
    Unusable { path: PathBuf, reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Loaded font
// ────────────────────────────────────────────────────────────────────────────

/// Outline format of an embedded font program, which decides the PDF stream
/// key (`/FontFile2` for glyf outlines, `/FontFile3` + `/OpenType` for CFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFlavor {
    TrueType,
    Cff,
}

/// A font file read into memory together with the descriptor values the PDF
/// font dictionary needs. Metric values are in 1/1000 em.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub postscript_name: String,
    pub data: Vec<u8>,
    pub flavor: OutlineFlavor,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone)]
pub enum FontProgram {
    Standard(StandardFont),
    Embedded(EmbeddedFont),
}

/// Everything the renderer and the PDF writer need to know about the font.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub family: String,
    pub metrics: FontMetrics,
    pub program: FontProgram,
}

// ────────────────────────────────────────────────────────────────────────────
// Resolver
// ────────────────────────────────────────────────────────────────────────────

/// Locates the file for a font family on the host.
pub trait FontResolver: Send + Sync {
    fn resolve(&self, family: &str) -> Result<PathBuf, FontError>;
}

/// Searches well-known font directories (and Spotlight on macOS) for a file
/// named after the family.
#[derive(Debug, Clone)]
pub struct SystemFontResolver {
    search_dirs: Vec<PathBuf>,
}

impl SystemFontResolver {
    /// Resolver over the project `fonts/` directory and the usual macOS and
    /// Linux font directories that exist on this host.
    pub fn new() -> Self {
        let mut dirs = vec![PathBuf::from("fonts")];
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
        dirs.extend(
            [
                "/Library/Fonts",
                "/System/Library/Fonts",
                "/System/Library/Fonts/Supplemental",
                "/usr/share/fonts",
                "/usr/local/share/fonts",
            ]
            .into_iter()
            .map(PathBuf::from),
        );
        Self::with_dirs(dirs)
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs: dirs.into_iter().filter(|d| d.is_dir()).collect(),
        }
    }

    /// Each search directory followed by its immediate subdirectories
    /// (Linux distributions group fonts one level down, e.g. `truetype/`).
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for dir in &self.search_dirs {
            dirs.push(dir.clone());
            if let Ok(entries) = std::fs::read_dir(dir) {
                let mut subdirs: Vec<PathBuf> = entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect();
                subdirs.sort();
                dirs.extend(subdirs);
            }
        }
        dirs
    }
}

impl Default for SystemFontResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResolver for SystemFontResolver {
    fn resolve(&self, family: &str) -> Result<PathBuf, FontError> {
        let stems = file_stems(family);

        #[cfg(target_os = "macos")]
        for stem in &stems {
            for ext in FONT_EXTENSIONS {
                if let Some(path) = spotlight_lookup(&format!("{stem}.{ext}")) {
                    debug!("resolve({family:?}) -> Spotlight {}", path.display());
                    return Ok(path);
                }
            }
        }

        for dir in self.candidate_dirs() {
            for stem in &stems {
                for ext in FONT_EXTENSIONS {
                    let candidate = dir.join(format!("{stem}.{ext}"));
                    if candidate.is_file() {
                        debug!("resolve({family:?}) -> {}", candidate.display());
                        return Ok(candidate);
                    }
                }
            }
        }

        debug!("resolve({family:?}) -> None");
        Err(FontError::NotFound(family.to_string()))
    }
}

/// File-name stems tried for a family, most specific first.
fn file_stems(family: &str) -> Vec<String> {
    let family = family.trim();
    let mut stems = vec![
        family.to_string(),
        family.replace(' ', ""),
        family.replace(' ', "-"),
        format!("{family} Regular"),
        format!("{family}-Regular"),
    ];
    stems.dedup();
    stems
}

#[cfg(target_os = "macos")]
fn spotlight_lookup(filename: &str) -> Option<PathBuf> {
    let query = format!("kMDItemKind == \"Font\" && kMDItemDisplayName == \"{filename}\"");
    let output = match std::process::Command::new("mdfind").arg(&query).output() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("mdfind unavailable: {e}");
            return None;
        }
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| PathBuf::from(line.trim()))
        .find(|path| path.is_file())
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Resolves and loads the font for `family`. Standard families short-circuit
/// to their built-in tables.
pub fn load_font(family: &str, resolver: &dyn FontResolver) -> Result<LoadedFont, FontError> {
    if let Some(standard) = StandardFont::from_family(family) {
        debug!("Using standard PDF font {}", standard.base_font());
        return Ok(LoadedFont {
            family: standard.base_font().to_string(),
            metrics: FontMetrics::standard(standard),
            program: FontProgram::Standard(standard),
        });
    }

    let path = resolver.resolve(family)?;
    let font = load_font_file(family, &path)?;
    info!("Font '{}' loaded from {}", family, path.display());
    Ok(font)
}

/// Reads a TrueType/OpenType file (or the first face of a collection) and
/// measures its WinAnsi glyph advances.
pub fn load_font_file(family: &str, path: &Path) -> Result<LoadedFont, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let unusable = |reason: String| FontError::Unusable {
        path: path.to_path_buf(),
        reason,
    };

    let data = match ttf_parser::fonts_in_collection(&data) {
        Some(count) => {
            debug!("{} is a collection of {count} faces; using the first", path.display());
            extract_collection_face(&data, 0)
                .ok_or_else(|| unusable("truncated font collection".to_string()))?
        }
        None => data,
    };

    let face = Face::parse(&data, 0).map_err(|e| unusable(e.to_string()))?;
    let units = f32::from(face.units_per_em().max(1));
    let scale = |v: f32| v / units * 1000.0;

    let missing = face
        .glyph_index('?')
        .and_then(|gid| face.glyph_hor_advance(gid))
        .map(|adv| scale(f32::from(adv)))
        .unwrap_or(500.0);

    let widths: Vec<f32> = (FIRST_CHAR..=LAST_CHAR)
        .map(|byte| {
            face.glyph_index(winansi::decode_byte(byte))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| scale(f32::from(adv)))
                .unwrap_or(missing)
        })
        .collect();
    let metrics = FontMetrics::from_widths(widths)
        .ok_or_else(|| unusable("width table has the wrong size".to_string()))?;

    let flavor = if face.tables().cff.is_some() {
        OutlineFlavor::Cff
    } else {
        OutlineFlavor::TrueType
    };

    let bb = face.global_bounding_box();
    let embedded = EmbeddedFont {
        postscript_name: postscript_name(family),
        flavor,
        ascent: scale(f32::from(face.ascender())),
        descent: scale(f32::from(face.descender())),
        cap_height: face
            .capital_height()
            .map(|h| scale(f32::from(h)))
            .unwrap_or(700.0),
        bbox: [
            scale(f32::from(bb.x_min)),
            scale(f32::from(bb.y_min)),
            scale(f32::from(bb.x_max)),
            scale(f32::from(bb.y_max)),
        ],
        data,
    };

    Ok(LoadedFont {
        family: family.to_string(),
        metrics,
        program: FontProgram::Embedded(embedded),
    })
}

/// Copies face `index` of a TrueType collection into a standalone sfnt:
/// the face's table directory followed by its tables, 4-byte aligned, with
/// offsets rewritten. Returns `None` if any offset points outside `data`.
fn extract_collection_face(data: &[u8], index: u32) -> Option<Vec<u8>> {
    let read_u16 = |at: usize| data.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]));
    let read_u32 = |at: usize| {
        data.get(at..at + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };

    if data.get(..4)? != b"ttcf" || index >= read_u32(8)? {
        return None;
    }
    let dir = read_u32(12 + 4 * index as usize)? as usize;
    let num_tables = usize::from(read_u16(dir + 4)?);
    let mut out = data.get(dir..dir + 12 + 16 * num_tables)?.to_vec();

    for i in 0..num_tables {
        let record = dir + 12 + 16 * i;
        let offset = read_u32(record + 8)? as usize;
        let length = read_u32(record + 12)? as usize;
        let table = data.get(offset..offset + length)?;

        while out.len() % 4 != 0 {
            out.push(0);
        }
        let new_offset = u32::try_from(out.len()).ok()?.to_be_bytes();
        let slot = 12 + 16 * i + 8;
        out[slot..slot + 4].copy_from_slice(&new_offset);
        out.extend_from_slice(table);
    }
    Some(out)
}

/// PDF names may not contain whitespace; keep the family recognisable.
fn postscript_name(family: &str) -> String {
    family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
