//! Host-side link of a bundle and the kernel's view of the result.
//!
//! [`link`] lays a directive program out in memory the way the downstream
//! assembler and linker do (little-endian quads, NUL-terminated strings,
//! zero padding for alignment) and resolves every symbolic slot.
//! [`AppTable`] then reads the image back exactly as the kernel loader does:
//! count, start addresses, last end address, name table.

use crate::bundle::{Bundle, Directive, SymbolRef, Value};
use crate::errors::{BundleError, BundleResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const QUAD: usize = 8;

/// A fully resolved bundle image.
#[derive(Debug, Clone)]
pub struct LinkedImage {
    /// Load address of the first byte.
    pub base: u64,
    pub bytes: Vec<u8>,
    /// Label addresses.
    pub symbols: BTreeMap<SymbolRef, u64>,
}

impl LinkedImage {
    pub fn address_of(&self, symbol: &SymbolRef) -> Option<u64> {
        self.symbols.get(symbol).copied()
    }

    /// Bytes between two labels.
    pub fn between(&self, start: &SymbolRef, end: &SymbolRef) -> Option<&[u8]> {
        let s = usize::try_from(self.address_of(start)?.checked_sub(self.base)?).ok()?;
        let e = usize::try_from(self.address_of(end)?.checked_sub(self.base)?).ok()?;
        self.bytes.get(s..e)
    }
}

/// Lay out `program` starting at `base`.
pub fn link(program: &[Directive], base: u64) -> BundleResult<LinkedImage> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut symbols: BTreeMap<SymbolRef, u64> = BTreeMap::new();
    let mut fixups: Vec<(usize, SymbolRef)> = Vec::new();

    for directive in program {
        match directive {
            // The bundle is a single flat data section.
            Directive::Section(_) | Directive::Global(_) => {}
            Directive::Align(log2) => {
                let align = 1u64 << log2;
                let here = load_address(base, bytes.len())?;
                let pad = (align - here % align) % align;
                bytes.resize(bytes.len() + pad as usize, 0);
            }
            Directive::Label(sym) => {
                let addr = load_address(base, bytes.len())?;
                if symbols.insert(sym.clone(), addr).is_some() {
                    return Err(BundleError::DuplicateSymbol {
                        symbol: sym.to_string(),
                    });
                }
            }
            Directive::Quad(Value::Literal(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            Directive::Quad(Value::Symbol(sym)) => {
                fixups.push((bytes.len(), sym.clone()));
                bytes.extend_from_slice(&[0; QUAD]);
            }
            Directive::Str(s) => {
                bytes.extend_from_slice(s.as_bytes());
                bytes.push(0);
            }
            Directive::IncBin(path) => bytes.extend_from_slice(&read_binary(path)?),
        }
    }

    for (offset, sym) in fixups {
        let addr = symbols
            .get(&sym)
            .ok_or_else(|| BundleError::UnresolvedSymbol {
                symbol: sym.to_string(),
            })?;
        bytes[offset..offset + QUAD].copy_from_slice(&addr.to_le_bytes());
    }

    Ok(LinkedImage {
        base,
        bytes,
        symbols,
    })
}

/// Address of `offset` in an image loaded at `base`.
fn load_address(base: u64, offset: usize) -> BundleResult<u64> {
    u64::try_from(offset)
        .ok()
        .and_then(|off| base.checked_add(off))
        .ok_or_else(|| BundleError::malformed(format!("image does not fit above base {base:#x}")))
}

fn read_binary(path: &Path) -> BundleResult<Vec<u8>> {
    std::fs::read(path).map_err(|_| BundleError::SourceBinaryMissing {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
    })
}

/// The application directory as the kernel sees it.
#[derive(Debug)]
pub struct AppTable<'a> {
    image: &'a [u8],
    base: u64,
    /// `[start, end)` load addresses per app.
    bounds: Vec<(u64, u64)>,
    names: Vec<&'a str>,
}

impl<'a> AppTable<'a> {
    /// Parse the header at the start of `image`, loaded at `base`.
    ///
    /// Intermediate payloads end where the next one starts, so they may
    /// carry the alignment padding that precedes their successor.
    pub fn parse(image: &'a [u8], base: u64) -> BundleResult<Self> {
        let count = read_quad(image, 0)?;
        let count = usize::try_from(count)
            .ok()
            .filter(|n| *n <= image.len() / QUAD)
            .ok_or_else(|| BundleError::malformed(format!("implausible app count {count}")))?;

        let slots = if count == 0 { 0 } else { count + 1 };
        let mut addrs = Vec::with_capacity(slots);
        for i in 0..slots {
            addrs.push(read_quad(image, QUAD * (1 + i))?);
        }

        let limit = load_address(base, image.len())?;
        let mut bounds = Vec::with_capacity(count);
        for i in 0..count {
            let (start, end) = (addrs[i], addrs[i + 1]);
            if start > end {
                return Err(BundleError::malformed(format!(
                    "app {i}: start {start:#x} after end {end:#x}"
                )));
            }
            if start < base || end > limit {
                return Err(BundleError::malformed(format!(
                    "app {i}: [{start:#x}, {end:#x}) outside image [{base:#x}, {limit:#x})"
                )));
            }
            bounds.push((start, end));
        }

        let mut names = Vec::with_capacity(count);
        let mut offset = QUAD * (1 + slots);
        for i in 0..count {
            let rest = image
                .get(offset..)
                .ok_or_else(|| BundleError::malformed("name table truncated"))?;
            let len = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| BundleError::malformed(format!("name {i} not terminated")))?;
            let name = std::str::from_utf8(&rest[..len])
                .map_err(|_| BundleError::malformed(format!("name {i} is not UTF-8")))?;
            names.push(name);
            offset += len + 1;
        }

        Ok(Self {
            image,
            base,
            bounds,
            names,
        })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn names(&self) -> &[&'a str] {
        &self.names
    }

    pub fn bounds(&self, index: usize) -> Option<(u64, u64)> {
        self.bounds.get(index).copied()
    }

    /// Payload bytes of app `index`.
    pub fn app(&self, index: usize) -> Option<&'a [u8]> {
        let (start, end) = self.bounds(index)?;
        let s = (start - self.base) as usize;
        let e = (end - self.base) as usize;
        self.image.get(s..e)
    }

    /// First app named `name`.
    pub fn find(&self, name: &str) -> Option<(usize, &'a [u8])> {
        let index = self.names.iter().position(|n| *n == name)?;
        Some((index, self.app(index)?))
    }
}

fn read_quad(image: &[u8], offset: usize) -> BundleResult<u64> {
    let raw: [u8; QUAD] = image
        .get(offset..offset + QUAD)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| BundleError::malformed(format!("header truncated at offset {offset}")))?;
    Ok(u64::from_le_bytes(raw))
}

/// One row of a link map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapRow {
    pub index: usize,
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

/// Resolved addresses of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMap {
    pub base: u64,
    pub count_address: u64,
    pub names_address: u64,
    pub total_size: u64,
    pub apps: Vec<MapRow>,
}

impl LinkMap {
    /// Link `bundle` at `base`, check that the kernel's reader agrees with
    /// the labels, and report every payload's exact extent.
    pub fn build(bundle: &Bundle, base: u64) -> BundleResult<Self> {
        let image = link(&bundle.directives(), base)?;
        let table = AppTable::parse(&image.bytes, base)?;

        let lookup = |sym: &SymbolRef| {
            image
                .address_of(sym)
                .ok_or_else(|| BundleError::UnresolvedSymbol {
                    symbol: sym.to_string(),
                })
        };

        let mut apps = Vec::with_capacity(bundle.count());
        for (index, payload) in bundle.payloads.iter().enumerate() {
            let start = lookup(&payload.start)?;
            let end = lookup(&payload.end)?;
            let seen = table.bounds(index).map(|(s, _)| s);
            if seen != Some(start) || table.names().get(index) != Some(&bundle.names[index].as_str()) {
                return Err(BundleError::malformed(format!(
                    "directory entry {index} does not match label {}",
                    payload.start
                )));
            }
            apps.push(MapRow {
                index,
                name: bundle.names[index].clone(),
                start,
                end,
                size: end - start,
            });
        }

        Ok(Self {
            base,
            count_address: lookup(&bundle.count_symbol)?,
            names_address: lookup(&bundle.names_symbol)?,
            total_size: image.bytes.len() as u64,
            apps,
        })
    }
}
