use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::{debug, info};

use crate::constants::MASK_ALPHA_THRESHOLD;
use crate::error::{AssetLoadError, LookupError};
use crate::types::Rect;

pub type Rgba = [u8; 4];

/// Transparency rule of a sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorKey {
    /// Transparency comes from the alpha channel.
    #[default]
    None,
    /// Pixels of exactly this colour are transparent.
    Rgb(u8, u8, u8),
}

impl ColorKey {
    pub fn is_opaque(&self, pixel: Rgba) -> bool {
        match *self {
            ColorKey::None => pixel[3] > MASK_ALPHA_THRESHOLD,
            ColorKey::Rgb(r, g, b) => [pixel[0], pixel[1], pixel[2]] != [r, g, b],
        }
    }
}

/// A decoded image, row-major RGBA.
#[derive(Debug)]
pub struct SpriteSheet {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    colorkey: ColorKey,
}

impl SpriteSheet {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>, colorkey: ColorKey) -> Result<Self, AssetLoadError> {
        if pixels.len() != width as usize * height as usize {
            return Err(AssetLoadError::PixelCount { width, height, actual: pixels.len() });
        }
        Ok(SpriteSheet { width, height, pixels, colorkey })
    }

    /// Sheet of one colour; handy as a canvas for procedurally drawn sprites.
    pub fn filled(width: u32, height: u32, fill: Rgba, colorkey: ColorKey) -> Self {
        SpriteSheet {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
            colorkey,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }
}

/// Opaque-pixel bitmap of one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn from_region(sheet: &SpriteSheet, rect: Rect) -> Self {
        let width = rect.width.max(0) as u32;
        let height = rect.height.max(0) as u32;
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let opaque = sheet
                    .pixel(rect.left as u32 + x, rect.top as u32 + y)
                    .is_some_and(|p| sheet.colorkey.is_opaque(p));
                bits.push(opaque);
            }
        }
        Mask { width, height, bits }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// True if any set bit of `other`, placed at `offset` relative to this
    /// mask's origin, lands on a set bit of this mask.
    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        let (dx, dy) = offset;
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (self.width as i32).min(dx + other.width as i32);
        let y1 = (self.height as i32).min(dy + other.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - dx, y - dy) {
                    return true;
                }
            }
        }
        false
    }
}

/// Read-only view of one frame inside a shared sheet.
#[derive(Clone, Debug)]
pub struct Sprite {
    sheet: Rc<SpriteSheet>,
    rect: Rect,
    mask: Rc<Mask>,
}

impl Sprite {
    fn new(sheet: Rc<SpriteSheet>, rect: Rect) -> Self {
        let mask = Rc::new(Mask::from_region(&sheet, rect));
        Sprite { sheet, rect, mask }
    }

    /// Location of the frame in the sheet.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn width(&self) -> i32 {
        self.rect.width
    }

    pub fn height(&self) -> i32 {
        self.rect.height
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Pixel in frame-local coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x as i32 >= self.rect.width || y as i32 >= self.rect.height {
            return None;
        }
        self.sheet.pixel(self.rect.left as u32 + x, self.rect.top as u32 + y)
    }
}

/// Frames of one sequence ordered by index.
#[derive(Debug)]
pub struct Sequence {
    name: String,
    frames: BTreeMap<u32, Sprite>,
}

impl Sequence {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame by its manifest index.
    pub fn get(&self, index: u32) -> Option<&Sprite> {
        self.frames.get(&index)
    }

    /// Frame by position in index order, independent of gaps in the indices.
    pub fn nth(&self, position: usize) -> Option<&Sprite> {
        self.frames.values().nth(position)
    }

    pub fn frame(&self, index: u32) -> Result<&Sprite, LookupError> {
        self.get(index).ok_or_else(|| LookupError::MissingFrame { sequence: self.name.clone(), index })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Sprite)> {
        self.frames.iter().map(|(index, sprite)| (*index, sprite))
    }
}

// --- Sprite atlas ---
// Manifest shape: { "rocks": { "0": [left, top, width, height], ... }, ... }
// Built once, then shared behind an `Rc`.
type Manifest = BTreeMap<String, BTreeMap<String, [i64; 4]>>;

pub struct SpriteAtlas {
    sheet: Rc<SpriteSheet>,
    sequences: HashMap<String, Rc<Sequence>>,
}

impl SpriteAtlas {
    pub fn load(manifest_path: impl AsRef<Path>, sheet: SpriteSheet) -> Result<Self, AssetLoadError> {
        let path = manifest_path.as_ref();
        info!("Loading sprite manifest {}", path.display());
        let json = fs::read_to_string(path).map_err(|source| AssetLoadError::Io { path: path.to_path_buf(), source })?;
        Self::from_manifest_str(&json, sheet)
    }

    pub fn from_manifest_str(json: &str, sheet: SpriteSheet) -> Result<Self, AssetLoadError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let sheet = Rc::new(sheet);
        let mut sequences = HashMap::with_capacity(manifest.len());

        for (name, entries) in manifest {
            let mut frames = BTreeMap::new();
            for (key, [left, top, width, height]) in entries {
                let index: u32 = key
                    .trim()
                    .parse()
                    .map_err(|_| AssetLoadError::InvalidIndex { sequence: name.clone(), index: key.clone() })?;
                if width < 0 || height < 0 {
                    return Err(AssetLoadError::NegativeSize { sequence: name, index, width, height });
                }
                let fits = |start: i64, extent: i64, limit: u32| {
                    start >= 0 && start.checked_add(extent).is_some_and(|end| end <= limit as i64)
                };
                if !fits(left, width, sheet.width()) || !fits(top, height, sheet.height()) {
                    return Err(AssetLoadError::OutOfBounds {
                        sequence: name,
                        index,
                        rect: (left, top, width, height),
                        sheet_width: sheet.width(),
                        sheet_height: sheet.height(),
                    });
                }
                let rect = Rect::new(left as i32, top as i32, width as i32, height as i32);
                frames.insert(index, Sprite::new(sheet.clone(), rect));
            }
            debug!("Sequence {:?}: {} frames", name, frames.len());
            sequences.insert(name.clone(), Rc::new(Sequence { name, frames }));
        }

        info!("Sprite atlas ready: {} sequences", sequences.len());
        Ok(SpriteAtlas { sheet, sequences })
    }

    pub fn sequence(&self, name: &str) -> Result<Rc<Sequence>, LookupError> {
        self.sequences
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::UnknownSequence(name.to_string()))
    }

    /// Like [`SpriteAtlas::sequence`] but also rejects sequences without frames.
    pub fn non_empty_sequence(&self, name: &str) -> Result<Rc<Sequence>, LookupError> {
        let sequence = self.sequence(name)?;
        if sequence.is_empty() {
            return Err(LookupError::EmptySequence(name.to_string()));
        }
        Ok(sequence)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    pub fn sequence_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sequences.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
