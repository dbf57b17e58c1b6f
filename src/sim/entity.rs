//! Entities and pixel-accurate collision.
//!
//! Every actor in the sim (bird, pipes, bullets, enemies, pickups) carries an
//! `Entity`: an axis-aligned rectangle plus an optional per-pixel mask. The
//! `collide` predicate is pure and symmetric and keeps no cross-frame state,
//! so callers (including reward functions outside this crate) can evaluate it
//! for any pair at any time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Positioned rectangle with an optional collision mask.
///
/// `pos` is the top-left corner in screen coordinates (+y down). The mask,
/// when present, matches the rectangle's pixel footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Vec2,
    pub size: Vec2,
    pub mask: Option<Mask>,
}

impl Entity {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            mask: None,
        }
    }

    pub fn with_mask(pos: Vec2, size: Vec2, mask: Mask) -> Self {
        debug_assert_eq!(mask.width(), size.x as u32);
        debug_assert_eq!(mask.height(), size.y as u32);
        Self {
            pos,
            size,
            mask: Some(mask),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// AABB overlap test (strict: touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// True once the whole rectangle is left of `x`
    #[inline]
    pub fn past_left_of(&self, x: f32) -> bool {
        self.right() < x
    }
}

/// Row-major one-bit-per-pixel mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    w: u32,
    h: u32,
    bits: Vec<u64>,
}

impl Mask {
    fn empty(w: u32, h: u32) -> Self {
        let words = ((w as usize * h as usize) + 63) / 64;
        Self {
            w,
            h,
            bits: vec![0; words],
        }
    }

    /// Fully opaque mask (equivalent to plain AABB behavior)
    pub fn filled(w: u32, h: u32) -> Self {
        Self::from_fn(w, h, |_, _| true)
    }

    /// Build a mask from a pixel predicate
    pub fn from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::empty(w, h);
        for y in 0..h {
            for x in 0..w {
                if f(x, y) {
                    mask.set(x, y);
                }
            }
        }
        mask
    }

    /// Axis-aligned ellipse inscribed in the w×h footprint.
    /// Round-bodied actors use this so near-miss corners don't register.
    pub fn ellipse(w: u32, h: u32) -> Self {
        let rx = w as f32 / 2.0;
        let ry = h as f32 / 2.0;
        Self::from_fn(w, h, |x, y| {
            let dx = (x as f32 + 0.5 - rx) / rx;
            let dy = (y as f32 + 0.5 - ry) / ry;
            dx * dx + dy * dy <= 1.0
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.h
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.w || y >= self.h {
            return false;
        }
        let idx = (y * self.w + x) as usize;
        self.bits[idx / 64] >> (idx % 64) & 1 == 1
    }

    fn set(&mut self, x: u32, y: u32) {
        debug_assert!(x < self.w && y < self.h);
        let idx = (y * self.w + x) as usize;
        self.bits[idx / 64] |= 1 << (idx % 64);
    }

    pub fn is_blank(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }
}

/// Pixel-accurate collision predicate.
///
/// AABB pre-pass first; if either entity lacks a mask the AABB result stands.
/// Otherwise the masks are tested bit-by-bit inside the overlap window at the
/// rounded integer offset between the two entities. Pure and symmetric.
pub fn collide(a: &Entity, b: &Entity) -> bool {
    if !a.overlaps(b) {
        return false;
    }
    let (Some(mask_a), Some(mask_b)) = (&a.mask, &b.mask) else {
        return true;
    };
    masks_overlap(mask_a, mask_b, b.pos - a.pos)
}

/// Bit-test two masks where `offset` is b's position relative to a's,
/// rounded to whole pixels.
fn masks_overlap(a: &Mask, b: &Mask, offset: Vec2) -> bool {
    let ox = offset.x.round() as i64;
    let oy = offset.y.round() as i64;

    // Overlap window in a's pixel space
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + b.w as i64).min(a.w as i64);
    let y1 = (oy + b.h as i64).min(a.h as i64);
    if x0 >= x1 || y0 >= y1 {
        return false;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            if a.get(x as u32, y as u32) && b.get((x - ox) as u32, (y - oy) as u32) {
                return true;
            }
        }
    }
    false
}
