use bitvec::{bitarr, order::Msb0, slice::BitSlice, view::BitView, BitArr};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

//  64x32-pixel monochrome bit plane
//    +--------------------+
//    |(0, 0)       (63, 0)|
//    |                    |
//    |                    |
//    |(0, 31)     (63, 31)|
//    +--------------------+
//  Modeled in 1-D as: 0, 1, 2, ... , w-1
//                     w, w+1,  ... , 2w-1
//                     ...      ... , nw-1
//                     w(h-1),  ... , wh-1
//          and stored as a 2048-bit array
pub struct Framebuffer {
    plane: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
    // Set whenever the plane changed since the last present
    dirty: bool,
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            plane: bitarr![0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            dirty: false,
        }
    }

    pub fn clear(&mut self) {
        self.plane.fill(false);
        self.dirty = true;
    }

    /// XOR-composite an 8-wide, `sprite.len()`-tall sprite at (x, y).
    /// The origin wraps onto the plane; pixels that land past the right or
    /// bottom edge are clipped unless `wrap` is set. Returns true when any
    /// previously-lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8], wrap: bool) -> bool {
        let origin = (x as usize % DISPLAY_WIDTH, y as usize % DISPLAY_HEIGHT);
        let mut collision = false;

        for (dy, byte) in sprite.iter().enumerate() {
            let row = match wrap_or_clip(origin.1 + dy, DISPLAY_HEIGHT, wrap) {
                Some(row) => row,
                None => continue,
            };
            for (dx, bit) in byte.view_bits::<Msb0>().iter().enumerate() {
                if !*bit {
                    continue;
                }
                let col = match wrap_or_clip(origin.0 + dx, DISPLAY_WIDTH, wrap) {
                    Some(col) => col,
                    None => continue,
                };
                let idx = row * DISPLAY_WIDTH + col;
                let lit = self.plane[idx];

                collision |= lit;
                self.plane.set(idx, !lit);
            }
        }

        self.dirty = true;
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.plane[y * DISPLAY_WIDTH + x]
    }

    // Tx 2048 (64x32) bit display out
    pub fn as_bits(&self) -> &BitSlice<usize> {
        self.plane.as_bitslice()
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_presented(&mut self) {
        self.dirty = false;
    }
}

fn wrap_or_clip(coord: usize, bound: usize, wrap: bool) -> Option<usize> {
    if wrap {
        Some(coord % bound)
    } else if coord < bound {
        Some(coord)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_blanks_the_plane_and_flags_dirty() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0xFF], false);
        fb.mark_presented();

        fb.clear();
        assert!(fb.as_bits().not_any());
        assert!(fb.dirty());
    }

    #[test]
    fn xor_draw_reports_collisions() {
        let mut fb = Framebuffer::new();

        assert!(!fb.draw_sprite(0, 0, &[0xFF], false));
        assert!((0..8).all(|x| fb.pixel(x, 0)));

        // Redrawing the same byte erases it and collides
        assert!(fb.draw_sprite(0, 0, &[0xFF], false));
        assert!((0..8).all(|x| !fb.pixel(x, 0)));
    }

    #[test]
    fn sprite_clips_at_the_edges() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(60, 30, &[0xFF; 5], false);

        // Only the 4x2 corner survives
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                assert_eq!(fb.pixel(x, y), x >= 60 && y >= 30);
            }
        }
    }

    #[test]
    fn origin_wraps_before_drawing() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(68, 34, &[0x80], false);
        assert!(fb.pixel(4, 2));
    }

    #[test]
    fn wrap_quirk_folds_overflow_back_in() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(62, 31, &[0xC0, 0xC0], true);

        assert!(fb.pixel(62, 31));
        assert!(fb.pixel(63, 31));
        assert!(fb.pixel(62, 0));
        assert!(fb.pixel(63, 0));
    }
}
