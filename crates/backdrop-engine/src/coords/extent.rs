/// Surface size in physical pixels.
///
/// Either dimension may be zero while a host container is collapsed; native
/// contexts are always created with at least 1x1.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the size with both dimensions raised to at least 1.
    #[inline]
    pub fn at_least_one(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }

    /// Returns `[width, height]` as floats, the layout shaders expect.
    #[inline]
    pub fn as_f32(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_empty() {
        assert!(Extent::new(0, 10).is_empty());
        assert!(Extent::new(10, 0).is_empty());
        assert!(!Extent::new(1, 1).is_empty());
    }

    #[test]
    fn at_least_one_raises_zero_dimensions() {
        assert_eq!(Extent::new(0, 0).at_least_one(), Extent::new(1, 1));
        assert_eq!(Extent::new(640, 0).at_least_one(), Extent::new(640, 1));
        assert_eq!(Extent::new(640, 480).at_least_one(), Extent::new(640, 480));
    }
}
