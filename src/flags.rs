use bitflags::bitflags;

bitflags! {
    /// Cached values of a node that must be recomputed before next use.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u16 {
        /// Shape geometry must be rebuilt (size or matrix changed)
        const GEOMETRY        = 1 << 0;
        /// World matrix must be re-concatenated with the parent's
        const TRANSFORM       = 1 << 1;
        /// Cached stage-space bounds are stale
        const STAGE_BOUNDS    = 1 << 2;
        /// Paint (fill, texture) changed
        const PAINT           = 1 << 3;
        /// Mask-transform uniform is stale. Only set on nodes owning a mask.
        const MASK            = 1 << 4;
        /// Cumulative alpha or tint changed
        const COLOR           = 1 << 5;
        const PROGRAM         = 1 << 6;
        const PROGRAM_DATA    = 1 << 7;
        /// Local matrix must be recomposed from its properties and anchor
        const LOCAL_TRANSFORM = 1 << 8;

        /// Everything `prepare` consumes.
        const RENDER = Self::GEOMETRY.bits()
            | Self::PAINT.bits()
            | Self::MASK.bits()
            | Self::COLOR.bits()
            | Self::PROGRAM.bits()
            | Self::PROGRAM_DATA.bits();
    }
}

impl DirtyFlags {
    /// State of a freshly created node: nothing has been computed yet.
    pub fn initial() -> Self {
        Self::all().difference(Self::MASK)
    }

    /// Flags whose change invalidates ancestors' stage bounds.
    pub fn affects_bounds(self) -> bool {
        self.intersects(Self::GEOMETRY | Self::TRANSFORM | Self::STAGE_BOUNDS)
    }
}

bitflags! {
    /// Boolean properties of a node.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        const VISIBLE            = 1 << 0;
        /// Receive hits even while invisible
        const HIT_TEST_INVISIBLE = 1 << 1;
        /// Refine hits through the mask's pixels
        const HIT_TEST_MASKED    = 1 << 2;
        /// Cannot be reparented or removed
        const LOCKED             = 1 << 3;
        /// Groups only: apply the anchor to the union of the children
        const ANCHOR_CHILDREN    = 1 << 4;
        /// Culled on the last transform pass
        const OFFSCREEN          = 1 << 5;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::HIT_TEST_MASKED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_flags_exclude_mask() {
        let flags = DirtyFlags::initial();
        assert!(flags.contains(DirtyFlags::TRANSFORM | DirtyFlags::STAGE_BOUNDS));
        assert!(!flags.contains(DirtyFlags::MASK));
    }

    #[test]
    fn test_affects_bounds() {
        assert!(DirtyFlags::GEOMETRY.affects_bounds());
        assert!(!(DirtyFlags::PAINT | DirtyFlags::COLOR).affects_bounds());
    }
}
