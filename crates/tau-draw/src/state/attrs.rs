/// Whether geometry is depth tested against the depth buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthTest {
    True,
    False,
}

impl DepthTest {
    #[inline]
    pub const fn enabled(self) -> bool {
        matches!(self, DepthTest::True)
    }
}

impl From<bool> for DepthTest {
    #[inline]
    fn from(v: bool) -> Self {
        if v { DepthTest::True } else { DepthTest::False }
    }
}

/// Whether back-facing polygons are culled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BackfaceCull {
    True,
    False,
}

impl BackfaceCull {
    #[inline]
    pub const fn enabled(self) -> bool {
        matches!(self, BackfaceCull::True)
    }
}

impl From<bool> for BackfaceCull {
    #[inline]
    fn from(v: bool) -> Self {
        if v { BackfaceCull::True } else { BackfaceCull::False }
    }
}
