use glam::Mat4;

use crate::paint::Color4u;

use super::{BackfaceCull, DepthTest};

/// Scoped render-state overrides.
///
/// Holds one independent stack per attribute type:
/// - transform (`Mat4`)
/// - color (`Color4u`)
/// - depth test (`DepthTest`)
/// - back-face culling (`BackfaceCull`)
///
/// Each stack starts with a default entry that is never removed. Pushes and pops
/// must be balanced and properly nested by the caller:
///
/// ```
/// # use tau_draw::state::{StateStack, DepthTest};
/// # use tau_draw::paint::Color4u;
/// let mut states = StateStack::new();
/// states.push((Color4u::RED, DepthTest::False));
/// // ... draw ...
/// states.pop::<(Color4u, DepthTest)>();
/// ```
///
/// # Panics
/// Popping a stack down past its default entry panics. This is a contract violation
/// (unbalanced push/pop), not a recoverable error.
#[derive(Debug, Clone)]
pub struct StateStack {
    transforms: Vec<Mat4>,
    colors: Vec<Color4u>,
    depth_tests: Vec<DepthTest>,
    cull_faces: Vec<BackfaceCull>,
}

impl StateStack {
    /// Identity transform, opaque white, depth test on, culling on.
    pub fn new() -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY],
            colors: vec![Color4u::WHITE],
            depth_tests: vec![DepthTest::True],
            cull_faces: vec![BackfaceCull::True],
        }
    }

    /// Pushes one value per attribute in `values` (a single value or a tuple).
    #[inline]
    pub fn push<G: StateGroup>(&mut self, values: G) {
        values.push_onto(self);
    }

    /// Pops one entry per attribute type named in `G`.
    #[inline]
    pub fn pop<G: StateGroup>(&mut self) {
        G::pop_from(self);
    }

    /// Returns the current top for each attribute type named in `G`.
    #[inline]
    pub fn top<G: StateGroup>(&self) -> G::Tops {
        G::tops(self)
    }

    /// Number of entries on the stack of `T`, including the default.
    #[inline]
    pub fn depth<T: StackedState>(&self) -> usize {
        T::stack(self).len()
    }

    fn push_one<T: StackedState>(&mut self, value: T) {
        T::stack_mut(self).push(value);
    }

    fn pop_one<T: StackedState>(&mut self) {
        let stack = T::stack_mut(self);
        assert!(
            stack.len() > 1,
            "StateStack: pop would remove the default {} state (unbalanced push/pop)",
            T::NAME
        );
        stack.pop();
    }

    fn top_one<T: StackedState>(&self) -> T {
        // Non-empty: the default entry is never popped.
        let stack = T::stack(self);
        stack[stack.len() - 1]
    }
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// An attribute type with its own stack inside [`StateStack`].
pub trait StackedState: Copy + sealed::Sealed + 'static {
    const NAME: &'static str;

    #[doc(hidden)]
    fn stack(states: &StateStack) -> &Vec<Self>;
    #[doc(hidden)]
    fn stack_mut(states: &mut StateStack) -> &mut Vec<Self>;
}

macro_rules! stacked_state {
    ($ty:ty, $field:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl StackedState for $ty {
            const NAME: &'static str = $name;

            #[inline]
            fn stack(states: &StateStack) -> &Vec<Self> {
                &states.$field
            }

            #[inline]
            fn stack_mut(states: &mut StateStack) -> &mut Vec<Self> {
                &mut states.$field
            }
        }
    };
}

stacked_state!(Mat4, transforms, "transform");
stacked_state!(Color4u, colors, "color");
stacked_state!(DepthTest, depth_tests, "depth-test");
stacked_state!(BackfaceCull, cull_faces, "cull-face");

/// One or more attribute types addressed together by push/pop/top.
///
/// Implemented for every [`StackedState`] and for tuples of up to four of them.
pub trait StateGroup: Sized {
    /// Value returned by [`StateStack::top`]: `T` for a single type, a tuple otherwise.
    type Tops;

    fn push_onto(self, states: &mut StateStack);
    fn pop_from(states: &mut StateStack);
    fn tops(states: &StateStack) -> Self::Tops;
}

impl<T: StackedState> StateGroup for T {
    type Tops = T;

    #[inline]
    fn push_onto(self, states: &mut StateStack) {
        states.push_one(self);
    }

    #[inline]
    fn pop_from(states: &mut StateStack) {
        states.pop_one::<T>();
    }

    #[inline]
    fn tops(states: &StateStack) -> T {
        states.top_one::<T>()
    }
}

macro_rules! state_group_tuple {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: StackedState),+> StateGroup for ($($T,)+) {
            type Tops = ($($T,)+);

            #[inline]
            fn push_onto(self, states: &mut StateStack) {
                $( states.push_one(self.$idx); )+
            }

            #[inline]
            fn pop_from(states: &mut StateStack) {
                $( states.pop_one::<$T>(); )+
            }

            #[inline]
            fn tops(states: &StateStack) -> Self::Tops {
                ($( states.top_one::<$T>(), )+)
            }
        }
    };
}

state_group_tuple!(A 0);
state_group_tuple!(A 0, B 1);
state_group_tuple!(A 0, B 1, C 2);
state_group_tuple!(A 0, B 1, C 2, D 3);
